//! Staged rule metadata.
//!
//! The types in this crate describe how a metric should be aggregated and stored, and how that description changes over
//! time. Rule sets are versioned by a cutover timestamp: a [`StagedMetadata`] becomes active at its cutover and remains
//! active until the next stage's cutover. A [`MatchResult`] bundles the staged metadata for a queried metric identifier
//! along with any rollup identifiers the rules expand it into.
#![deny(warnings)]
#![deny(missing_docs)]

mod aggregation;
pub use self::aggregation::{AggregationId, AggregationType};

mod metadata;
pub use self::metadata::{
    active_staged_metadatas_at, default_staged_metadatas, Metadata, PipelineMetadata, StagedMetadata, StagedMetadatas,
};

mod policy;
pub use self::policy::{StoragePolicy, TimeUnit};

mod result;
pub use self::result::{IdWithMetadatas, MatchResult, RollupIdWithMetadatas};
