use crate::{AggregationId, StoragePolicy};

/// How a single pipeline stage aggregates and stores a metric.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineMetadata {
    /// Aggregation types applied to the metric.
    pub aggregation_id: AggregationId,

    /// Storage policies the aggregated metric is written with.
    pub storage_policies: Vec<StoragePolicy>,
}

/// The set of pipelines applied to a metric.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    /// Pipelines applied to the metric.
    pub pipelines: Vec<PipelineMetadata>,
}

/// One version of a metric's rule set.
///
/// A staged metadata is active from `cutover_nanos` onwards, until the cutover of the next stage in the sequence it
/// belongs to. A tombstoned stage means the metric is dropped for as long as the stage is active.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StagedMetadata {
    /// Time at which this stage becomes active, in nanoseconds since the Unix epoch.
    ///
    /// `i64::MAX` marks a stage that does not take effect within any representable time.
    pub cutover_nanos: i64,

    /// Whether the metric is dropped while this stage is active.
    pub tombstoned: bool,

    /// Pipelines applied while this stage is active.
    pub metadata: Metadata,
}

/// A sequence of staged metadata, sorted in ascending order of cutover time.
pub type StagedMetadatas = Vec<StagedMetadata>;

/// Returns the staged metadata applied to metrics that no rule matched.
///
/// This is a single, active stage carrying one pipeline that uses the default aggregation types and no explicit
/// storage policies, deferring both to the aggregation tier.
pub fn default_staged_metadatas() -> StagedMetadatas {
    vec![StagedMetadata {
        cutover_nanos: 0,
        tombstoned: false,
        metadata: Metadata {
            pipelines: vec![PipelineMetadata::default()],
        },
    }]
}

/// Returns the stages of `metadatas` that are relevant at `time_nanos`.
///
/// This is the suffix of `metadatas` beginning at the last stage whose cutover is at or before `time_nanos`: the stage
/// active at that instant, followed by every stage scheduled after it. If every stage is scheduled after `time_nanos`,
/// all of them are returned.
///
/// `metadatas` must be sorted in ascending order of cutover time.
pub fn active_staged_metadatas_at(metadatas: &[StagedMetadata], time_nanos: i64) -> &[StagedMetadata] {
    let start = metadatas
        .iter()
        .rposition(|stage| stage.cutover_nanos <= time_nanos)
        .unwrap_or(0);
    &metadatas[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(cutover_nanos: i64, tombstoned: bool) -> StagedMetadata {
        StagedMetadata {
            cutover_nanos,
            tombstoned,
            metadata: Metadata::default(),
        }
    }

    #[test]
    fn active_stages() {
        let metadatas = vec![stage(100, false), stage(200, true), stage(300, false)];

        // Before the first cutover, everything is returned.
        assert_eq!(active_staged_metadatas_at(&metadatas, 50), &metadatas[..]);

        // Cutovers are inclusive.
        assert_eq!(active_staged_metadatas_at(&metadatas, 100), &metadatas[..]);
        assert_eq!(active_staged_metadatas_at(&metadatas, 200), &metadatas[1..]);
        assert_eq!(active_staged_metadatas_at(&metadatas, 250), &metadatas[1..]);
        assert_eq!(active_staged_metadatas_at(&metadatas, i64::MAX), &metadatas[2..]);
    }

    #[test]
    fn active_stages_empty() {
        assert!(active_staged_metadatas_at(&[], 100).is_empty());
    }

    #[test]
    fn pending_stage_is_retained() {
        let metadatas = vec![stage(0, false), stage(i64::MAX, false)];
        assert_eq!(active_staged_metadatas_at(&metadatas, 1_000), &metadatas[..]);
    }

    #[test]
    fn default_metadatas() {
        let metadatas = default_staged_metadatas();
        assert_eq!(metadatas.len(), 1);
        assert_eq!(metadatas[0].cutover_nanos, 0);
        assert!(!metadatas[0].tombstoned);
        assert_eq!(metadatas[0].metadata.pipelines, vec![PipelineMetadata::default()]);
        assert!(metadatas[0].metadata.pipelines[0].aggregation_id.is_default());
    }
}
