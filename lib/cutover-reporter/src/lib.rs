//! Ingestion-side metric reporting.
//!
//! The [`Reporter`] accepts raw, untimed samples (counters, gauges, and batch timers), resolves the rules that apply to
//! each sample's metric identifier through a [`Matcher`], and forwards the sample, annotated with the resolved staged
//! metadata, to a [`Client`] which handles delivery to the aggregation tier.
#![deny(warnings)]
#![deny(missing_docs)]

mod client;
pub use self::client::Client;

mod clock;
pub use self::clock::{Clock, FixedClock, SystemClock, TimeWindow};

mod config;
pub use self::config::ReporterConfiguration;

mod matcher;
pub use self::matcher::Matcher;

mod pending;
pub use self::pending::{PendingReportGuard, PendingReports};

mod reporter;
pub use self::reporter::{CloseError, ReportError, Reporter};

mod sample;
pub use self::sample::{MetricId, UntimedBatchTimer, UntimedCounter, UntimedGauge};
