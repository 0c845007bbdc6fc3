//! Helpers for emitting internal telemetry through the `metrics` facade.

mod builder;
pub use self::builder::{MetricTag, MetricsBuilder};

#[cfg(any(test, feature = "test"))]
pub mod test;
