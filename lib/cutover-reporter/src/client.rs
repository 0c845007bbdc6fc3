use std::sync::Arc;

use async_trait::async_trait;
use cutover_error::GenericError;
use cutover_rules::StagedMetadata;

use crate::{UntimedBatchTimer, UntimedCounter, UntimedGauge};

/// Delivers untimed samples, annotated with their staged metadata, to the aggregation tier.
///
/// Batching, encoding, and transport are entirely up to the implementation. Implementations must be safe to call
/// concurrently.
#[async_trait]
pub trait Client: Send + Sync {
    /// Writes an untimed counter.
    async fn write_untimed_counter(
        &self, counter: UntimedCounter, metadatas: &[StagedMetadata],
    ) -> Result<(), GenericError>;

    /// Writes an untimed gauge.
    async fn write_untimed_gauge(&self, gauge: UntimedGauge, metadatas: &[StagedMetadata]) -> Result<(), GenericError>;

    /// Writes an untimed batch timer.
    async fn write_untimed_batch_timer(
        &self, batch_timer: UntimedBatchTimer, metadatas: &[StagedMetadata],
    ) -> Result<(), GenericError>;

    /// Flushes any buffered samples.
    async fn flush(&self) -> Result<(), GenericError>;

    /// Flushes any buffered samples and releases any resources held by the client.
    ///
    /// Callers must call this at most once.
    async fn close(&self) -> Result<(), GenericError>;
}

#[async_trait]
impl<T> Client for Arc<T>
where
    T: Client + ?Sized,
{
    async fn write_untimed_counter(
        &self, counter: UntimedCounter, metadatas: &[StagedMetadata],
    ) -> Result<(), GenericError> {
        (**self).write_untimed_counter(counter, metadatas).await
    }

    async fn write_untimed_gauge(&self, gauge: UntimedGauge, metadatas: &[StagedMetadata]) -> Result<(), GenericError> {
        (**self).write_untimed_gauge(gauge, metadatas).await
    }

    async fn write_untimed_batch_timer(
        &self, batch_timer: UntimedBatchTimer, metadatas: &[StagedMetadata],
    ) -> Result<(), GenericError> {
        (**self).write_untimed_batch_timer(batch_timer, metadatas).await
    }

    async fn flush(&self) -> Result<(), GenericError> {
        (**self).flush().await
    }

    async fn close(&self) -> Result<(), GenericError> {
        (**self).close().await
    }
}
