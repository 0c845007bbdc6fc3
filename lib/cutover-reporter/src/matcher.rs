use std::sync::Arc;

use async_trait::async_trait;
use cutover_error::GenericError;
use cutover_rules::MatchResult;

use crate::MetricId;

/// Resolves the rules that apply to a metric identifier.
///
/// Implementations must be safe to call concurrently.
#[async_trait]
pub trait Matcher: Send + Sync {
    /// Matches `id` against the rules active between `from_nanos` and `to_nanos`.
    ///
    /// The result may expand `id` into any number of additional rollup identifiers.
    async fn forward_match(&self, id: &MetricId, from_nanos: i64, to_nanos: i64) -> Result<MatchResult, GenericError>;

    /// Releases any resources held by the matcher.
    ///
    /// Callers must call this at most once.
    async fn close(&self) -> Result<(), GenericError>;
}

#[async_trait]
impl<T> Matcher for Arc<T>
where
    T: Matcher + ?Sized,
{
    async fn forward_match(&self, id: &MetricId, from_nanos: i64, to_nanos: i64) -> Result<MatchResult, GenericError> {
        (**self).forward_match(id, from_nanos, to_nanos).await
    }

    async fn close(&self) -> Result<(), GenericError> {
        (**self).close().await
    }
}
