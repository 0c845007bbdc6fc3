use std::sync::{
    atomic::{
        AtomicU8,
        Ordering::{AcqRel, Acquire, Release},
    },
    Arc, Mutex,
};

use cutover_error::{ErrorContext as _, GenericError, MultiError};
use cutover_rules::StagedMetadata;
use snafu::{ResultExt as _, Snafu};
use tokio::{runtime::Handle, sync::watch};
use tracing::{debug, trace, warn, Instrument as _};

use crate::{
    pending::PendingReportsEmitter, Client, Clock, Matcher, MetricId, PendingReports, ReporterConfiguration,
    TimeWindow, UntimedBatchTimer, UntimedCounter, UntimedGauge,
};

const STATE_OPEN: u8 = 0;
const STATE_CLOSING: u8 = 1;
const STATE_CLOSED: u8 = 2;

/// A report error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ReportError {
    /// Rules could not be matched for the metric, so nothing was written.
    #[snafu(display("Failed to match rules for metric '{}'.", id))]
    Match {
        /// Metric identifier that was being matched.
        id: MetricId,

        /// Error source.
        source: GenericError,
    },

    /// One or more writes failed.
    ///
    /// Every write is attempted regardless of earlier failures, so `errors` holds the error of each failed write.
    #[snafu(display("Failed {} of {} write(s): {}", errors.len(), attempted, errors))]
    Write {
        /// Number of writes attempted.
        attempted: usize,

        /// Errors from the failed writes.
        errors: MultiError,
    },
}

/// A close error.
///
/// Every caller of [`Reporter::close`] observes the same outcome, so the underlying errors are shared.
#[derive(Clone, Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum CloseError {
    /// The matcher, the client, or both failed to close.
    #[snafu(display("Failed to close reporter: {}", errors))]
    Close {
        /// Errors from the collaborators that failed to close.
        errors: Arc<MultiError>,
    },

    /// Shutdown was interrupted before it could complete.
    #[snafu(display("Reporter shutdown was interrupted before completing."))]
    Interrupted,
}

type CloseOutcome = Result<(), CloseError>;

/// The raw value of a sample, independent of which identifier it is written for.
enum UntimedValue {
    Counter(i64),
    Gauge(f64),
    BatchTimer(Vec<f64>),
}

impl UntimedValue {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Counter(_) => "counter",
            Self::Gauge(_) => "gauge",
            Self::BatchTimer(_) => "batch timer",
        }
    }

    async fn write_to<C>(&self, client: &C, id: MetricId, metadatas: &[StagedMetadata]) -> Result<(), GenericError>
    where
        C: Client,
    {
        match self {
            Self::Counter(value) => {
                let counter = UntimedCounter { id, value: *value };
                client.write_untimed_counter(counter, metadatas).await
            }
            Self::Gauge(value) => {
                let gauge = UntimedGauge { id, value: *value };
                client.write_untimed_gauge(gauge, metadatas).await
            }
            Self::BatchTimer(values) => {
                let batch_timer = UntimedBatchTimer {
                    id,
                    values: values.clone(),
                };
                client.write_untimed_batch_timer(batch_timer, metadatas).await
            }
        }
    }
}

struct Inner<M, C> {
    runtime: Handle,
    matcher: M,
    client: C,
    clock: Arc<dyn Clock>,
    config: ReporterConfiguration,
    pending: PendingReports,
    emitter: Mutex<Option<PendingReportsEmitter>>,
    state: AtomicU8,
    close_outcome: watch::Sender<Option<CloseOutcome>>,
}

impl<M, C> Inner<M, C>
where
    M: Matcher,
    C: Client,
{
    async fn report(&self, id: MetricId, value: UntimedValue) -> Result<(), ReportError> {
        let _pending = self.pending.track();

        let window = TimeWindow::around(
            self.clock.now(),
            self.config.max_negative_skew(),
            self.config.max_positive_skew(),
        );
        let match_result = self
            .matcher
            .forward_match(&id, window.from_nanos(), window.to_nanos())
            .await
            .with_context(|_| Match { id: id.clone() })?;

        let kind = value.kind();
        let mut errors = MultiError::new();

        trace!(metric_id = %id, %window, kind, "Writing sample for matched metric.");
        let result = value
            .write_to(&self.client, id.clone(), match_result.for_existing_id_at(window.from_nanos()))
            .await
            .with_error_context(|| format!("Failed to write {} for metric '{}'.", kind, id));
        errors.push_result(result);
        let mut attempted = 1;

        for rollup in match_result.for_new_rollup_ids_at(window.from_nanos()) {
            let rollup_id = MetricId::from(rollup.id.clone());
            trace!(metric_id = %id, rollup_id = %rollup_id, kind, "Writing sample for rollup metric.");

            let result = value
                .write_to(&self.client, rollup_id.clone(), rollup.metadatas)
                .await
                .with_error_context(|| format!("Failed to write {} for rollup metric '{}'.", kind, rollup_id));
            errors.push_result(result);
            attempted += 1;
        }

        errors.into_result().map_err(|errors| {
            warn!(metric_id = %id, kind, attempted, failed = errors.len(), "Failed to report sample.");
            ReportError::Write { attempted, errors }
        })
    }

    async fn shutdown(&self) -> CloseOutcome {
        // Stop emitting first, so that nothing is emitted once close returns.
        let emitter = self.emitter.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(emitter) = emitter {
            emitter.stop().await;
        }

        let mut errors = MultiError::new();
        errors.push_result(self.matcher.close().await.error_context("Failed to close matcher."));
        errors.push_result(self.client.close().await.error_context("Failed to close client."));

        errors.into_result().map_err(|errors| CloseError::Close {
            errors: Arc::new(errors),
        })
    }

    fn publish_close_outcome(&self, outcome: CloseOutcome) {
        self.close_outcome.send_replace(Some(outcome));
        self.state.store(STATE_CLOSED, Release);
    }
}

/// Publishes an interrupted outcome if shutdown ends without publishing one, such as when the shutdown task panics, is
/// aborted, or is dropped unpolled because its runtime has shut down.
struct CloseOutcomeGuard<M, C> {
    inner: Arc<Inner<M, C>>,
}

impl<M, C> Drop for CloseOutcomeGuard<M, C> {
    fn drop(&mut self) {
        let published = self.inner.close_outcome.send_if_modified(|outcome| {
            if outcome.is_none() {
                *outcome = Some(Err(CloseError::Interrupted));
                true
            } else {
                false
            }
        });

        if published {
            warn!("Reporter shutdown was interrupted.");
            self.inner.state.store(STATE_CLOSED, Release);
        }
    }
}

/// Reports untimed samples to the aggregation tier.
///
/// For every sample, the reporter matches the sample's metric identifier against the active rules, and then writes the
/// sample for the identifier, and for each rollup identifier the rules expand it into, along with the staged metadata
/// describing how each should be aggregated.
///
/// ## Clock skew
///
/// Rules are matched against a window around the current time, spanning from the configured maximum negative skew
/// before it to the configured maximum positive skew after it. This tolerates drift between the local clock and the
/// clock of the service that authored the rules.
///
/// ## Pending reports
///
/// The number of reports in flight is tracked, and emitted as the `report_pending` gauge at the configured report
/// interval, tagged with the configured instrumentation tags and the local hostname.
///
/// ## Concurrency
///
/// `Reporter` is cheaply cloneable, and all clones share the same underlying matcher, client, and state. Reports may be
/// issued concurrently from any number of tasks.
///
/// ## Closing
///
/// Closing stops emitting the pending report count and closes both the matcher and the client, each exactly once, no
/// matter how many callers close the reporter, or how many clones it is closed through. All callers observe the same
/// outcome.
pub struct Reporter<M, C> {
    inner: Arc<Inner<M, C>>,
}

impl<M, C> Reporter<M, C>
where
    M: Matcher + 'static,
    C: Client + 'static,
{
    /// Creates a new `Reporter`.
    ///
    /// The task which emits the pending report count is spawned on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// If the configuration is invalid, or this is not called from within a Tokio runtime, an error is returned.
    pub fn new(matcher: M, client: C, config: ReporterConfiguration) -> Result<Self, GenericError> {
        config.validate()?;
        let runtime = Handle::try_current().error_context("Reporter must be created from within a Tokio runtime.")?;

        let host = local_hostname();
        let gauge = config
            .metrics_builder()
            .register_gauge_with_tags("report_pending", [("host", host)]);

        let pending = PendingReports::default();
        let emitter = PendingReportsEmitter::spawn(&runtime, pending.clone(), gauge, config.report_interval());

        debug!(
            max_positive_skew = ?config.max_positive_skew(),
            max_negative_skew = ?config.max_negative_skew(),
            report_interval = ?config.report_interval(),
            "Created reporter."
        );

        let (close_outcome, _) = watch::channel(None);

        Ok(Self {
            inner: Arc::new(Inner {
                runtime,
                matcher,
                client,
                clock: config.clock(),
                config,
                pending,
                emitter: Mutex::new(Some(emitter)),
                state: AtomicU8::new(STATE_OPEN),
                close_outcome,
            }),
        })
    }

    /// Reports a counter.
    ///
    /// # Errors
    ///
    /// If rules could not be matched for `id`, or any of the resulting writes failed, an error is returned. All writes
    /// are attempted even if some of them fail.
    pub async fn report_counter(&self, id: MetricId, value: i64) -> Result<(), ReportError> {
        self.inner.report(id, UntimedValue::Counter(value)).await
    }

    /// Reports a gauge.
    ///
    /// # Errors
    ///
    /// If rules could not be matched for `id`, or any of the resulting writes failed, an error is returned. All writes
    /// are attempted even if some of them fail.
    pub async fn report_gauge(&self, id: MetricId, value: f64) -> Result<(), ReportError> {
        self.inner.report(id, UntimedValue::Gauge(value)).await
    }

    /// Reports a batch of timer values.
    ///
    /// # Errors
    ///
    /// If rules could not be matched for `id`, or any of the resulting writes failed, an error is returned. All writes
    /// are attempted even if some of them fail.
    pub async fn report_batch_timer(&self, id: MetricId, values: Vec<f64>) -> Result<(), ReportError> {
        self.inner.report(id, UntimedValue::BatchTimer(values)).await
    }

    /// Flushes the client.
    ///
    /// # Errors
    ///
    /// If the client fails to flush, its error is returned as-is.
    pub async fn flush(&self) -> Result<(), GenericError> {
        self.inner.client.flush().await
    }

    /// Closes the reporter.
    ///
    /// The first call performs the shutdown, and every call, whether concurrent with it or after it, waits for the
    /// shutdown to complete and returns its outcome.
    ///
    /// # Errors
    ///
    /// If the matcher or the client fails to close, an error is returned. Both are closed even if the other fails.
    pub async fn close(&self) -> Result<(), CloseError> {
        let mut outcome_rx = self.inner.close_outcome.subscribe();

        if self
            .inner
            .state
            .compare_exchange(STATE_OPEN, STATE_CLOSING, AcqRel, Acquire)
            .is_ok()
        {
            debug!("Closing reporter.");

            // Shutdown runs as its own task on the runtime the reporter was created on, so that it runs to completion
            // even if this caller stops waiting on it, and so that closing works from outside of a runtime.
            let guard = CloseOutcomeGuard {
                inner: Arc::clone(&self.inner),
            };
            self.inner.runtime.spawn(
                async move {
                    let outcome = guard.inner.shutdown().await;
                    guard.inner.publish_close_outcome(outcome);
                    debug!("Reporter closed.");
                }
                .in_current_span(),
            );
        }

        let outcome = outcome_rx
            .wait_for(Option::is_some)
            .await
            .map(|outcome| (*outcome).clone());
        outcome.ok().flatten().unwrap_or(Err(CloseError::Interrupted))
    }

    /// Returns `true` if the reporter has finished closing.
    pub fn is_closed(&self) -> bool {
        self.inner.state.load(Acquire) == STATE_CLOSED
    }

    /// Returns the number of reports currently in flight.
    pub fn pending_reports(&self) -> i64 {
        self.inner.pending.current()
    }
}

impl<M, C> Clone for Reporter<M, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn local_hostname() -> String {
    match hostname::get() {
        Ok(hostname) => hostname.to_string_lossy().into_owned(),
        Err(e) => {
            debug!(error = %e, "Failed to query hostname.");
            "unknown".to_string()
        }
    }
}
