use std::{
    sync::{
        atomic::{AtomicI64, Ordering::Relaxed},
        Arc,
    },
    time::Duration,
};

use metrics::Gauge;
use tokio::{
    runtime::Handle,
    select,
    sync::oneshot,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, error, Instrument as _};

/// Number of report operations currently in flight.
///
/// The count is a lock-free atomic, shared between all clones, and is safe to update from any number of concurrent
/// callers.
#[derive(Clone, Debug, Default)]
pub struct PendingReports {
    count: Arc<AtomicI64>,
}

impl PendingReports {
    /// Increments the pending count.
    pub fn increment(&self) {
        self.count.fetch_add(1, Relaxed);
    }

    /// Decrements the pending count.
    pub fn decrement(&self) {
        self.count.fetch_sub(1, Relaxed);
    }

    /// Returns the current pending count.
    pub fn current(&self) -> i64 {
        self.count.load(Relaxed)
    }

    /// Increments the pending count, returning a guard which decrements it again when dropped.
    pub fn track(&self) -> PendingReportGuard {
        self.increment();
        PendingReportGuard { pending: self.clone() }
    }
}

/// Tracks a single in-flight report.
///
/// The pending count is decremented when this guard is dropped, whether the report completed, failed, or was
/// cancelled.
#[derive(Debug)]
pub struct PendingReportGuard {
    pending: PendingReports,
}

impl Drop for PendingReportGuard {
    fn drop(&mut self) {
        self.pending.decrement();
    }
}

/// Background task which periodically emits the pending count as a gauge.
pub(crate) struct PendingReportsEmitter {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl PendingReportsEmitter {
    /// Spawns the emitter on the given runtime.
    pub fn spawn(runtime: &Handle, pending: PendingReports, gauge: Gauge, report_interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = runtime.spawn(run_emitter(pending, gauge, report_interval, shutdown_rx).in_current_span());

        Self { shutdown_tx, handle }
    }

    /// Stops the emitter, waiting for it to exit.
    ///
    /// No further values are emitted once this returns.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            error!(error = %e, "Pending reports emitter did not exit cleanly.");
        }
    }
}

async fn run_emitter(
    pending: PendingReports, gauge: Gauge, report_interval: Duration, mut shutdown_rx: oneshot::Receiver<()>,
) {
    debug!(?report_interval, "Pending reports emitter started.");

    let mut ticker = interval(report_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        select! {
            biased;

            // A dropped sender means the owning reporter is gone, which is just as final as an explicit stop.
            _ = &mut shutdown_rx => break,
            _ = ticker.tick() => gauge.set(pending.current() as f64),
        }
    }

    debug!("Pending reports emitter stopped.");
}

#[cfg(test)]
mod tests {
    use cutover_metrics::test::TestRecorder;

    use super::*;

    #[test]
    fn guard_restores_count() {
        let pending = PendingReports::default();
        assert_eq!(pending.current(), 0);

        let first = pending.track();
        let second = pending.track();
        assert_eq!(pending.current(), 2);

        drop(first);
        assert_eq!(pending.current(), 1);
        drop(second);
        assert_eq!(pending.current(), 0);
    }

    #[test]
    fn clones_share_count() {
        let pending = PendingReports::default();
        let other = pending.clone();

        pending.increment();
        other.increment();
        assert_eq!(pending.current(), 2);

        other.decrement();
        assert_eq!(pending.current(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn emits_until_stopped() {
        let recorder = TestRecorder::default();
        let gauge = metrics::with_local_recorder(&recorder, || metrics::gauge!("report_pending"));

        let pending = PendingReports::default();
        let report_interval = Duration::from_millis(50);
        let emitter = PendingReportsEmitter::spawn(&Handle::current(), pending.clone(), gauge, report_interval);

        for _ in 0..7 {
            pending.increment();
        }
        tokio::time::sleep(report_interval * 2).await;
        assert_eq!(recorder.gauge("report_pending"), Some(7.0));

        emitter.stop().await;

        // Nothing is emitted after the emitter has been stopped.
        for _ in 0..7 {
            pending.decrement();
        }
        tokio::time::sleep(report_interval * 2).await;
        assert_eq!(recorder.gauge("report_pending"), Some(7.0));
    }
}
