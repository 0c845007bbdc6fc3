//! Testing-related helpers.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering::SeqCst},
        Arc, Mutex,
    },
};

use metrics::{Counter, Gauge, GaugeFn, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};

/// An atomic cell holding the bits of a gauge's `f64` value.
#[derive(Default)]
struct Cell(AtomicU64);

impl Cell {
    fn update_f64(&self, f: impl Fn(f64) -> f64) {
        // The closure always returns `Some`, so the update cannot fail.
        let _ = self
            .0
            .fetch_update(SeqCst, SeqCst, |v| Some(f(f64::from_bits(v)).to_bits()));
    }
}

impl GaugeFn for Cell {
    fn increment(&self, value: f64) {
        self.update_f64(|v| v + value);
    }

    fn decrement(&self, value: f64) {
        self.update_f64(|v| v - value);
    }

    fn set(&self, value: f64) {
        self.0.store(value.to_bits(), SeqCst);
    }
}

#[derive(Default)]
struct RecorderState {
    gauges: HashMap<Key, Arc<Cell>>,
}

/// A recorder implementation that stores gauges in memory for testing purposes.
///
/// Counters and histograms are accepted but discarded.
///
/// Metrics are keyed by their full key, name and labels both, so lookups must supply the same labels, in the same
/// order, as were used during registration.
#[derive(Clone, Default)]
pub struct TestRecorder {
    state: Arc<Mutex<RecorderState>>,
}

impl TestRecorder {
    /// Returns the current value of the gauge with the given key, or `None` if no such gauge exists.
    pub fn gauge<K>(&self, key: K) -> Option<f64>
    where
        K: Into<Key>,
    {
        let state = self.state.lock().unwrap();
        state
            .gauges
            .get(&key.into())
            .map(|cell| f64::from_bits(cell.0.load(SeqCst)))
    }

    /// Returns the number of distinct gauges registered.
    pub fn gauge_count(&self) -> usize {
        self.state.lock().unwrap().gauges.len()
    }
}

impl Recorder for TestRecorder {
    fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn register_counter(&self, _: &Key, _: &Metadata<'_>) -> Counter {
        Counter::noop()
    }

    fn register_gauge(&self, key: &Key, _: &Metadata<'_>) -> Gauge {
        let mut state = self.state.lock().unwrap();
        let cell = state.gauges.entry(key.clone()).or_default();
        Gauge::from_arc(Arc::clone(cell))
    }

    fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}
