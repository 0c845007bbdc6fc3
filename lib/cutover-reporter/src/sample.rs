use std::fmt;

use bytes::Bytes;

/// A metric identifier.
///
/// Identifiers are opaque byte sequences which uniquely name a metric series. They are cheap to clone, as the
/// underlying bytes are shared.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct MetricId(Bytes);

impl MetricId {
    /// Creates a new `MetricId` from a static byte string.
    pub const fn from_static(id: &'static [u8]) -> Self {
        Self(Bytes::from_static(id))
    }

    /// Returns the raw bytes of the identifier.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes `self`, returning the underlying bytes.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl From<Bytes> for MetricId {
    fn from(id: Bytes) -> Self {
        Self(id)
    }
}

impl From<Vec<u8>> for MetricId {
    fn from(id: Vec<u8>) -> Self {
        Self(Bytes::from(id))
    }
}

impl From<&'static str> for MetricId {
    fn from(id: &'static str) -> Self {
        Self(Bytes::from_static(id.as_bytes()))
    }
}

impl From<String> for MetricId {
    fn from(id: String) -> Self {
        Self(Bytes::from(id))
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetricId({:?})", String::from_utf8_lossy(&self.0))
    }
}

/// An untimed counter sample.
#[derive(Clone, Debug, PartialEq)]
pub struct UntimedCounter {
    /// Metric identifier.
    pub id: MetricId,

    /// Counter increment.
    pub value: i64,
}

/// An untimed gauge sample.
#[derive(Clone, Debug, PartialEq)]
pub struct UntimedGauge {
    /// Metric identifier.
    pub id: MetricId,

    /// Gauge value.
    pub value: f64,
}

/// An untimed batch of timer samples.
#[derive(Clone, Debug, PartialEq)]
pub struct UntimedBatchTimer {
    /// Metric identifier.
    pub id: MetricId,

    /// Timer values.
    pub values: Vec<f64>,
}
