use std::{fmt, time::Duration};

/// Precision unit of stored datapoints.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TimeUnit {
    /// Nanosecond precision.
    Nanosecond,

    /// Microsecond precision.
    Microsecond,

    /// Millisecond precision.
    Millisecond,

    /// Second precision.
    Second,

    /// Minute precision.
    Minute,

    /// Hour precision.
    Hour,

    /// Day precision.
    Day,
}

impl TimeUnit {
    /// Returns the length of one unit.
    pub const fn as_duration(&self) -> Duration {
        match self {
            Self::Nanosecond => Duration::from_nanos(1),
            Self::Microsecond => Duration::from_micros(1),
            Self::Millisecond => Duration::from_millis(1),
            Self::Second => Duration::from_secs(1),
            Self::Minute => Duration::from_secs(60),
            Self::Hour => Duration::from_secs(60 * 60),
            Self::Day => Duration::from_secs(24 * 60 * 60),
        }
    }

    const fn suffix(&self) -> &'static str {
        match self {
            Self::Nanosecond => "ns",
            Self::Microsecond => "us",
            Self::Millisecond => "ms",
            Self::Second => "s",
            Self::Minute => "m",
            Self::Hour => "h",
            Self::Day => "d",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1{}", self.suffix())
    }
}

/// Writes `duration` using the largest unit that divides it evenly.
fn write_duration(f: &mut fmt::Formatter<'_>, duration: Duration) -> fmt::Result {
    const UNITS: [TimeUnit; 7] = [
        TimeUnit::Day,
        TimeUnit::Hour,
        TimeUnit::Minute,
        TimeUnit::Second,
        TimeUnit::Millisecond,
        TimeUnit::Microsecond,
        TimeUnit::Nanosecond,
    ];

    let nanos = duration.as_nanos();
    if nanos == 0 {
        return write!(f, "0s");
    }

    let unit = UNITS
        .into_iter()
        .find(|unit| nanos % unit.as_duration().as_nanos() == 0)
        .unwrap_or(TimeUnit::Nanosecond);
    write!(f, "{}{}", nanos / unit.as_duration().as_nanos(), unit.suffix())
}

/// How an aggregated metric is stored.
///
/// A storage policy is the combination of the resolution window datapoints are aggregated into, the precision with
/// which those datapoints are stored, and how long they are retained for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct StoragePolicy {
    window: Duration,
    precision: TimeUnit,
    retention: Duration,
}

impl StoragePolicy {
    /// Creates a new `StoragePolicy`.
    pub const fn new(window: Duration, precision: TimeUnit, retention: Duration) -> Self {
        Self {
            window,
            precision,
            retention,
        }
    }

    /// Returns the resolution window.
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Returns the storage precision.
    pub const fn precision(&self) -> TimeUnit {
        self.precision
    }

    /// Returns the retention period.
    pub const fn retention(&self) -> Duration {
        self.retention
    }
}

impl fmt::Display for StoragePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_duration(f, self.window)?;
        write!(f, "@{}:", self.precision)?;
        write_duration(f, self.retention)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let cases = [
            (
                StoragePolicy::new(Duration::from_secs(10), TimeUnit::Second, Duration::from_secs(6 * 3600)),
                "10s@1s:6h",
            ),
            (
                StoragePolicy::new(Duration::from_secs(600), TimeUnit::Minute, Duration::from_secs(25 * 86400)),
                "10m@1m:25d",
            ),
            (
                StoragePolicy::new(Duration::from_millis(1500), TimeUnit::Millisecond, Duration::from_secs(90)),
                "1500ms@1ms:90s",
            ),
        ];

        for (policy, expected) in cases {
            assert_eq!(policy.to_string(), expected);
        }
    }

    #[test]
    fn value_comparable() {
        let a = StoragePolicy::new(Duration::from_secs(60), TimeUnit::Minute, Duration::from_secs(172_800));
        let b = StoragePolicy::new(Duration::from_secs(60), TimeUnit::Minute, Duration::from_secs(172_800));
        let c = StoragePolicy::new(Duration::from_secs(60), TimeUnit::Second, Duration::from_secs(172_800));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
