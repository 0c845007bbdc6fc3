use std::{
    fmt,
    sync::{
        atomic::{AtomicI64, Ordering::Relaxed},
        Arc,
    },
    time::{Duration, SystemTime},
};

/// A source of wall-clock time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> SystemTime;
}

/// A clock backed by the system's wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock whose time only changes when explicitly set.
///
/// Clones share the same underlying time.
#[derive(Clone, Debug, Default)]
pub struct FixedClock {
    unix_nanos: Arc<AtomicI64>,
}

impl FixedClock {
    /// Creates a new `FixedClock` set to the given time.
    pub fn new(now: SystemTime) -> Self {
        Self {
            unix_nanos: Arc::new(AtomicI64::new(unix_nanos(now))),
        }
    }

    /// Sets the current time.
    pub fn set(&self, now: SystemTime) {
        self.unix_nanos.store(unix_nanos(now), Relaxed);
    }

    /// Advances the current time by `by`.
    pub fn advance(&self, by: Duration) {
        let by = i64::try_from(by.as_nanos()).unwrap_or(i64::MAX);
        let _ = self
            .unix_nanos
            .fetch_update(Relaxed, Relaxed, |nanos| Some(nanos.saturating_add(by)));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        let nanos = self.unix_nanos.load(Relaxed);
        match u64::try_from(nanos) {
            Ok(nanos) => SystemTime::UNIX_EPOCH + Duration::from_nanos(nanos),
            Err(_) => SystemTime::UNIX_EPOCH - Duration::from_nanos(nanos.unsigned_abs()),
        }
    }
}

/// Converts `time` to nanoseconds since the Unix epoch, saturating at the bounds of `i64`.
pub(crate) fn unix_nanos(time: SystemTime) -> i64 {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(since) => i64::try_from(since.as_nanos()).unwrap_or(i64::MAX),
        Err(e) => i64::try_from(e.duration().as_nanos()).map_or(i64::MIN, |nanos| -nanos),
    }
}

fn duration_nanos(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
}

/// A time range, in nanoseconds since the Unix epoch, used when matching rules.
///
/// The reporting host's clock and the clock of the service that authored the rules can drift apart. Matching against a
/// window around the current time, rather than a single instant, ensures that rule changes whose cutover falls within
/// the drift are still picked up.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimeWindow {
    from_nanos: i64,
    to_nanos: i64,
}

impl TimeWindow {
    /// Creates a window spanning from `max_negative_skew` before `now` to `max_positive_skew` after it.
    pub fn around(now: SystemTime, max_negative_skew: Duration, max_positive_skew: Duration) -> Self {
        let now_nanos = unix_nanos(now);
        Self {
            from_nanos: now_nanos.saturating_sub(duration_nanos(max_negative_skew)),
            to_nanos: now_nanos.saturating_add(duration_nanos(max_positive_skew)),
        }
    }

    /// Returns the start of the window.
    pub const fn from_nanos(&self) -> i64 {
        self.from_nanos
    }

    /// Returns the end of the window.
    pub const fn to_nanos(&self) -> i64 {
        self.to_nanos
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.from_nanos, self.to_nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_around_now() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1234);
        let window = TimeWindow::around(now, Duration::from_secs(10), Duration::from_secs(5));

        assert_eq!(window.from_nanos(), 1_224_000_000_000);
        assert_eq!(window.to_nanos(), 1_239_000_000_000);
    }

    #[test]
    fn window_saturates() {
        let window = TimeWindow::around(SystemTime::UNIX_EPOCH, Duration::MAX, Duration::MAX);
        assert_eq!(window.from_nanos(), -i64::MAX);
        assert_eq!(window.to_nanos(), i64::MAX);
    }

    #[test]
    fn before_epoch() {
        let time = SystemTime::UNIX_EPOCH - Duration::from_secs(1);
        assert_eq!(unix_nanos(time), -1_000_000_000);

        let clock = FixedClock::new(time);
        assert_eq!(clock.now(), time);
    }

    #[test]
    fn fixed_clock_is_shared() {
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let clock = FixedClock::new(start);
        let other = clock.clone();

        other.advance(Duration::from_secs(5));
        assert_eq!(clock.now(), start + Duration::from_secs(5));

        clock.set(start);
        assert_eq!(other.now(), start);
    }
}
