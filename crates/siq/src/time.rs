use core::time::Duration;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Timestamp resolution: 1/65536 of a second.
pub const TICKS_PER_SECOND: u64 = 1 << 16;

/// Twitter epoch: Thursday, November 4, 2010 1:42:54.657 UTC
pub const TWITTER_EPOCH: Duration = Duration::from_millis(1_288_834_974_657);

/// Discord epoch: Thursday, January 1, 2015 00:00:00 UTC
pub const DISCORD_EPOCH: Duration = Duration::from_millis(1_420_070_400_000);

/// Instagram epoch: Saturday, January 1, 2011 00:00:00 UTC
pub const INSTAGRAM_EPOCH: Duration = Duration::from_millis(1_293_840_000_000);

/// Mastodon uses standard UNIX epoch: Thursday, January 1, 1970 00:00:00 UTC
pub const MASTODON_EPOCH: Duration = Duration::from_millis(0);

/// Converts a duration to ticks, rounding down.
pub const fn ticks_from_duration(d: Duration) -> u64 {
    (d.as_secs() << 16) | ((d.subsec_nanos() as u64 * TICKS_PER_SECOND) / 1_000_000_000)
}

/// Converts ticks to a duration, rounding up to the next nanosecond so that
/// sleeping for the result never wakes early.
pub const fn duration_from_ticks(ticks: u64) -> Duration {
    let secs = ticks >> 16;
    let frac = ticks & (TICKS_PER_SECOND - 1);
    let nanos = (frac * 1_000_000_000).div_ceil(TICKS_PER_SECOND);
    Duration::new(secs, nanos as u32)
}

/// A source of timestamps in 1/65536 second ticks since the Unix epoch.
///
/// This abstraction allows you to plug in the system clock, a monotonic
/// clock, or a mocked time source in tests.
///
/// # Example
///
/// ```
/// use siq::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_ticks(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_ticks(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in ticks since the Unix epoch.
    fn current_ticks(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_ticks(&self) -> u64 {
        (**self).current_ticks()
    }
}

/// Reads `SystemTime::now()` on every call.
///
/// The wall clock may jump backwards (NTP, manual changes); generators absorb
/// that by waiting.
#[derive(Copy, Clone, Debug, Default)]
pub struct WallClock;

impl TimeSource for WallClock {
    fn current_ticks(&self) -> u64 {
        // A clock before 1970 reads as the epoch itself.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, ticks_from_duration)
    }
}

/// A time source that samples the wall clock once, then advances with the
/// monotonic `Instant` timer.
///
/// This avoids wall-clock adjustments (e.g., NTP or daylight savings changes)
/// after construction while still aligning timestamps to the Unix epoch.
#[derive(Copy, Clone, Debug)]
pub struct MonotonicClock {
    start: Instant,
    start_ticks: u64,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Anchors a new clock at the current wall time.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            start_ticks: WallClock.current_ticks(),
        }
    }

    /// Anchors a new clock at an explicit Unix timestamp.
    pub fn starting_at(since_unix_epoch: Duration) -> Self {
        Self {
            start: Instant::now(),
            start_ticks: ticks_from_duration(since_unix_epoch),
        }
    }
}

impl TimeSource for MonotonicClock {
    fn current_ticks(&self) -> u64 {
        self.start_ticks + ticks_from_duration(self.start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_conversion_is_exact_for_whole_seconds() {
        let d = Duration::from_secs(1_577_836_800);
        assert_eq!(ticks_from_duration(d), 1_577_836_800 << 16);
        assert_eq!(duration_from_ticks(1_577_836_800 << 16), d);
    }

    #[test]
    fn tick_conversion_of_fractions() {
        assert_eq!(ticks_from_duration(Duration::from_millis(500)), 32_768);
        assert_eq!(duration_from_ticks(1), Duration::from_nanos(15_259));
        assert!(duration_from_ticks(ticks_from_duration(Duration::from_nanos(123_456_789)))
            <= Duration::from_nanos(123_456_789));
    }

    #[test]
    fn wall_clock_is_past_2020() {
        assert!(WallClock.current_ticks() > 1_577_836_800 << 16);
    }

    #[test]
    fn monotonic_clock_never_goes_backward() {
        let clock = MonotonicClock::starting_at(Duration::from_secs(1_000));
        let mut last = clock.current_ticks();
        assert!(last >= 1_000 << 16);
        for _ in 0..1_000 {
            let now = clock.current_ticks();
            assert!(now >= last);
            last = now;
        }
    }
}
