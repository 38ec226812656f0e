//! Dispatch timestamps.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// The largest timestamp handed out by any clock in this process.
static LAST: AtomicI64 = AtomicI64::new(i64::MIN);

/// Wall-clock milliseconds that never go backwards within the process.
///
/// Every `Clock` shares one high-water mark, so two engines in the same
/// process never stamp a smaller value after a larger one. If the system
/// clock steps back, the last handed-out value is repeated until wall-clock
/// time catches up.
#[derive(Debug, Default, Clone, Copy)]
pub struct Clock;

impl Clock {
    /// Create a new clock.
    pub const fn new() -> Self {
        Self
    }

    /// Milliseconds since the Unix epoch, clamped to be non-decreasing.
    pub fn now_millis(&self) -> i64 {
        clamp(&LAST, Utc::now().timestamp_millis())
    }
}

fn clamp(last: &AtomicI64, now: i64) -> i64 {
    let previous = last.fetch_max(now, Ordering::AcqRel);
    previous.max(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_goes_backwards() {
        let last = AtomicI64::new(i64::MIN);
        assert_eq!(clamp(&last, 100), 100);
        assert_eq!(clamp(&last, 90), 100);
        assert_eq!(clamp(&last, 120), 120);
    }

    #[test]
    fn test_tracks_wall_clock() {
        let clock = Clock::new();
        let first = clock.now_millis();
        let second = clock.now_millis();
        assert!(second >= first);
        assert!(first > 1_500_000_000_000);
    }

    #[test]
    fn test_separate_clocks_share_the_high_water_mark() {
        let (a, b) = (Clock::new(), Clock::new());
        let mut previous = i64::MIN;
        for _ in 0..100 {
            for clock in [&a, &b] {
                let now = clock.now_millis();
                assert!(now >= previous);
                previous = now;
            }
        }

        LAST.fetch_max(previous + 60_000, Ordering::AcqRel);
        assert!(b.now_millis() >= previous + 60_000);
    }
}
