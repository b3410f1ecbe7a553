//! Time primitives for arlearn
//!
//! Everything in the app runs on simulated time that the host advances with
//! explicit ticks. Wall-clock time never leaks into scheduling decisions,
//! which keeps timers and timelines deterministic under test.

use std::ops::{Add, Sub};
use std::time::Duration;

/// Simulated monotonic time - microseconds since the app started ticking
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    #[inline]
    pub fn from_micros(micros: u64) -> Self {
        SimTime(micros)
    }

    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        SimTime(millis * 1000)
    }

    #[inline]
    pub fn from_secs_f64(secs: f64) -> Self {
        SimTime((secs * 1_000_000.0) as u64)
    }

    #[inline]
    pub fn as_micros(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0 / 1000
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        SimTime(self.0.saturating_add(duration_micros(duration)))
    }

    /// Time remaining until `deadline`, zero if it already passed
    #[inline]
    pub fn until(self, deadline: SimTime) -> Duration {
        deadline - self
    }
}

/// Whole microseconds in `duration`, saturating at `u64::MAX`
#[inline]
pub fn duration_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub<SimTime> for SimTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: SimTime) -> Self::Output {
        Duration::from_micros(self.0.saturating_sub(rhs.0))
    }
}

impl std::fmt::Debug for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t({:.3}ms)", self.0 as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_time_monotonic() {
        let t1 = SimTime::from_millis(100);
        let t2 = t1 + Duration::from_millis(10);

        assert!(t2 > t1);
        assert_eq!(t2 - t1, Duration::from_millis(10));
    }

    #[test]
    fn test_sim_time_sub_saturates() {
        let early = SimTime::from_millis(5);
        let late = SimTime::from_millis(20);

        assert_eq!(early - late, Duration::ZERO);
        assert_eq!(early.until(late), Duration::from_millis(15));
        assert_eq!(late.until(early), Duration::ZERO);
    }

    #[test]
    fn test_sim_time_conversions() {
        let t = SimTime::from_secs_f64(1.5);
        assert_eq!(t.as_millis(), 1500);
        assert!((t.as_secs_f64() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_huge_durations_saturate() {
        let t = SimTime::from_millis(1);

        assert_eq!(duration_micros(Duration::MAX), u64::MAX);
        assert_eq!(t.saturating_add(Duration::MAX), SimTime(u64::MAX));
        assert_eq!(t + Duration::MAX, SimTime(u64::MAX));
        assert_eq!(t + Duration::from_micros(5), SimTime(1005));
    }
}
