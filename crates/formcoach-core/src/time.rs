//! Time primitives
//!
//! Frames carry a [`SessionTime`]: elapsed time since the session epoch, as
//! reported by the capture source. The engine never reads the wall clock
//! itself, so a recorded trace replays exactly like a live one.

use std::ops::{Add, Sub};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Session time - microseconds since session epoch
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SessionTime(pub i64);

impl SessionTime {
    pub const ZERO: SessionTime = SessionTime(0);

    #[inline]
    pub fn from_micros(micros: i64) -> Self {
        SessionTime(micros)
    }

    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        SessionTime(millis.saturating_mul(1000))
    }

    #[inline]
    pub fn from_secs_f64(secs: f64) -> Self {
        SessionTime((secs * 1_000_000.0) as i64)
    }

    #[inline]
    pub fn as_micros(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> i64 {
        self.0 / 1000
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        let micros = i64::try_from(duration.as_micros()).unwrap_or(i64::MAX);
        SessionTime(self.0.saturating_add(micros))
    }

    /// Time elapsed since `earlier`; zero if `earlier` is in the future
    #[inline]
    pub fn since(self, earlier: SessionTime) -> Duration {
        self - earlier
    }
}

impl Add<Duration> for SessionTime {
    type Output = SessionTime;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub<SessionTime> for SessionTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: SessionTime) -> Self::Output {
        if self.0 > rhs.0 {
            Duration::from_micros(self.0.abs_diff(rhs.0))
        } else {
            Duration::ZERO
        }
    }
}

impl std::fmt::Debug for SessionTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t({:.3}s)", self.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_time_units() {
        let t = SessionTime::from_millis(1500);
        assert_eq!(t.as_micros(), 1_500_000);
        assert_eq!(t.as_millis(), 1500);
        assert!((t.as_secs_f64() - 1.5).abs() < 1e-9);
        assert_eq!(SessionTime::from_secs_f64(1.5), t);
    }

    #[test]
    fn test_session_time_sub_saturates() {
        let a = SessionTime::from_millis(100);
        let b = SessionTime::from_millis(250);

        assert_eq!(b - a, Duration::from_millis(150));
        assert_eq!(a - b, Duration::ZERO);
        assert_eq!(b.since(a), Duration::from_millis(150));
    }

    #[test]
    fn test_session_time_monotonic_add() {
        let t1 = SessionTime::from_millis(100);
        let t2 = t1 + Duration::from_millis(10);

        assert!(t2 > t1);
        assert_eq!(t2 - t1, Duration::from_millis(10));
    }

    #[test]
    fn test_session_time_extremes_saturate() {
        let max = SessionTime(i64::MAX);
        let min = SessionTime(i64::MIN);

        assert_eq!(max + Duration::from_secs(1), max);
        assert_eq!(SessionTime::ZERO + Duration::MAX, max);
        assert_eq!(min - max, Duration::ZERO);
        assert_eq!(max - min, Duration::from_micros(u64::MAX));
        assert_eq!(SessionTime::from_millis(i64::MAX), max);
    }
}
