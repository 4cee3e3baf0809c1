use std::{
    fmt,
    ops::{Add, AddAssign, Deref},
};

use thiserror::Error;
use uom::{
    Conversion,
    si::{f64::Time, time},
};

/// A unit-safe, bounded duration used as a simulator's fixed timestep.
///
/// `TimeIncrement` wraps a [`Time`] and guarantees that it is strictly
/// positive and no longer than [`TimeIncrement::MAX_SECONDS`].
/// Increments shorter than [`TimeIncrement::MIN_SECONDS`] are also rejected.
///
/// # Construction
///
/// ```
/// use tanksim_core::TimeIncrement;
/// use uom::si::{f64::Time, time::{millisecond, second}};
///
/// let dt = TimeIncrement::new::<second>(1.0).unwrap();
/// assert_eq!(dt.seconds(), 1.0);
///
/// let dt = TimeIncrement::try_from(Time::new::<millisecond>(250.0)).unwrap();
/// assert!((dt.seconds() - 0.25).abs() < 1e-12);
///
/// assert!(TimeIncrement::new::<second>(0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeIncrement(Time);

/// Error type returned when constructing an invalid [`TimeIncrement`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TimeIncrementError {
    #[error("time increment must be greater than zero, got {0} s")]
    NotPositive(f64),

    #[error("time increment of {value} s is below the minimum of {min} s")]
    TooSmall { value: f64, min: f64 },

    #[error("time increment of {value} s exceeds the maximum of {max} s")]
    TooLarge { value: f64, max: f64 },
}

impl TimeIncrement {
    /// The shortest accepted increment, in seconds.
    pub const MIN_SECONDS: f64 = 1.0e-4;

    /// The longest accepted increment, in seconds.
    pub const MAX_SECONDS: f64 = 60.0;

    /// Constructs a `TimeIncrement` from a numeric value and unit.
    ///
    /// # Errors
    ///
    /// Returns a [`TimeIncrementError`] if the value is not strictly positive
    /// or falls outside the accepted bounds.
    pub fn new<U>(value: f64) -> Result<Self, TimeIncrementError>
    where
        U: time::Unit + Conversion<f64, T = f64>,
    {
        Self::from_time(Time::new::<U>(value))
    }

    /// Constructs a `TimeIncrement` from an existing [`Time`] value.
    ///
    /// # Errors
    ///
    /// Returns a [`TimeIncrementError`] if the time is not strictly positive
    /// or falls outside the accepted bounds.
    pub fn from_time(time: Time) -> Result<Self, TimeIncrementError> {
        let seconds = time.get::<time::second>();

        // Written so that NaN fails the first check.
        if !(seconds > 0.0) {
            return Err(TimeIncrementError::NotPositive(seconds));
        }
        if seconds < Self::MIN_SECONDS {
            return Err(TimeIncrementError::TooSmall {
                value: seconds,
                min: Self::MIN_SECONDS,
            });
        }
        if seconds > Self::MAX_SECONDS {
            return Err(TimeIncrementError::TooLarge {
                value: seconds,
                max: Self::MAX_SECONDS,
            });
        }

        Ok(Self(time))
    }

    /// Returns the increment in seconds.
    #[must_use]
    pub fn seconds(&self) -> f64 {
        self.0.get::<time::second>()
    }

    /// Consumes the `TimeIncrement` and returns the underlying [`Time`] value.
    #[must_use]
    pub fn into_inner(self) -> Time {
        self.0
    }
}

impl TryFrom<Time> for TimeIncrement {
    type Error = TimeIncrementError;
    fn try_from(t: Time) -> Result<Self, Self::Error> {
        Self::from_time(t)
    }
}

impl Deref for TimeIncrement {
    type Target = Time;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Advances a [`Time`] by one increment.
impl Add<TimeIncrement> for Time {
    type Output = Time;
    fn add(self, rhs: TimeIncrement) -> Self::Output {
        self + rhs.0
    }
}

impl AddAssign<TimeIncrement> for Time {
    fn add_assign(&mut self, rhs: TimeIncrement) {
        *self += rhs.0;
    }
}

impl fmt::Display for TimeIncrement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} s", self.seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::time::{hour, millisecond, minute, second};

    #[test]
    fn add_time_increment_to_a_time() {
        let t = Time::new::<second>(5.0);
        let dt = TimeIncrement::new::<second>(2.0).unwrap();
        assert_relative_eq!((t + dt).get::<second>(), 7.0);
    }

    #[test]
    fn add_assign_advances_a_clock() {
        let mut t = Time::new::<second>(0.0);
        let dt = TimeIncrement::new::<millisecond>(250.0).unwrap();
        for _ in 0..4 {
            t += dt;
        }
        assert_relative_eq!(t.get::<second>(), 1.0);
    }

    #[test]
    fn units_are_converted() {
        let dt = TimeIncrement::new::<millisecond>(500.0).unwrap();
        assert_relative_eq!(dt.seconds(), 0.5);
    }

    #[test]
    fn zero_time_increment_fails() {
        assert_eq!(
            TimeIncrement::new::<minute>(0.0),
            Err(TimeIncrementError::NotPositive(0.0))
        );
    }

    #[test]
    fn negative_time_increment_fails() {
        assert!(matches!(
            TimeIncrement::new::<second>(-0.1),
            Err(TimeIncrementError::NotPositive(_))
        ));
    }

    #[test]
    fn nan_time_increment_fails() {
        assert!(matches!(
            TimeIncrement::new::<second>(f64::NAN),
            Err(TimeIncrementError::NotPositive(_))
        ));
    }

    #[test]
    fn out_of_bounds_increments_fail() {
        assert!(matches!(
            TimeIncrement::new::<second>(1.0e-6),
            Err(TimeIncrementError::TooSmall { .. })
        ));
        assert!(matches!(
            TimeIncrement::new::<hour>(1.0),
            Err(TimeIncrementError::TooLarge { .. })
        ));
        assert!(matches!(
            TimeIncrement::new::<second>(f64::INFINITY),
            Err(TimeIncrementError::TooLarge { .. })
        ));
    }

    #[test]
    fn displays_in_seconds() {
        let dt = TimeIncrement::new::<minute>(0.5).unwrap();
        assert_eq!(dt.to_string(), "30 s");
    }
}
