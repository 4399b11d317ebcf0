use std::fmt;

use thiserror::Error;

/// A closed interval `[lower, upper]`, possibly unbounded on either side.
///
/// Intervals describe both argument bounds and constraint bounds. An interval
/// whose ends coincide encodes an equality constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    lower: f64,
    upper: f64,
}

/// Errors that can occur when constructing an interval.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum IntervalError {
    #[error("interval bound is NaN")]
    NaN,

    #[error("lower bound {lower} exceeds upper bound {upper}")]
    Inverted { lower: f64, upper: f64 },
}

impl Interval {
    /// Creates a validated interval.
    ///
    /// # Errors
    ///
    /// Returns an error if either bound is NaN or if `lower > upper`.
    pub fn new(lower: f64, upper: f64) -> Result<Self, IntervalError> {
        if lower.is_nan() || upper.is_nan() {
            return Err(IntervalError::NaN);
        }
        if lower > upper {
            return Err(IntervalError::Inverted { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// The interval `(-∞, +∞)`.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }

    /// The interval `[lower, +∞)`.
    ///
    /// # Errors
    ///
    /// Returns an error if `lower` is NaN.
    pub fn at_least(lower: f64) -> Result<Self, IntervalError> {
        Self::new(lower, f64::INFINITY)
    }

    /// The interval `(-∞, upper]`.
    ///
    /// # Errors
    ///
    /// Returns an error if `upper` is NaN.
    pub fn at_most(upper: f64) -> Result<Self, IntervalError> {
        Self::new(f64::NEG_INFINITY, upper)
    }

    /// The degenerate interval `[value, value]`.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is NaN.
    pub fn equal_to(value: f64) -> Result<Self, IntervalError> {
        Self::new(value, value)
    }

    #[must_use]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    #[must_use]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    #[must_use]
    pub fn is_equality(&self) -> bool {
        self.lower == self.upper
    }

    /// Multiplies both ends by a positive `factor`.
    pub(crate) fn scaled(self, factor: f64) -> Self {
        debug_assert!(factor > 0.0);
        Self {
            lower: self.lower * factor,
            upper: self.upper * factor,
        }
    }

    /// Distance from `value` to the interval, zero inside it.
    #[must_use]
    pub fn violation(&self, value: f64) -> f64 {
        if value < self.lower {
            self.lower - value
        } else if value > self.upper {
            value - self.upper
        } else {
            0.0
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}
