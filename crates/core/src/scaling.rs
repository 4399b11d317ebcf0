//! Constraint scaling suggested from sampled Jacobians.

use std::fmt;

use tracing::debug;

use crate::function::{Function, FunctionError, FunctionExt, SharedFunction};
use crate::interval::Interval;
use crate::problem::{Problem, ProblemError};
use crate::repr::Vector;

/// Suggests per-output constraint scaling so that gradients stay inside a
/// target range of magnitudes.
///
/// Every factor starts at `1`. For each sample point and each constraint
/// row, the largest absolute Jacobian coefficient `g` is compared with the
/// range `[lower, upper]`: above `upper` the factor shrinks to at most
/// `upper / g`, below `lower` an unreduced factor grows to at least
/// `lower / g`. Rows that vanish at a sample are left alone.
#[derive(Clone)]
pub struct ScalingHelper {
    constraints: Vec<SharedFunction>,
    gradient_range: Interval,
    scaling: Vec<Vec<f64>>,
}

impl ScalingHelper {
    /// The gradient range used when none is given.
    pub const DEFAULT_GRADIENT_RANGE: (f64, f64) = (0.1, 10.0);

    /// Prepares unit scaling for every constraint of `problem`.
    ///
    /// # Errors
    ///
    /// Returns [`ProblemError::GradientRange`] if the range has a negative
    /// end or a zero upper end.
    pub fn new(problem: &Problem, gradient_range: Interval) -> Result<Self, ProblemError> {
        if gradient_range.lower() < 0.0 || gradient_range.upper() <= 0.0 {
            return Err(ProblemError::GradientRange {
                lower: gradient_range.lower(),
                upper: gradient_range.upper(),
            });
        }
        let constraints: Vec<_> = problem
            .constraints()
            .iter()
            .map(|c| c.function().clone())
            .collect();
        Ok(Self {
            scaling: constraints.iter().map(|c| vec![1.0; c.output_size()]).collect(),
            constraints,
            gradient_range,
        })
    }

    /// Uses [`ScalingHelper::DEFAULT_GRADIENT_RANGE`].
    ///
    /// # Errors
    ///
    /// Never fails in practice; see [`ScalingHelper::new`].
    pub fn with_default_range(problem: &Problem) -> Result<Self, ProblemError> {
        let (lower, upper) = Self::DEFAULT_GRADIENT_RANGE;
        Self::new(problem, Interval::new(lower, upper)?)
    }

    /// Refines the factors with the constraint Jacobians at each of `points`.
    ///
    /// Plain constraints are skipped. Factors only ever move toward the
    /// range, so calling this again with more points refines the result.
    ///
    /// # Errors
    ///
    /// Returns an error if a point has the wrong size or a Jacobian cannot
    /// be computed.
    pub fn compute_scaling(&mut self, points: &[Vector]) -> Result<(), FunctionError> {
        let (lower, upper) = (self.gradient_range.lower(), self.gradient_range.upper());
        for (function, factors) in self.constraints.iter().zip(&mut self.scaling) {
            if !function.class().is_differentiable() {
                continue;
            }
            for x in points {
                let jacobian = function.checked_jacobian(x)?;
                for (row, factor) in factors.iter_mut().enumerate() {
                    let largest = jacobian.row_max_abs(row);
                    if largest == 0.0 {
                        continue;
                    }
                    if largest > upper {
                        *factor = factor.min(upper / largest);
                    } else if largest < lower && *factor >= 1.0 {
                        *factor = factor.max(lower / largest);
                    }
                }
            }
            debug!(constraint = function.name(), scaling = ?factors, "suggested scaling");
        }
        Ok(())
    }

    /// One factor list per constraint, in the problem's order.
    #[must_use]
    pub fn scaling(&self) -> &[Vec<f64>] {
        &self.scaling
    }

    /// Stores the suggested factors as the constraint scaling of `problem`.
    ///
    /// # Errors
    ///
    /// Returns an error if `problem` does not have the constraint layout the
    /// suggestion was computed for.
    pub fn apply(&self, problem: &mut Problem) -> Result<(), ProblemError> {
        if problem.constraints().len() != self.scaling.len() {
            return Err(ProblemError::Length {
                what: "suggested constraint scaling",
                expected: problem.constraints().len(),
                actual: self.scaling.len(),
            });
        }
        for (index, factors) in self.scaling.iter().enumerate() {
            problem.set_constraint_scaling(index, factors.clone())?;
        }
        Ok(())
    }
}

impl fmt::Debug for ScalingHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalingHelper")
            .field("gradient_range", &self.gradient_range)
            .field("scaling", &self.scaling)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ScalingHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scaling.is_empty() {
            return f.write_str("No suggested scaling parameters");
        }
        write!(f, "Suggested scaling parameters:")?;
        for (index, (function, factors)) in self.constraints.iter().zip(&self.scaling).enumerate() {
            write!(f, "\n  Constraint {index}:")?;
            write!(f, "\n    {}", function.name())?;
            write!(f, "\n    Scaling: {factors:?}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;

    use crate::function::{Identity, NumericLinear, SumOfSquares, shared};

    fn problem() -> Problem {
        let cost = shared(SumOfSquares::new(shared(Identity::new(2))).unwrap());
        let mut problem = Problem::new(cost).unwrap();
        // Rows with gradients of magnitude 100, 1 and 0.01.
        let steep = NumericLinear::new(array![[100.0, 1.0], [1.0, -1.0]], array![0.0, 0.0]);
        let flat = NumericLinear::new(array![[0.01, 0.0]], array![0.0]);
        problem
            .add_constraint(shared(steep.unwrap()), vec![Interval::at_most(1.0).unwrap(); 2], None)
            .unwrap();
        problem
            .add_constraint(shared(flat.unwrap()), vec![Interval::at_least(0.0).unwrap()], None)
            .unwrap();
        problem
    }

    #[test]
    fn factors_pull_gradients_into_range() {
        let problem = problem();
        let mut helper = ScalingHelper::with_default_range(&problem).unwrap();
        assert_eq!(helper.scaling(), &[vec![1.0, 1.0], vec![1.0]]);

        helper.compute_scaling(&[array![0.0, 0.0], array![1.0, 2.0]]).unwrap();

        assert_relative_eq!(helper.scaling()[0][0], 0.1);
        assert_relative_eq!(helper.scaling()[0][1], 1.0);
        assert_relative_eq!(helper.scaling()[1][0], 10.0);
    }

    #[test]
    fn suggestion_can_be_applied() {
        let mut problem = problem();
        let mut helper = ScalingHelper::with_default_range(&problem).unwrap();
        helper.compute_scaling(&[array![0.0, 0.0]]).unwrap();

        let text = helper.to_string();
        assert!(text.starts_with("Suggested scaling parameters:"));
        assert!(text.contains("Constraint 1:"));

        helper.apply(&mut problem).unwrap();
        assert_relative_eq!(problem.constraints()[0].scaling()[0], 0.1);
        assert_relative_eq!(problem.constraints()[1].scaling()[0], 10.0);

        problem.clear_constraints();
        assert!(matches!(
            helper.apply(&mut problem),
            Err(ProblemError::Length { .. })
        ));
    }

    #[test]
    fn invalid_ranges_and_empty_problems() {
        let cost = shared(SumOfSquares::new(shared(Identity::new(1))).unwrap());
        let bare = Problem::new(cost).unwrap();

        assert!(matches!(
            ScalingHelper::new(&bare, Interval::new(-1.0, 1.0).unwrap()),
            Err(ProblemError::GradientRange { .. })
        ));
        assert!(ScalingHelper::new(&bare, Interval::equal_to(0.0).unwrap()).is_err());
        assert_eq!(
            ScalingHelper::with_default_range(&bare).unwrap().to_string(),
            "No suggested scaling parameters"
        );
    }
}
