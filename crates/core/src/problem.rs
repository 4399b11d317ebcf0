//! Optimization problems: a cost, constraints, and argument bounds.
//!
//! A [`Problem`] owns shared handles to its functions and keeps every
//! dimension consistent. All mutation goes through methods that re-check the
//! invariants, so a problem can never be observed in an inconsistent state.

use std::fmt;

use thiserror::Error;

use tracing::debug;

use crate::function::{FunctionClass, FunctionError, FunctionExt, SharedFunction};
use crate::interval::{Interval, IntervalError};
use crate::matrix::Matrix;
use crate::ops::Compose;
use crate::repr::{Promotion, Representation, Vector};

/// The kind of a constraint, derived from its function class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Linear,
    Quadratic,
    Differentiable,
    Plain,
}

impl ConstraintKind {
    /// Classifies a constraint by the strongest guarantee of its class.
    #[must_use]
    pub fn of(class: FunctionClass) -> Self {
        match class {
            FunctionClass::Linear => Self::Linear,
            FunctionClass::Quadratic => Self::Quadratic,
            FunctionClass::Plain => Self::Plain,
            _ => Self::Differentiable,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Linear => "linear",
            Self::Quadratic => "quadratic",
            Self::Differentiable => "differentiable",
            Self::Plain => "plain",
        };
        f.write_str(name)
    }
}

/// Errors that can occur when building or modifying a problem.
#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("cost function `{name}` must have a single output, got {actual}")]
    CostOutput { name: String, actual: usize },

    /// A constraint takes a different argument size than the cost.
    #[error("constraint `{name}` has input size {actual}, expected {expected}")]
    ConstraintInput {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A per-entry list (bounds, scaling, names, starting point) has the wrong length.
    #[error("{what} has {actual} entries, expected {expected}")]
    Length {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("argument index {index} is out of range for {size} arguments")]
    ArgumentIndex { index: usize, size: usize },

    #[error("constraint index {index} is out of range for {count} constraints")]
    ConstraintIndex { index: usize, count: usize },

    #[error("{kind} constraint `{name}` is not allowed in this problem")]
    DisallowedKind { name: String, kind: ConstraintKind },

    #[error("scaling factor {value} is not a positive finite number")]
    Scaling { value: f64 },

    #[error("gradient range [{lower}, {upper}] must be non-negative with a positive upper end")]
    GradientRange { lower: f64, upper: f64 },

    #[error(transparent)]
    Interval(#[from] IntervalError),

    #[error(transparent)]
    Function(#[from] FunctionError),
}

/// A constraint function together with its bounds and scaling.
#[derive(Clone)]
pub struct Constraint {
    function: SharedFunction,
    kind: ConstraintKind,
    bounds: Vec<Interval>,
    scaling: Vec<f64>,
}

impl Constraint {
    #[must_use]
    pub fn function(&self) -> &SharedFunction {
        &self.function
    }

    #[must_use]
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// One interval per output of the constraint.
    #[must_use]
    pub fn bounds(&self) -> &[Interval] {
        &self.bounds
    }

    #[must_use]
    pub fn scaling(&self) -> &[f64] {
        &self.scaling
    }

    #[must_use]
    pub fn output_size(&self) -> usize {
        self.function.output_size()
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("name", &self.function.name())
            .field("kind", &self.kind)
            .field("bounds", &self.bounds)
            .field("scaling", &self.scaling)
            .finish()
    }
}

/// Minimize a scalar cost subject to bounded constraints.
///
/// The argument has the cost's input size. Each constraint `g` must take the
/// same argument, and each of its outputs is bounded by an [`Interval`].
#[derive(Clone)]
pub struct Problem {
    cost: SharedFunction,
    constraints: Vec<Constraint>,
    argument_bounds: Vec<Interval>,
    argument_scaling: Vec<f64>,
    argument_names: Option<Vec<String>>,
    starting_point: Option<Vector>,
    allowed_kinds: Option<Vec<ConstraintKind>>,
}

impl Problem {
    /// Creates an unconstrained problem with unbounded arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ProblemError::CostOutput`] if the cost is not scalar.
    pub fn new(cost: SharedFunction) -> Result<Self, ProblemError> {
        if cost.output_size() != 1 {
            return Err(ProblemError::CostOutput {
                name: cost.name().to_owned(),
                actual: cost.output_size(),
            });
        }
        let n = cost.input_size();
        Ok(Self {
            cost,
            constraints: Vec::new(),
            argument_bounds: vec![Interval::unbounded(); n],
            argument_scaling: vec![1.0; n],
            argument_names: None,
            starting_point: None,
            allowed_kinds: None,
        })
    }

    /// Restricts the kinds of constraints [`Problem::add_constraint`] accepts.
    ///
    /// Constraints already present are not re-checked.
    #[must_use]
    pub fn with_constraint_kinds(mut self, kinds: &[ConstraintKind]) -> Self {
        self.allowed_kinds = Some(kinds.to_vec());
        self
    }

    /// Appends a constraint with one bound per output.
    ///
    /// Scaling defaults to `1` for every output.
    ///
    /// # Errors
    ///
    /// Returns an error if the constraint's input size differs from the
    /// cost's, if `bounds` or `scaling` have the wrong length, if a scaling
    /// factor is not positive, or if the constraint's kind is not allowed.
    pub fn add_constraint(
        &mut self,
        function: SharedFunction,
        bounds: Vec<Interval>,
        scaling: Option<Vec<f64>>,
    ) -> Result<(), ProblemError> {
        if function.input_size() != self.input_size() {
            return Err(ProblemError::ConstraintInput {
                name: function.name().to_owned(),
                expected: self.input_size(),
                actual: function.input_size(),
            });
        }

        let kind = ConstraintKind::of(function.class());
        if let Some(allowed) = &self.allowed_kinds {
            if !allowed.contains(&kind) {
                return Err(ProblemError::DisallowedKind {
                    name: function.name().to_owned(),
                    kind,
                });
            }
        }

        let m = function.output_size();
        check_length("constraint bounds", m, bounds.len())?;
        let scaling = match scaling {
            Some(scaling) => {
                check_length("constraint scaling", m, scaling.len())?;
                check_scaling(&scaling)?;
                scaling
            }
            None => vec![1.0; m],
        };

        self.constraints.push(Constraint {
            function,
            kind,
            bounds,
            scaling,
        });
        Ok(())
    }

    /// Pins each `(index, value)` of `frozen` with one linear equality
    /// constraint `x[index] − value = 0`.
    ///
    /// # Errors
    ///
    /// Returns an error if `frozen` is empty, repeats an index, names an
    /// argument out of range, or linear constraints are not allowed.
    pub fn freeze(&mut self, frozen: Vec<(usize, f64)>) -> Result<(), ProblemError> {
        let count = frozen.len();
        let function = self.cost.freeze(frozen)?;
        self.add_constraint(function, vec![Interval::equal_to(0.0)?; count], None)
    }

    /// Replaces the scaling factors of constraint `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range, on a length mismatch, or
    /// on a non-positive factor.
    pub fn set_constraint_scaling(
        &mut self,
        index: usize,
        scaling: Vec<f64>,
    ) -> Result<(), ProblemError> {
        let count = self.constraints.len();
        let constraint = self
            .constraints
            .get_mut(index)
            .ok_or(ProblemError::ConstraintIndex { index, count })?;
        check_length("constraint scaling", constraint.output_size(), scaling.len())?;
        check_scaling(&scaling)?;
        constraint.scaling = scaling;
        Ok(())
    }

    pub fn clear_constraints(&mut self) {
        self.constraints.clear();
    }

    /// Replaces all argument bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ProblemError::Length`] if there is not one bound per argument.
    pub fn set_argument_bounds(&mut self, bounds: Vec<Interval>) -> Result<(), ProblemError> {
        check_length("argument bounds", self.input_size(), bounds.len())?;
        self.argument_bounds = bounds;
        Ok(())
    }

    /// Replaces the bound of a single argument.
    ///
    /// # Errors
    ///
    /// Returns [`ProblemError::ArgumentIndex`] if `index` is out of range.
    pub fn set_argument_bound(
        &mut self,
        index: usize,
        bound: Interval,
    ) -> Result<(), ProblemError> {
        let size = self.input_size();
        let slot = self
            .argument_bounds
            .get_mut(index)
            .ok_or(ProblemError::ArgumentIndex { index, size })?;
        *slot = bound;
        Ok(())
    }

    /// Replaces all argument scaling factors.
    ///
    /// # Errors
    ///
    /// Returns an error on a length mismatch or a non-positive factor.
    pub fn set_argument_scaling(&mut self, scaling: Vec<f64>) -> Result<(), ProblemError> {
        check_length("argument scaling", self.input_size(), scaling.len())?;
        check_scaling(&scaling)?;
        self.argument_scaling = scaling;
        Ok(())
    }

    /// Names each argument, for logs and reports.
    ///
    /// # Errors
    ///
    /// Returns [`ProblemError::Length`] if there is not one name per argument.
    pub fn set_argument_names(&mut self, names: Vec<String>) -> Result<(), ProblemError> {
        check_length("argument names", self.input_size(), names.len())?;
        self.argument_names = Some(names);
        Ok(())
    }

    /// Sets the point solvers start from.
    ///
    /// # Errors
    ///
    /// Returns [`ProblemError::Length`] if `x` does not match the argument size.
    pub fn set_starting_point(&mut self, x: Vector) -> Result<(), ProblemError> {
        check_length("starting point", self.input_size(), x.len())?;
        self.starting_point = Some(x);
        Ok(())
    }

    #[must_use]
    pub fn input_size(&self) -> usize {
        self.cost.input_size()
    }

    #[must_use]
    pub fn cost(&self) -> &SharedFunction {
        &self.cost
    }

    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    #[must_use]
    pub fn argument_bounds(&self) -> &[Interval] {
        &self.argument_bounds
    }

    #[must_use]
    pub fn argument_scaling(&self) -> &[f64] {
        &self.argument_scaling
    }

    #[must_use]
    pub fn argument_names(&self) -> Option<&[String]> {
        self.argument_names.as_deref()
    }

    #[must_use]
    pub fn starting_point(&self) -> Option<&Vector> {
        self.starting_point.as_ref()
    }

    /// Total number of constraint rows.
    #[must_use]
    pub fn constraints_output_size(&self) -> usize {
        self.constraints.iter().map(Constraint::output_size).sum()
    }

    /// Constraint bounds flattened in row order.
    pub fn constraint_bounds(&self) -> impl Iterator<Item = &Interval> {
        self.constraints.iter().flat_map(|c| c.bounds.iter())
    }

    /// Evaluates every constraint at `x`, stacked in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` has the wrong size or an evaluation fails.
    pub fn constraint_values(&self, x: &Vector) -> Result<Vector, FunctionError> {
        let mut values = Vec::with_capacity(self.constraints_output_size());
        for constraint in &self.constraints {
            values.extend(constraint.function.checked_call(x)?.iter().copied());
        }
        Ok(Vector::from(values))
    }

    /// Representation of the stacked constraint Jacobian.
    #[must_use]
    pub fn jacobian_representation(&self) -> Representation {
        Representation::promote_all(
            self.constraints.iter().map(|c| c.function.representation()),
            Promotion::Structural,
        )
    }

    /// Stacks the Jacobians of all constraints at `x`.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError::NotDifferentiable`] if any constraint is
    /// plain, or any differentiation error.
    pub fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        let blocks = self
            .constraints
            .iter()
            .map(|c| {
                if c.kind == ConstraintKind::Plain {
                    return Err(FunctionError::not_differentiable(c.function.name()));
                }
                c.function.checked_jacobian(x)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Matrix::vstack(
            &blocks,
            self.input_size(),
            self.jacobian_representation(),
        ))
    }

    /// Largest distance of a constraint value to its bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if a constraint cannot be evaluated.
    pub fn constraint_violation(&self, x: &Vector) -> Result<f64, FunctionError> {
        let values = self.constraint_values(x)?;
        Ok(values
            .iter()
            .zip(self.constraint_bounds())
            .map(|(v, bound)| bound.violation(*v))
            .fold(0.0, f64::max))
    }

    /// The same problem expressed in scaled variables, with all scaling
    /// folded into its functions and bounds.
    ///
    /// With argument scaling `s`, the scaled argument is `y = s ⊙ x`: the
    /// cost and constraints are evaluated at `y ⊘ s`, argument bounds and the
    /// starting point are multiplied by `s`. Each constraint output and its
    /// bound are multiplied by that output's scaling factor. The result has
    /// unit scaling everywhere; map its solutions back with
    /// [`Problem::unscale_argument`].
    ///
    /// # Errors
    ///
    /// Returns an error if a scaled function cannot be built.
    pub fn scaled(&self) -> Result<Self, ProblemError> {
        let s = Vector::from(self.argument_scaling.clone());
        let inverse = s.mapv(f64::recip);

        let cost = self.cost.scale_arguments(inverse.clone())?;
        let constraints = self
            .constraints
            .iter()
            .map(|c| {
                let function = c
                    .function
                    .scale_arguments(inverse.clone())?
                    .scale_outputs(Vector::from(c.scaling.clone()))?;
                Ok(Constraint {
                    function,
                    kind: c.kind,
                    bounds: c
                        .bounds
                        .iter()
                        .zip(&c.scaling)
                        .map(|(bound, factor)| bound.scaled(*factor))
                        .collect(),
                    scaling: vec![1.0; c.output_size()],
                })
            })
            .collect::<Result<Vec<_>, FunctionError>>()?;
        debug!(
            arguments = self.input_size(),
            constraints = constraints.len(),
            "folded scaling into problem"
        );

        Ok(Self {
            cost,
            constraints,
            argument_bounds: self
                .argument_bounds
                .iter()
                .zip(&self.argument_scaling)
                .map(|(bound, factor)| bound.scaled(*factor))
                .collect(),
            argument_scaling: vec![1.0; self.input_size()],
            argument_names: self.argument_names.clone(),
            starting_point: self.starting_point.as_ref().map(|x| x * &s),
            allowed_kinds: self.allowed_kinds.clone(),
        })
    }

    /// Maps an argument of [`Problem::scaled`] back to this problem's
    /// variables, `x = y ⊘ s`.
    ///
    /// # Errors
    ///
    /// Returns [`ProblemError::Length`] if `y` does not match the argument
    /// size.
    pub fn unscale_argument(&self, y: &Vector) -> Result<Vector, ProblemError> {
        check_length("scaled argument", self.input_size(), y.len())?;
        Ok(y / &Vector::from(self.argument_scaling.clone()))
    }

    /// Whether `x` satisfies argument and constraint bounds within `tolerance`.
    ///
    /// # Errors
    ///
    /// Returns an error if a constraint cannot be evaluated.
    pub fn is_feasible(&self, x: &Vector, tolerance: f64) -> Result<bool, FunctionError> {
        let arguments_ok = x
            .iter()
            .zip(&self.argument_bounds)
            .all(|(v, bound)| bound.violation(*v) <= tolerance);
        Ok(arguments_ok && self.constraint_violation(x)? <= tolerance)
    }
}

fn check_length(what: &'static str, expected: usize, actual: usize) -> Result<(), ProblemError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ProblemError::Length {
            what,
            expected,
            actual,
        })
    }
}

fn check_scaling(scaling: &[f64]) -> Result<(), ProblemError> {
    match scaling.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
        Some(&value) => Err(ProblemError::Scaling { value }),
        None => Ok(()),
    }
}

impl fmt::Debug for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Problem")
            .field("cost", &self.cost.name())
            .field("constraints", &self.constraints)
            .field("argument_bounds", &self.argument_bounds)
            .field("starting_point", &self.starting_point)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Problem:")?;
        writeln!(f, "  Cost: {} ({})", self.cost.name(), self.cost.class())?;
        write!(f, "  Argument bounds:")?;
        for bound in &self.argument_bounds {
            write!(f, " {bound}")?;
        }
        writeln!(f)?;
        if let Some(x) = &self.starting_point {
            writeln!(f, "  Starting point: {x}")?;
        }
        writeln!(f, "  Constraints: {}", self.constraints.len())?;
        for constraint in &self.constraints {
            write!(
                f,
                "    {} ({}):",
                constraint.function.name(),
                constraint.kind
            )?;
            for bound in &constraint.bounds {
                write!(f, " {bound}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;

    use crate::function::{Cos, FnFunction, Identity, NumericLinear, SumOfSquares, shared};

    fn cost() -> SharedFunction {
        shared(SumOfSquares::new(shared(Identity::new(2))).unwrap())
    }

    fn bound(lower: f64, upper: f64) -> Interval {
        Interval::new(lower, upper).unwrap()
    }

    #[test]
    fn cost_must_be_scalar() {
        let err = Problem::new(shared(Identity::new(2))).unwrap_err();
        assert!(matches!(err, ProblemError::CostOutput { actual: 2, .. }));
    }

    #[test]
    fn defaults_are_unbounded_and_unscaled() {
        let problem = Problem::new(cost()).unwrap();

        assert_eq!(problem.input_size(), 2);
        assert_eq!(problem.argument_bounds(), &[Interval::unbounded(); 2]);
        assert_eq!(problem.argument_scaling(), &[1.0, 1.0]);
        assert!(problem.starting_point().is_none());
        assert_eq!(problem.constraints_output_size(), 0);
    }

    #[test]
    fn rejects_constraint_with_other_input_size() {
        let mut problem = Problem::new(cost()).unwrap();
        let err = problem
            .add_constraint(shared(Identity::new(3)), vec![Interval::unbounded(); 3], None)
            .unwrap_err();

        assert!(matches!(
            err,
            ProblemError::ConstraintInput {
                expected: 2,
                actual: 3,
                ..
            }
        ));
        assert!(problem.constraints().is_empty());
    }

    #[test]
    fn inverted_bounds_never_reach_the_problem() {
        fn build() -> Result<Problem, ProblemError> {
            let mut problem = Problem::new(cost())?;
            problem.set_argument_bound(0, Interval::new(1.0, 0.0)?)?;
            Ok(problem)
        }

        assert!(matches!(
            build(),
            Err(ProblemError::Interval(IntervalError::Inverted { .. }))
        ));
    }

    #[test]
    fn validates_lengths_and_indices() {
        let mut problem = Problem::new(cost()).unwrap();

        assert!(matches!(
            problem.set_starting_point(array![1.0]),
            Err(ProblemError::Length { expected: 2, actual: 1, .. })
        ));
        assert!(problem.set_argument_bounds(vec![Interval::unbounded()]).is_err());
        assert!(problem.set_argument_names(vec!["x".into()]).is_err());
        assert!(matches!(
            problem.set_argument_bound(2, Interval::unbounded()),
            Err(ProblemError::ArgumentIndex { index: 2, size: 2 })
        ));
        assert!(matches!(
            problem.set_argument_scaling(vec![1.0, 0.0]),
            Err(ProblemError::Scaling { value }) if value == 0.0
        ));
        assert!(
            problem
                .add_constraint(shared(Identity::new(2)), vec![Interval::unbounded()], None)
                .is_err()
        );

        problem.set_starting_point(array![1.0, 2.0]).unwrap();
        problem.set_argument_names(vec!["x".into(), "y".into()]).unwrap();
        assert_eq!(problem.starting_point(), Some(&array![1.0, 2.0]));
        assert_eq!(problem.argument_names().unwrap()[1], "y");
    }

    #[test]
    fn stacks_constraints() {
        let mut problem = Problem::new(cost()).unwrap();
        let linear = NumericLinear::new(array![[1.0, 1.0]], array![0.0]).unwrap();
        problem
            .add_constraint(shared(linear), vec![bound(0.0, 1.0)], Some(vec![2.0]))
            .unwrap();
        problem
            .add_constraint(shared(Cos::new(2)), vec![bound(0.0, 1.0); 2], None)
            .unwrap();

        let x = array![0.0, 0.5];
        assert_eq!(problem.constraints_output_size(), 3);
        assert_eq!(problem.constraints()[0].kind(), ConstraintKind::Linear);
        assert_eq!(problem.constraints()[1].kind(), ConstraintKind::Differentiable);
        assert_eq!(problem.constraints()[0].scaling(), &[2.0]);

        let values = problem.constraint_values(&x).unwrap();
        assert_relative_eq!(values[0], 0.5);
        assert_relative_eq!(values[2], 0.5_f64.cos());

        let jac = problem.jacobian(&x).unwrap();
        assert_eq!((jac.rows(), jac.cols()), (3, 2));
        assert_eq!(jac.representation(), Representation::Sparse);
        assert_relative_eq!(jac.get(0, 1), 1.0);
        assert_relative_eq!(jac.get(2, 1), -(0.5_f64.sin()));
        assert_relative_eq!(jac.get(1, 1), 0.0);
    }

    #[test]
    fn measures_violation_and_feasibility() {
        let mut problem = Problem::new(cost()).unwrap();
        let sum = NumericLinear::new(array![[1.0, 1.0]], array![0.0]).unwrap();
        problem
            .add_constraint(shared(sum), vec![Interval::equal_to(1.0).unwrap()], None)
            .unwrap();
        problem.set_argument_bound(0, bound(0.0, 10.0)).unwrap();

        assert_relative_eq!(problem.constraint_violation(&array![1.0, 2.0]).unwrap(), 2.0);
        assert!(problem.is_feasible(&array![0.5, 0.5], 1e-12).unwrap());
        assert!(!problem.is_feasible(&array![-0.5, 1.5], 1e-12).unwrap());
        assert!(!problem.is_feasible(&array![1.0, 2.0], 1.0).unwrap());
    }

    #[test]
    fn restricts_constraint_kinds() {
        let mut problem = Problem::new(cost())
            .unwrap()
            .with_constraint_kinds(&[ConstraintKind::Linear]);

        let err = problem
            .add_constraint(shared(Cos::new(2)), vec![Interval::unbounded(); 2], None)
            .unwrap_err();
        assert!(matches!(
            err,
            ProblemError::DisallowedKind {
                kind: ConstraintKind::Differentiable,
                ..
            }
        ));
        assert!(
            problem
                .add_constraint(shared(Identity::new(2)), vec![Interval::unbounded(); 2], None)
                .is_ok()
        );
    }

    #[test]
    fn freezing_adds_an_equality() {
        let mut problem = Problem::new(cost()).unwrap();
        problem.freeze(vec![(1, 2.0)]).unwrap();

        let frozen = &problem.constraints()[0];
        assert_eq!(frozen.kind(), ConstraintKind::Linear);
        assert!(frozen.bounds()[0].is_equality());
        assert!(problem.is_feasible(&array![5.0, 2.0], 1e-12).unwrap());
        assert!(!problem.is_feasible(&array![5.0, 2.5], 1e-12).unwrap());
        assert!(problem.freeze(vec![(2, 0.0)]).is_err());
        assert_eq!(problem.constraints().len(), 1);
    }

    #[test]
    fn constraint_scaling_can_be_replaced() {
        let mut problem = Problem::new(cost()).unwrap();
        problem
            .add_constraint(shared(Cos::new(2)), vec![bound(0.0, 1.0); 2], None)
            .unwrap();

        problem.set_constraint_scaling(0, vec![2.0, 0.5]).unwrap();
        assert_eq!(problem.constraints()[0].scaling(), &[2.0, 0.5]);
        assert!(matches!(
            problem.set_constraint_scaling(1, vec![1.0]),
            Err(ProblemError::ConstraintIndex { index: 1, count: 1 })
        ));
        assert!(problem.set_constraint_scaling(0, vec![1.0]).is_err());
        assert!(problem.set_constraint_scaling(0, vec![1.0, -1.0]).is_err());
    }

    #[test]
    fn scaled_problem_folds_in_every_factor() {
        let mut problem = Problem::new(cost()).unwrap();
        let sum = NumericLinear::new(array![[1.0, 1.0]], array![0.0]).unwrap();
        problem
            .add_constraint(shared(sum), vec![bound(1.0, 3.0)], Some(vec![10.0]))
            .unwrap();
        problem.set_argument_bound(0, bound(-1.0, 2.0)).unwrap();
        problem.set_argument_scaling(vec![2.0, 0.5]).unwrap();
        problem.set_starting_point(array![1.0, 4.0]).unwrap();

        let scaled = problem.scaled().unwrap();
        let y = array![2.0, 2.0];
        let x = problem.unscale_argument(&y).unwrap();

        assert_eq!(x, array![1.0, 4.0]);
        assert_eq!(scaled.starting_point(), Some(&y));
        assert_eq!(scaled.argument_scaling(), &[1.0, 1.0]);
        assert_eq!(scaled.argument_bounds()[0], bound(-2.0, 4.0));
        assert_eq!(scaled.constraints()[0].bounds()[0], bound(10.0, 30.0));
        assert_eq!(scaled.constraints()[0].scaling(), &[1.0]);
        assert_eq!(scaled.constraints()[0].kind(), ConstraintKind::Linear);

        assert_relative_eq!(
            scaled.cost().call(&y).unwrap()[0],
            problem.cost().call(&x).unwrap()[0]
        );
        assert_relative_eq!(scaled.constraint_values(&y).unwrap()[0], 50.0);
        // d/dy (10 (y₀ / 2 + y₁ / 0.5)) = (5, 20)
        let jacobian = scaled.jacobian(&y).unwrap();
        assert_relative_eq!(jacobian.get(0, 0), 5.0);
        assert_relative_eq!(jacobian.get(0, 1), 20.0);
        assert!(problem.unscale_argument(&array![1.0]).is_err());
    }

    #[test]
    fn plain_constraints_have_no_jacobian() {
        let mut problem = Problem::new(cost()).unwrap();
        let abs = FnFunction::new("abs", 2, 1, FunctionClass::Plain, |x: &Vector| {
            Ok(array![x[0].abs()])
        });
        problem
            .add_constraint(shared(abs), vec![Interval::at_most(1.0).unwrap()], None)
            .unwrap();

        assert_eq!(problem.constraints()[0].kind(), ConstraintKind::Plain);
        assert!(matches!(
            problem.jacobian(&array![0.0, 0.0]),
            Err(FunctionError::NotDifferentiable { .. })
        ));
        problem.clear_constraints();
        assert_eq!(problem.constraints_output_size(), 0);
    }
}
