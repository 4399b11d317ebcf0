//! Finite-difference derivatives.
//!
//! Functions that do not implement analytic derivatives are differentiated
//! numerically by perturbing one argument component at a time. Two policies
//! are available:
//!
//! - [`Policy::Simple`]: forward difference `(f(x + ε) − f(x)) / ε`
//! - [`Policy::FivePointsRule`]: centered stencil at `x ± h` and `x ± h/2`
//!   with `h = ε / 2`, combined by Richardson extrapolation
//!
//! The step `ε` is fixed per use; there is no adaptive refinement.
//!
//! Probing may transiently produce non-finite values. Every probe runs under
//! a [`ProbeGuard`] that records such values instead of aborting.

mod guard;
mod validation;

use thiserror::Error;

pub use guard::ProbeGuard;
pub use validation::{
    DEFAULT_THRESHOLD, ValidationError, check_gradient, check_jacobian, ensure_gradient,
    ensure_jacobian,
};

use crate::function::{Function, FunctionClass, FunctionError};
use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Representation, Vector};

/// Finite-difference scheme used to approximate a derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Policy {
    /// Two-point forward difference.
    #[default]
    Simple,

    /// Five-point centered rule, more accurate at four times the cost.
    FivePointsRule,
}

/// A validated finite-difference step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step(f64);

/// Errors that can occur when validating a finite-difference step.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    #[error("finite-difference step must be non-zero")]
    Zero,

    #[error("finite-difference step must be finite")]
    NonFinite,
}

impl Step {
    /// Step used when differentiating gradients into Hessians.
    pub const HESSIAN: Self = Self(1e-3);

    /// Creates a validated step.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is zero or non-finite.
    pub fn new(value: f64) -> Result<Self, StepError> {
        if !value.is_finite() {
            return Err(StepError::NonFinite);
        }
        if value == 0.0 {
            return Err(StepError::Zero);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Step {
    fn default() -> Self {
        Self(1e-8)
    }
}

/// Approximates the derivative of `probe` along one argument direction.
///
/// `probe(delta)` must evaluate the quantity at `x + delta·eⱼ`; `base` is its
/// value at `x` and is only used by the simple policy.
fn directional<P>(
    base: &Vector,
    mut probe: P,
    policy: Policy,
    step: Step,
) -> Result<Vector, FunctionError>
where
    P: FnMut(f64) -> Result<Vector, FunctionError>,
{
    let eps = step.value();
    match policy {
        Policy::Simple => Ok((probe(eps)? - base) / eps),
        Policy::FivePointsRule => {
            let h = eps / 2.0;
            let r3 = (probe(h)? - probe(-h)?) / 2.0;
            let r5 = (probe(h / 2.0)? - probe(-h / 2.0)?) * (4.0 / 3.0) - &r3 / 3.0;
            Ok(r5 / h)
        }
    }
}

/// Approximates the Jacobian of `function` at `x`.
///
/// The result uses the function's declared representation.
///
/// # Errors
///
/// Returns any error raised while evaluating `function`.
pub fn jacobian<F>(
    function: &F,
    x: &Vector,
    policy: Policy,
    step: Step,
) -> Result<Matrix, FunctionError>
where
    F: Function + ?Sized,
{
    let mut guard = ProbeGuard::acquire(function.name());
    let base = function.call(x)?;
    guard.inspect(&base);

    let mut entries = Vec::new();
    for j in 0..function.input_size() {
        let column = directional(
            &base,
            |delta| {
                let mut xp = x.clone();
                xp[j] += delta;
                let value = function.call(&xp)?;
                guard.inspect(&value);
                Ok(value)
            },
            policy,
            step,
        )?;
        entries.extend(
            column
                .iter()
                .enumerate()
                .filter(|(_, v)| **v != 0.0)
                .map(|(i, v)| (i, j, *v)),
        );
    }

    Ok(Matrix::from_triplets(
        function.output_size(),
        function.input_size(),
        entries,
        function.representation(),
    ))
}

/// Approximates the gradient of output `component` of `function` at `x`.
///
/// # Errors
///
/// Returns any error raised while evaluating `function`.
pub fn gradient<F>(
    function: &F,
    x: &Vector,
    component: usize,
    policy: Policy,
    step: Step,
) -> Result<Vector, FunctionError>
where
    F: Function + ?Sized,
{
    crate::function::check_component(function, component)?;
    let mut guard = ProbeGuard::acquire(function.name());
    let base = function.call(x)?;
    guard.inspect(&base);
    let base = Vector::from_elem(1, base[component]);

    let mut out = Vector::zeros(function.input_size());
    for j in 0..function.input_size() {
        let partial = directional(
            &base,
            |delta| {
                let mut xp = x.clone();
                xp[j] += delta;
                let value = function.call(&xp)?;
                guard.inspect(&value);
                Ok(Vector::from_elem(1, value[component]))
            },
            policy,
            step,
        )?;
        out[j] = partial[0];
    }
    Ok(out)
}

/// Approximates the Hessian of output `component` by differentiating its
/// gradient.
///
/// The gradient comes from [`Function::gradient`], so analytic gradients are
/// used when the function provides them. The result is symmetrized.
///
/// # Errors
///
/// Returns any error raised while computing gradients.
pub fn hessian<F>(
    function: &F,
    x: &Vector,
    component: usize,
    policy: Policy,
    step: Step,
) -> Result<DenseMatrix, FunctionError>
where
    F: Function + ?Sized,
{
    let n = function.input_size();
    let mut guard = ProbeGuard::acquire(function.name());
    let base = function.gradient(x, component)?;
    guard.inspect(&base);

    let mut out = DenseMatrix::zeros((n, n));
    for j in 0..n {
        let column = directional(
            &base,
            |delta| {
                let mut xp = x.clone();
                xp[j] += delta;
                let value = function.gradient(&xp, component)?;
                guard.inspect(&value);
                Ok(value)
            },
            policy,
            step,
        )?;
        out.column_mut(j).assign(&column);
    }

    let symmetric = (&out + &out.t()) / 2.0;
    Ok(symmetric)
}

/// Makes any function differentiable through finite differences.
///
/// The wrapper evaluates the adaptee unchanged and approximates its Jacobian
/// with the chosen [`Policy`] and [`Step`], ignoring any analytic derivative
/// the adaptee might provide.
#[derive(Debug, Clone)]
pub struct FiniteDifference<F> {
    inner: F,
    name: String,
    policy: Policy,
    step: Step,
    reject_non_finite: bool,
}

impl<F: Function> FiniteDifference<F> {
    /// Wraps `inner` with the given policy and the default step.
    pub fn new(inner: F, policy: Policy) -> Self {
        Self::with_step(inner, policy, Step::default())
    }

    /// Wraps `inner` with an explicit step.
    pub fn with_step(inner: F, policy: Policy, step: Step) -> Self {
        let name = format!("{} (finite differences)", inner.name());
        Self {
            inner,
            name,
            policy,
            step,
            reject_non_finite: false,
        }
    }

    /// Fails Jacobian requests whose probes produced non-finite values.
    #[must_use]
    pub fn rejecting_non_finite(mut self) -> Self {
        self.reject_non_finite = true;
        self
    }

    #[must_use]
    pub fn policy(&self) -> Policy {
        self.policy
    }

    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    #[must_use]
    pub fn inner(&self) -> &F {
        &self.inner
    }
}

impl<F: Function> Function for FiniteDifference<F> {
    fn input_size(&self) -> usize {
        self.inner.input_size()
    }

    fn output_size(&self) -> usize {
        self.inner.output_size()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> FunctionClass {
        FunctionClass::Differentiable
    }

    fn representation(&self) -> Representation {
        self.inner.representation()
    }

    fn is_constant(&self) -> bool {
        self.inner.is_constant()
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        self.inner.call(x)
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        let before = ProbeGuard::non_finite_total();
        let jacobian = jacobian(&self.inner, x, self.policy, self.step)?;
        let count = ProbeGuard::non_finite_total() - before;
        if self.reject_non_finite && count > 0 {
            return Err(FunctionError::NonFiniteProbe {
                name: self.name.clone(),
                count,
            });
        }
        Ok(jacobian)
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        let before = ProbeGuard::non_finite_total();
        let gradient = gradient(&self.inner, x, component, self.policy, self.step)?;
        let count = ProbeGuard::non_finite_total() - before;
        if self.reject_non_finite && count > 0 {
            return Err(FunctionError::NonFiniteProbe {
                name: self.name.clone(),
                count,
            });
        }
        Ok(gradient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;

    use crate::function::{FnFunction, Polynomial};

    fn cubic() -> Polynomial {
        // 1 − 2t + t³
        Polynomial::new(array![1.0, -2.0, 0.0, 1.0]).unwrap()
    }

    #[test]
    fn step_validation() {
        assert_eq!(Step::new(0.0), Err(StepError::Zero));
        assert_eq!(Step::new(f64::NAN), Err(StepError::NonFinite));
        assert_eq!(Step::new(f64::INFINITY), Err(StepError::NonFinite));
        assert_eq!(Step::new(-1e-6).unwrap().value(), -1e-6);
        assert_eq!(Step::default().value(), 1e-8);
    }

    #[test]
    fn both_policies_approximate_polynomial_slope() {
        let f = cubic();
        let x = array![2.0];
        // f'(2) = −2 + 3·4 = 10
        let simple = gradient(&f, &x, 0, Policy::Simple, Step::default()).unwrap();
        assert_relative_eq!(simple[0], 10.0, epsilon = 1e-5);

        let five = gradient(&f, &x, 0, Policy::FivePointsRule, Step::new(1e-3).unwrap()).unwrap();
        assert_relative_eq!(five[0], 10.0, epsilon = 1e-9);
    }

    #[test]
    fn five_points_rule_beats_forward_difference_at_coarse_steps() {
        let f = cubic();
        let x = array![2.0];
        let step = Step::new(1e-2).unwrap();

        let simple = gradient(&f, &x, 0, Policy::Simple, step).unwrap()[0];
        let five = gradient(&f, &x, 0, Policy::FivePointsRule, step).unwrap()[0];

        assert!((five - 10.0).abs() < (simple - 10.0).abs());
    }

    #[test]
    fn jacobian_keeps_declared_representation() {
        let f = FnFunction::new("swap", 2, 2, FunctionClass::Differentiable, |x: &Vector| {
            Ok(array![x[1], 2.0 * x[0]])
        })
        .with_representation(Representation::Sparse);

        let jac = jacobian(&f, &array![1.0, 1.0], Policy::FivePointsRule, Step::new(1e-4).unwrap())
            .unwrap();

        assert_eq!(jac.representation(), Representation::Sparse);
        assert_relative_eq!(jac.get(0, 1), 1.0, epsilon = 1e-8);
        assert_relative_eq!(jac.get(1, 0), 2.0, epsilon = 1e-8);
        assert_eq!(jac.get(0, 0), 0.0);
    }

    #[test]
    fn wrapper_differentiates_plain_functions() {
        let plain = FnFunction::new("square", 1, 1, FunctionClass::Plain, |x: &Vector| {
            Ok(x.mapv(|v| v * v))
        });
        assert!(plain.jacobian(&array![3.0]).is_err());

        let fd = FiniteDifference::new(plain, Policy::FivePointsRule);
        assert_eq!(fd.name(), "square (finite differences)");
        assert_eq!(fd.class(), FunctionClass::Differentiable);
        assert_relative_eq!(fd.jacobian(&array![3.0]).unwrap().get(0, 0), 6.0, epsilon = 1e-4);
    }

    #[test]
    fn non_finite_probes_are_reported_when_requested() {
        let log = FnFunction::new("log", 1, 1, FunctionClass::Plain, |x: &Vector| {
            Ok(x.mapv(f64::ln))
        });
        let fd = FiniteDifference::new(log, Policy::FivePointsRule).rejecting_non_finite();

        // The stencil crosses zero, where ln is −∞ or NaN.
        let err = fd.jacobian(&array![0.0]).unwrap_err();
        assert!(matches!(err, FunctionError::NonFiniteProbe { .. }));
        assert!(fd.jacobian(&array![1.0]).is_ok());
    }
}
