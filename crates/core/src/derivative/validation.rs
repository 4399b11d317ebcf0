use thiserror::Error;

use crate::function::{Function, FunctionError};
use crate::repr::{DenseMatrix, Vector};

use super::{Policy, Step, gradient, jacobian};

/// Largest accepted difference between analytic and numeric derivatives.
pub const DEFAULT_THRESHOLD: f64 = 1e-4;

/// Errors raised when an analytic derivative disagrees with its estimate.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(
        "{function}: gradient of component {function_component} disagrees at argument \
         {component}: max delta {max_delta:e} exceeds {threshold:e}"
    )]
    BadGradient {
        function: String,
        x: Vector,
        analytic: Vector,
        finite_difference: Vector,
        max_delta: f64,
        function_component: usize,
        component: usize,
        threshold: f64,
    },

    #[error(
        "{function}: jacobian disagrees at ({row}, {col}): max delta {max_delta:e} \
         exceeds {threshold:e}"
    )]
    BadJacobian {
        function: String,
        x: Vector,
        analytic: DenseMatrix,
        finite_difference: DenseMatrix,
        max_delta: f64,
        row: usize,
        col: usize,
        threshold: f64,
    },

    #[error(transparent)]
    Function(#[from] FunctionError),
}

/// Compares the analytic gradient of output `component` with a
/// forward-difference estimate.
///
/// # Errors
///
/// Returns [`ValidationError::BadGradient`] if any entry differs by more than
/// `threshold`, or the error raised while evaluating `function`.
pub fn ensure_gradient<F>(
    function: &F,
    component: usize,
    x: &Vector,
    threshold: f64,
) -> Result<(), ValidationError>
where
    F: Function + ?Sized,
{
    let analytic = function.gradient(x, component)?;
    let estimate = gradient(function, x, component, Policy::Simple, Step::default())?;

    let (max_delta, worst) = analytic
        .iter()
        .zip(estimate.iter())
        .map(|(a, e)| (a - e).abs())
        .enumerate()
        .fold((0.0_f64, 0), |best, (j, delta)| {
            if delta > best.0 || delta.is_nan() { (delta, j) } else { best }
        });

    if max_delta > threshold || max_delta.is_nan() {
        return Err(ValidationError::BadGradient {
            function: function.name().to_owned(),
            x: x.clone(),
            analytic,
            finite_difference: estimate,
            max_delta,
            function_component: component,
            component: worst,
            threshold,
        });
    }
    Ok(())
}

/// Compares the analytic Jacobian with a forward-difference estimate.
///
/// # Errors
///
/// Returns [`ValidationError::BadJacobian`] if any entry differs by more than
/// `threshold`, or the error raised while evaluating `function`.
pub fn ensure_jacobian<F>(function: &F, x: &Vector, threshold: f64) -> Result<(), ValidationError>
where
    F: Function + ?Sized,
{
    let analytic = function.jacobian(x)?;
    let estimate = jacobian(function, x, Policy::Simple, Step::default())?;

    let (max_delta, row, col) = analytic.max_delta(&estimate);
    if max_delta > threshold || max_delta.is_nan() {
        return Err(ValidationError::BadJacobian {
            function: function.name().to_owned(),
            x: x.clone(),
            analytic: analytic.to_dense(),
            finite_difference: estimate.to_dense(),
            max_delta,
            row,
            col,
            threshold,
        });
    }
    Ok(())
}

/// Returns `true` if the analytic gradient matches its estimate.
pub fn check_gradient<F>(function: &F, component: usize, x: &Vector, threshold: f64) -> bool
where
    F: Function + ?Sized,
{
    ensure_gradient(function, component, x, threshold).is_ok()
}

/// Returns `true` if the analytic Jacobian matches its estimate.
pub fn check_jacobian<F>(function: &F, x: &Vector, threshold: f64) -> bool
where
    F: Function + ?Sized,
{
    ensure_jacobian(function, x, threshold).is_ok()
}
