//! The function contract and the primitive building blocks.
//!
//! A [`Function`] maps an input vector of fixed size to an output vector of
//! fixed size. Its [`FunctionClass`] tells which derivatives it guarantees.
//! Functions that do not provide analytic derivatives fall back on the
//! finite-difference engine, but only when their class permits it.
//!
//! Functions are immutable once built and are shared through
//! [`SharedFunction`], so a single cost term may appear in several composites
//! or problems at once.

mod class;
mod closure;
mod constant;
mod error;
mod identity;
mod interpolation;
mod linear;
mod polynomial;
mod quadratic;
mod sum_of_squares;
mod trig;

use std::sync::Arc;

pub use class::FunctionClass;
pub use closure::FnFunction;
pub use constant::Constant;
pub use error::FunctionError;
pub use identity::Identity;
pub use interpolation::VectorInterpolation;
pub use linear::NumericLinear;
pub use polynomial::Polynomial;
pub use quadratic::NumericQuadratic;
pub use sum_of_squares::SumOfSquares;
pub use trig::{Cos, Sin};

use crate::derivative::{self, Policy, Step};
use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Representation, Vector};

/// A reference-counted, type-erased function.
pub type SharedFunction = Arc<dyn Function>;

/// Wraps a function so it can be shared between composites and problems.
pub fn shared<F: Function + 'static>(function: F) -> SharedFunction {
    Arc::new(function)
}

/// A mapping from `ℝⁿ` to `ℝᵐ`.
///
/// Callers must pass arguments of length [`Function::input_size`]; the
/// [`FunctionExt`] helpers check this before delegating.
pub trait Function: Send + Sync {
    fn input_size(&self) -> usize;

    fn output_size(&self) -> usize;

    fn name(&self) -> &str;

    fn class(&self) -> FunctionClass;

    /// Storage used for the Jacobians this function produces.
    fn representation(&self) -> Representation {
        Representation::Dense
    }

    /// Returns `true` if the output does not depend on the argument.
    fn is_constant(&self) -> bool {
        false
    }

    /// Evaluates the function at `x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the evaluation itself fails.
    fn call(&self, x: &Vector) -> Result<Vector, FunctionError>;

    /// Computes the Jacobian at `x`.
    ///
    /// The default implementation approximates it with forward differences.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError::NotDifferentiable`] if the class does not
    /// guarantee first derivatives.
    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        if !self.class().is_differentiable() {
            return Err(FunctionError::not_differentiable(self.name()));
        }
        derivative::jacobian(self, x, Policy::Simple, Step::default())
    }

    /// Computes the gradient of output `component` at `x`.
    ///
    /// Defaults to the matching row of [`Function::jacobian`].
    ///
    /// # Errors
    ///
    /// Returns an error if `component` is out of range or the function is not
    /// differentiable.
    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        check_component(self, component)?;
        Ok(self.jacobian(x)?.row(component))
    }

    /// Computes the Hessian of output `component` at `x`.
    ///
    /// The default implementation differentiates [`Function::gradient`]
    /// numerically with the five-point rule.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError::NotDifferentiable`] if the class does not
    /// guarantee second derivatives.
    fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        if !self.class().is_twice_differentiable() {
            return Err(FunctionError::not_differentiable(self.name()));
        }
        check_component(self, component)?;
        derivative::hessian(self, x, component, Policy::FivePointsRule, Step::HESSIAN)
    }

    /// Derivative of order `order` at `t` for functions of one variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not scalar or the class does not
    /// guarantee `order` derivatives.
    fn derivative(&self, t: f64, order: u32) -> Result<Vector, FunctionError> {
        if self.input_size() != 1 {
            return Err(FunctionError::mismatch(
                format!("derivative of `{}`", self.name()),
                1,
                self.input_size(),
            ));
        }
        let unsupported = || FunctionError::UnsupportedOrder {
            name: self.name().to_owned(),
            order,
        };
        if order > self.class().max_order() {
            return Err(unsupported());
        }

        let x = Vector::from_elem(1, t);
        match order {
            0 => self.call(&x),
            1 => Ok(self.jacobian(&x)?.to_dense().column(0).to_owned()),
            2 => (0..self.output_size())
                .map(|i| self.hessian(&x, i).map(|h| h[[0, 0]]))
                .collect::<Result<Vector, _>>(),
            _ => Err(unsupported()),
        }
    }
}

impl<T: Function + ?Sized> Function for Arc<T> {
    fn input_size(&self) -> usize {
        (**self).input_size()
    }

    fn output_size(&self) -> usize {
        (**self).output_size()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn class(&self) -> FunctionClass {
        (**self).class()
    }

    fn representation(&self) -> Representation {
        (**self).representation()
    }

    fn is_constant(&self) -> bool {
        (**self).is_constant()
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        (**self).call(x)
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        (**self).jacobian(x)
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        (**self).gradient(x, component)
    }

    fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        (**self).hessian(x, component)
    }

    fn derivative(&self, t: f64, order: u32) -> Result<Vector, FunctionError> {
        (**self).derivative(t, order)
    }
}

/// Size-checked entry points for any [`Function`].
pub trait FunctionExt: Function {
    /// Evaluates after checking the argument size.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError::ArgumentSize`] on a size mismatch, or any
    /// evaluation error.
    fn checked_call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        check_argument(self, x)?;
        let value = self.call(x)?;
        if value.len() != self.output_size() {
            return Err(FunctionError::mismatch(
                format!("output of `{}`", self.name()),
                self.output_size(),
                value.len(),
            ));
        }
        Ok(value)
    }

    /// Computes the Jacobian after checking the argument size.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError::ArgumentSize`] on a size mismatch, or any
    /// differentiation error.
    fn checked_jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        check_argument(self, x)?;
        self.jacobian(x)
    }

    /// Computes a gradient after checking the argument size.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError::ArgumentSize`] on a size mismatch, or any
    /// differentiation error.
    fn checked_gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        check_argument(self, x)?;
        self.gradient(x, component)
    }
}

impl<F: Function + ?Sized> FunctionExt for F {}

pub(crate) fn check_argument<F: Function + ?Sized>(
    function: &F,
    x: &Vector,
) -> Result<(), FunctionError> {
    if x.len() == function.input_size() {
        Ok(())
    } else {
        Err(FunctionError::ArgumentSize {
            name: function.name().to_owned(),
            expected: function.input_size(),
            actual: x.len(),
        })
    }
}

pub(crate) fn check_component<F: Function + ?Sized>(
    function: &F,
    component: usize,
) -> Result<(), FunctionError> {
    if component < function.output_size() {
        Ok(())
    } else {
        Err(FunctionError::ComponentOutOfRange {
            name: function.name().to_owned(),
            index: component,
            size: function.output_size(),
        })
    }
}

/// Resolves the name of a function, falling back to `default` when empty.
pub(crate) fn display_name(function: &dyn Function, default: &str) -> String {
    let name = function.name();
    if name.is_empty() {
        default.to_owned()
    } else {
        name.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;

    /// f(x) = x₀² + 3x₁ with no analytic derivatives.
    struct Bowl;

    impl Function for Bowl {
        fn input_size(&self) -> usize {
            2
        }

        fn output_size(&self) -> usize {
            1
        }

        fn name(&self) -> &str {
            "bowl"
        }

        fn class(&self) -> FunctionClass {
            FunctionClass::TwiceDifferentiable
        }

        fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
            Ok(array![x[0] * x[0] + 3.0 * x[1]])
        }
    }

    struct Opaque;

    impl Function for Opaque {
        fn input_size(&self) -> usize {
            1
        }

        fn output_size(&self) -> usize {
            1
        }

        fn name(&self) -> &str {
            "opaque"
        }

        fn class(&self) -> FunctionClass {
            FunctionClass::Plain
        }

        fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
            Ok(x.mapv(f64::abs))
        }
    }

    #[test]
    fn default_derivatives_use_finite_differences() {
        let x = array![1.5, -2.0];

        let gradient = Bowl.gradient(&x, 0).unwrap();
        assert_relative_eq!(gradient[0], 3.0, epsilon = 1e-6);
        assert_relative_eq!(gradient[1], 3.0, epsilon = 1e-6);

        let hessian = Bowl.hessian(&x, 0).unwrap();
        assert_relative_eq!(hessian[[0, 0]], 2.0, epsilon = 1e-2);
        assert_relative_eq!(hessian[[1, 1]], 0.0, epsilon = 1e-2);
    }

    #[test]
    fn plain_functions_refuse_derivatives() {
        let x = array![1.0];
        assert!(matches!(
            Opaque.jacobian(&x),
            Err(FunctionError::NotDifferentiable { .. })
        ));
        assert!(matches!(
            Opaque.derivative(1.0, 1),
            Err(FunctionError::UnsupportedOrder { order: 1, .. })
        ));
        assert_eq!(Opaque.derivative(-2.0, 0).unwrap(), array![2.0]);
    }

    #[test]
    fn checked_entry_points_validate_sizes() {
        let err = Bowl.checked_call(&array![1.0]).unwrap_err();
        assert!(matches!(
            err,
            FunctionError::ArgumentSize {
                expected: 2,
                actual: 1,
                ..
            }
        ));
        assert!(matches!(
            Bowl.gradient(&array![1.0, 1.0], 3),
            Err(FunctionError::ComponentOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn shared_functions_forward_everything() {
        let f: SharedFunction = shared(Bowl);
        assert_eq!(f.name(), "bowl");
        assert_eq!(f.checked_call(&array![2.0, 0.0]).unwrap(), array![4.0]);
    }
}
