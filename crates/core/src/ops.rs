//! Combinators that build new functions from existing ones.
//!
//! Every combinator validates operand dimensions when it is built and fixes
//! its [`FunctionClass`] and [`Representation`] at that point:
//!
//! | Combinator | Class | Representation |
//! |---|---|---|
//! | [`Plus`], [`Minus`], [`Concatenate`] | meet of operands | structural |
//! | [`Product`] | meet, lowered when both factors vary | evaluating |
//! | [`Chain`] | meet, quadratic∘quadratic is only twice differentiable | evaluating |
//! | [`Scalar`], [`Bind`], [`Map`] | operand's | operand's |
//! | [`Selection`], [`SelectionById`], [`Split`] | operand's | operand's |
//! | [`ArgumentScaling`], [`OutputScaling`] | operand's | operand's |
//! | [`PartialDerivative`] | linear for quadratic operands, else at most differentiable | dense |
//! | [`Freeze`] | linear | sparse |
//! | [`Pool`] | meet, at most differentiable | pooled functions' |
//!
//! The [`Compose`] trait offers the same constructors as methods on
//! [`SharedFunction`].

mod bind;
mod chain;
mod concatenate;
mod freeze;
mod map;
mod partial;
mod pool;
mod product;
mod scalar;
mod scaling;
mod selection;
mod split;
mod sum;


use std::sync::Arc;

pub use bind::Bind;
pub use chain::Chain;
pub use concatenate::Concatenate;
pub use freeze::Freeze;
pub use map::Map;
pub use partial::PartialDerivative;
pub use pool::Pool;
pub use product::Product;
pub use scalar::Scalar;
pub use scaling::{ArgumentScaling, OutputScaling};
pub use selection::{Selection, SelectionById};
pub use split::Split;
pub use sum::{Minus, Plus};

use crate::cache::{CacheConfig, CachedFunction};
use crate::derivative::{FiniteDifference, Policy};
use crate::function::{Function, FunctionClass, FunctionError, SharedFunction};
use crate::parametrized::Parametrized;
use crate::repr::Vector;

/// Fails unless `class` guarantees first derivatives.
fn require_differentiable(name: &str, class: FunctionClass) -> Result<(), FunctionError> {
    if class.is_differentiable() {
        Ok(())
    } else {
        Err(FunctionError::not_differentiable(name))
    }
}

/// Fails unless `class` guarantees second derivatives.
fn require_twice(name: &str, class: FunctionClass) -> Result<(), FunctionError> {
    if class.is_twice_differentiable() {
        Ok(())
    } else {
        Err(FunctionError::not_differentiable(name))
    }
}

/// Fails unless both operands take arguments of the same size.
fn same_input(context: &str, lhs: &dyn Function, rhs: &dyn Function) -> Result<(), FunctionError> {
    if lhs.input_size() == rhs.input_size() {
        Ok(())
    } else {
        Err(FunctionError::mismatch(
            format!("{context} input"),
            lhs.input_size(),
            rhs.input_size(),
        ))
    }
}

/// Builder methods for composing shared functions.
pub trait Compose {
    /// `self + other`.
    ///
    /// # Errors
    ///
    /// Returns an error if the operands' sizes differ.
    fn plus(&self, other: &SharedFunction) -> Result<SharedFunction, FunctionError>;

    /// `self − other`.
    ///
    /// # Errors
    ///
    /// Returns an error if the operands' sizes differ.
    fn minus(&self, other: &SharedFunction) -> Result<SharedFunction, FunctionError>;

    /// Pointwise product `self · other`.
    ///
    /// # Errors
    ///
    /// Returns an error if the operands' sizes are incompatible.
    fn times(&self, other: &SharedFunction) -> Result<SharedFunction, FunctionError>;

    /// `factor · self`.
    fn scale(&self, factor: f64) -> SharedFunction;

    /// `self ∘ inner`.
    ///
    /// # Errors
    ///
    /// Returns an error if `inner`'s output size differs from `self`'s input.
    fn chain(&self, inner: &SharedFunction) -> Result<SharedFunction, FunctionError>;

    /// Fixes the arguments whose entry in `values` is `Some`.
    ///
    /// # Errors
    ///
    /// Returns an error if `values` does not cover every argument.
    fn bind(&self, values: Vec<Option<f64>>) -> Result<SharedFunction, FunctionError>;

    /// Keeps outputs `start..start + size`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range exceeds the output.
    fn select(&self, start: usize, size: usize) -> Result<SharedFunction, FunctionError>;

    /// Keeps the outputs whose entry in `mask` is `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if `mask` does not cover every output.
    fn select_by_id(&self, mask: Vec<bool>) -> Result<SharedFunction, FunctionError>;

    /// Scalar view of output `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    fn split(&self, index: usize) -> Result<SharedFunction, FunctionError>;

    /// Applies `self` to `repeat` consecutive argument blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if `repeat` is zero.
    fn map(&self, repeat: usize) -> Result<SharedFunction, FunctionError>;

    /// Equality residuals `x[i] − v` pinning each `(i, v)` of `frozen`.
    ///
    /// # Errors
    ///
    /// Returns an error if `frozen` is empty, repeats an index, or names an
    /// argument `self` does not have.
    fn freeze(&self, frozen: Vec<(usize, f64)>) -> Result<SharedFunction, FunctionError>;

    /// `∂self/∂x[variable]`.
    ///
    /// # Errors
    ///
    /// Returns an error if `self` is not differentiable or `variable` is out
    /// of range.
    fn partial_derivative(&self, variable: usize) -> Result<SharedFunction, FunctionError>;

    /// `y ↦ self(factors ⊙ y)`.
    ///
    /// # Errors
    ///
    /// Returns an error unless `factors` has one finite entry per argument.
    fn scale_arguments(&self, factors: Vector) -> Result<SharedFunction, FunctionError>;

    /// `x ↦ factors ⊙ self(x)`.
    ///
    /// # Errors
    ///
    /// Returns an error unless `factors` has one finite entry per output.
    fn scale_outputs(&self, factors: Vector) -> Result<SharedFunction, FunctionError>;

    /// Reads the first `parameter_size` arguments as a parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if `parameter_size` exceeds the input size.
    fn parametrized(&self, parameter_size: usize) -> Result<Parametrized, FunctionError>;

    /// Memoizes evaluations.
    fn cached(&self, config: CacheConfig) -> SharedFunction;

    /// Replaces derivatives by finite-difference estimates.
    fn finite_difference(&self, policy: Policy) -> SharedFunction;
}

impl Compose for SharedFunction {
    fn plus(&self, other: &SharedFunction) -> Result<SharedFunction, FunctionError> {
        Ok(Arc::new(Plus::new(self.clone(), other.clone())?))
    }

    fn minus(&self, other: &SharedFunction) -> Result<SharedFunction, FunctionError> {
        Ok(Arc::new(Minus::new(self.clone(), other.clone())?))
    }

    fn times(&self, other: &SharedFunction) -> Result<SharedFunction, FunctionError> {
        Ok(Arc::new(Product::new(self.clone(), other.clone())?))
    }

    fn scale(&self, factor: f64) -> SharedFunction {
        Arc::new(Scalar::new(self.clone(), factor))
    }

    fn chain(&self, inner: &SharedFunction) -> Result<SharedFunction, FunctionError> {
        Ok(Arc::new(Chain::new(self.clone(), inner.clone())?))
    }

    fn bind(&self, values: Vec<Option<f64>>) -> Result<SharedFunction, FunctionError> {
        Ok(Arc::new(Bind::new(self.clone(), values)?))
    }

    fn select(&self, start: usize, size: usize) -> Result<SharedFunction, FunctionError> {
        Ok(Arc::new(Selection::new(self.clone(), start, size)?))
    }

    fn select_by_id(&self, mask: Vec<bool>) -> Result<SharedFunction, FunctionError> {
        Ok(Arc::new(SelectionById::new(self.clone(), mask)?))
    }

    fn split(&self, index: usize) -> Result<SharedFunction, FunctionError> {
        Ok(Arc::new(Split::new(self.clone(), index)?))
    }

    fn map(&self, repeat: usize) -> Result<SharedFunction, FunctionError> {
        Ok(Arc::new(Map::new(self.clone(), repeat)?))
    }

    fn freeze(&self, frozen: Vec<(usize, f64)>) -> Result<SharedFunction, FunctionError> {
        Ok(Arc::new(Freeze::new(self.input_size(), frozen)?))
    }

    fn partial_derivative(&self, variable: usize) -> Result<SharedFunction, FunctionError> {
        Ok(Arc::new(PartialDerivative::new(self.clone(), variable)?))
    }

    fn scale_arguments(&self, factors: Vector) -> Result<SharedFunction, FunctionError> {
        Ok(Arc::new(ArgumentScaling::new(self.clone(), factors)?))
    }

    fn scale_outputs(&self, factors: Vector) -> Result<SharedFunction, FunctionError> {
        Ok(Arc::new(OutputScaling::new(self.clone(), factors)?))
    }

    fn parametrized(&self, parameter_size: usize) -> Result<Parametrized, FunctionError> {
        Parametrized::new(self.clone(), parameter_size)
    }

    fn cached(&self, config: CacheConfig) -> SharedFunction {
        Arc::new(CachedFunction::new(self.clone(), config))
    }

    fn finite_difference(&self, policy: Policy) -> SharedFunction {
        Arc::new(FiniteDifference::new(self.clone(), policy))
    }
}

/// Implements [`Function`] for a newtype by forwarding to its inner value.
macro_rules! forward_function {
    ($outer:ty) => {
        impl $crate::function::Function for $outer {
            fn input_size(&self) -> usize {
                self.0.input_size()
            }

            fn output_size(&self) -> usize {
                self.0.output_size()
            }

            fn name(&self) -> &str {
                self.0.name()
            }

            fn class(&self) -> $crate::function::FunctionClass {
                self.0.class()
            }

            fn representation(&self) -> $crate::repr::Representation {
                self.0.representation()
            }

            fn is_constant(&self) -> bool {
                self.0.is_constant()
            }

            fn call(
                &self,
                x: &$crate::repr::Vector,
            ) -> Result<$crate::repr::Vector, $crate::function::FunctionError> {
                self.0.call(x)
            }

            fn jacobian(
                &self,
                x: &$crate::repr::Vector,
            ) -> Result<$crate::matrix::Matrix, $crate::function::FunctionError> {
                self.0.jacobian(x)
            }

            fn gradient(
                &self,
                x: &$crate::repr::Vector,
                component: usize,
            ) -> Result<$crate::repr::Vector, $crate::function::FunctionError> {
                self.0.gradient(x, component)
            }

            fn hessian(
                &self,
                x: &$crate::repr::Vector,
                component: usize,
            ) -> Result<$crate::repr::DenseMatrix, $crate::function::FunctionError> {
                self.0.hessian(x, component)
            }
        }
    };
}

use forward_function;
