use ndarray::Axis;

use crate::matrix::Matrix;
use crate::repr::Vector;

use super::{Function, FunctionClass, FunctionError, SharedFunction, check_component};

/// The scalar `Σ fᵢ(x)²` built from a differentiable base function.
///
/// Its gradient is `Σ 2 fᵢ(x) ∇fᵢ(x)`, i.e. `2 J(x)ᵀ f(x)`.
#[derive(Clone)]
pub struct SumOfSquares {
    base: SharedFunction,
    name: String,
}

impl SumOfSquares {
    /// Wraps `base`.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError::NotDifferentiable`] if `base` has no first
    /// derivatives.
    pub fn new(base: SharedFunction) -> Result<Self, FunctionError> {
        if !base.class().is_differentiable() {
            return Err(FunctionError::not_differentiable(base.name()));
        }
        let name = format!("sum of squares({})", base.name());
        Ok(Self { base, name })
    }

    #[must_use]
    pub fn base(&self) -> &SharedFunction {
        &self.base
    }
}

impl std::fmt::Debug for SumOfSquares {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SumOfSquares")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Function for SumOfSquares {
    fn input_size(&self) -> usize {
        self.base.input_size()
    }

    fn output_size(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> FunctionClass {
        FunctionClass::Differentiable
    }

    fn is_constant(&self) -> bool {
        self.base.is_constant()
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        let value = self.base.call(x)?;
        Ok(Vector::from_elem(1, value.dot(&value)))
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        Ok(Matrix::Dense(self.gradient(x, 0)?.insert_axis(Axis(0))))
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        check_component(self, component)?;
        let value = self.base.call(x)?;
        let jacobian = self.base.jacobian(x)?;
        Ok(jacobian.transpose_mul_vector(&value) * 2.0)
    }
}
