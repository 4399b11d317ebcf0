use crate::function::{Function, FunctionClass, FunctionError, SharedFunction, display_name};
use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Representation, Vector};

use super::{require_differentiable, require_twice};

/// A function multiplied by a fixed factor.
pub struct Scalar {
    function: SharedFunction,
    factor: f64,
    name: String,
}

impl Scalar {
    /// Multiplies `function` by `factor`.
    ///
    /// A zero factor makes the result constant but keeps the operand's class.
    #[must_use]
    pub fn new(function: SharedFunction, factor: f64) -> Self {
        Self {
            name: format!("{factor} * {}", display_name(&*function, "f")),
            function,
            factor,
        }
    }

    #[must_use]
    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl Function for Scalar {
    fn input_size(&self) -> usize {
        self.function.input_size()
    }

    fn output_size(&self) -> usize {
        self.function.output_size()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> FunctionClass {
        self.function.class()
    }

    fn representation(&self) -> Representation {
        self.function.representation()
    }

    fn is_constant(&self) -> bool {
        self.factor == 0.0 || self.function.is_constant()
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        Ok(self.function.call(x)? * self.factor)
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        require_differentiable(&self.name, self.class())?;
        Ok(self.function.jacobian(x)?.scaled(self.factor))
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        require_differentiable(&self.name, self.class())?;
        Ok(self.function.gradient(x, component)? * self.factor)
    }

    fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        require_twice(&self.name, self.class())?;
        Ok(self.function.hessian(x, component)? * self.factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    use crate::function::{NumericQuadratic, Sin, shared};

    #[test]
    fn scales_values_and_derivatives() {
        // x₀² + x₁² + x₀
        let quadratic = NumericQuadratic::new(DenseMatrix::eye(2) * 2.0, array![1.0, 0.0], 0.0)
            .unwrap();
        let scaled = Scalar::new(shared(quadratic), -3.0);
        let x = array![1.0, 2.0];

        assert_eq!(scaled.factor(), -3.0);
        assert_eq!(scaled.name(), "-3 * numeric quadratic function");
        assert_eq!(scaled.call(&x).unwrap(), array![-18.0]);
        assert_eq!(scaled.gradient(&x, 0).unwrap(), array![-9.0, -12.0]);
        assert_eq!(scaled.jacobian(&x).unwrap().to_dense(), array![[-9.0, -12.0]]);
        assert_eq!(scaled.hessian(&x, 0).unwrap(), DenseMatrix::eye(2) * -6.0);
    }

    #[test]
    fn zero_factor_is_constant() {
        let sine = shared(Sin::new(2));
        assert!(!Scalar::new(sine.clone(), 2.0).is_constant());

        let zero = Scalar::new(sine, 0.0);
        assert!(zero.is_constant());
        assert_eq!(zero.class(), FunctionClass::TwiceDifferentiable);
        assert_eq!(zero.call(&array![1.0, 2.0]).unwrap(), array![0.0, 0.0]);
    }
}
