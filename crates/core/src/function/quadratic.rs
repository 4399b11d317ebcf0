use ndarray::Axis;

use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Vector};

use super::{Function, FunctionClass, FunctionError, check_component};

/// The scalar quadratic form `½ xᵀ A x + bᵀ x + c`.
///
/// Only the symmetric part of `A` contributes, so derivatives are computed
/// from `S = ½ (A + Aᵀ)`: the gradient is `S x + b` and the Hessian is `S`.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericQuadratic {
    a: DenseMatrix,
    symmetric: DenseMatrix,
    b: Vector,
    c: f64,
    name: String,
}

impl NumericQuadratic {
    /// Creates the form from its coefficients.
    ///
    /// # Errors
    ///
    /// Returns an error if `a` is not square or `b` does not match its size.
    pub fn new(a: DenseMatrix, b: Vector, c: f64) -> Result<Self, FunctionError> {
        if a.nrows() != a.ncols() {
            return Err(FunctionError::mismatch(
                "quadratic matrix columns",
                a.nrows(),
                a.ncols(),
            ));
        }
        if a.nrows() != b.len() {
            return Err(FunctionError::mismatch("quadratic linear term", a.nrows(), b.len()));
        }
        let symmetric = (&a + &a.t()) / 2.0;
        Ok(Self {
            a,
            symmetric,
            b,
            c,
            name: "numeric quadratic function".to_owned(),
        })
    }

    #[must_use]
    pub fn a(&self) -> &DenseMatrix {
        &self.a
    }

    #[must_use]
    pub fn b(&self) -> &Vector {
        &self.b
    }

    #[must_use]
    pub fn c(&self) -> f64 {
        self.c
    }
}

impl Function for NumericQuadratic {
    fn input_size(&self) -> usize {
        self.b.len()
    }

    fn output_size(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> FunctionClass {
        FunctionClass::Quadratic
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        let value = 0.5 * x.dot(&self.a.dot(x)) + self.b.dot(x) + self.c;
        Ok(Vector::from_elem(1, value))
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        Ok(Matrix::Dense(self.gradient(x, 0)?.insert_axis(Axis(0))))
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        check_component(self, component)?;
        Ok(self.symmetric.dot(x) + &self.b)
    }

    fn hessian(&self, _x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        check_component(self, component)?;
        Ok(self.symmetric.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;

    use crate::derivative::{DEFAULT_THRESHOLD, check_gradient};

    #[test]
    fn evaluates_form_and_derivatives() {
        let f = NumericQuadratic::new(array![[2.0, 1.0], [1.0, 4.0]], array![1.0, -1.0], 3.0)
            .unwrap();
        let x = array![1.0, 2.0];

        // ½ (2 + 4 + 16) + (1 − 2) + 3
        assert_relative_eq!(f.call(&x).unwrap()[0], 13.0);
        assert_eq!(f.gradient(&x, 0).unwrap(), array![5.0, 8.0]);
        assert_eq!(f.hessian(&x, 0).unwrap(), array![[2.0, 1.0], [1.0, 4.0]]);
        assert!(check_gradient(&f, 0, &x, DEFAULT_THRESHOLD));
    }

    #[test]
    fn uses_symmetric_part_of_matrix() {
        let f = NumericQuadratic::new(array![[0.0, 2.0], [0.0, 0.0]], array![0.0, 0.0], 0.0)
            .unwrap();
        let x = array![1.5, -2.0];

        assert!(check_gradient(&f, 0, &x, DEFAULT_THRESHOLD));
        assert_eq!(f.hessian(&x, 0).unwrap(), array![[0.0, 1.0], [1.0, 0.0]]);
    }
}
