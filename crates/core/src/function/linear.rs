use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Representation, Vector};

use super::{Function, FunctionClass, FunctionError, check_component};

/// The affine map `x ↦ A x + b`.
///
/// The Jacobian is `A`, returned in `A`'s own representation.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericLinear {
    a: Matrix,
    b: Vector,
    name: String,
}

impl NumericLinear {
    /// Creates the map from its coefficients.
    ///
    /// # Errors
    ///
    /// Returns an error if `b` does not have one entry per row of `a`.
    pub fn new(a: impl Into<Matrix>, b: Vector) -> Result<Self, FunctionError> {
        let a = a.into();
        if a.rows() != b.len() {
            return Err(FunctionError::mismatch("linear offset", a.rows(), b.len()));
        }
        Ok(Self {
            a,
            b,
            name: "numeric linear function".to_owned(),
        })
    }

    #[must_use]
    pub fn a(&self) -> &Matrix {
        &self.a
    }

    #[must_use]
    pub fn b(&self) -> &Vector {
        &self.b
    }
}

impl Function for NumericLinear {
    fn input_size(&self) -> usize {
        self.a.cols()
    }

    fn output_size(&self) -> usize {
        self.a.rows()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> FunctionClass {
        FunctionClass::Linear
    }

    fn representation(&self) -> Representation {
        self.a.representation()
    }

    fn is_constant(&self) -> bool {
        self.a.triplets().is_empty()
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        Ok(self.a.dot(x) + &self.b)
    }

    fn jacobian(&self, _x: &Vector) -> Result<Matrix, FunctionError> {
        Ok(self.a.clone())
    }

    fn gradient(&self, _x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        check_component(self, component)?;
        Ok(self.a.row(component))
    }

    fn hessian(&self, _x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        check_component(self, component)?;
        let n = self.input_size();
        Ok(DenseMatrix::zeros((n, n)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    #[test]
    fn evaluates_affine_map() {
        let f = NumericLinear::new(array![[1.0, 2.0], [0.0, -1.0]], array![1.0, 0.0]).unwrap();

        assert_eq!(f.call(&array![1.0, 1.0]).unwrap(), array![4.0, -1.0]);
        assert_eq!(f.gradient(&array![0.0, 0.0], 1).unwrap(), array![0.0, -1.0]);
    }

    #[test]
    fn rejects_mismatched_offset() {
        let err = NumericLinear::new(array![[1.0, 2.0]], array![1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            FunctionError::DimensionMismatch {
                expected: 1,
                actual: 2,
                ..
            }
        ));
    }
}
