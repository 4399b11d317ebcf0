use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Representation, Vector};

use super::{Function, FunctionClass, FunctionError, check_component};

/// A function returning the same value everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    input_size: usize,
    value: Vector,
    name: String,
}

impl Constant {
    pub fn new(input_size: usize, value: Vector) -> Self {
        Self {
            input_size,
            value,
            name: "constant".to_owned(),
        }
    }

    #[must_use]
    pub fn value(&self) -> &Vector {
        &self.value
    }
}

impl Function for Constant {
    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.value.len()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> FunctionClass {
        FunctionClass::Linear
    }

    fn representation(&self) -> Representation {
        Representation::Sparse
    }

    fn is_constant(&self) -> bool {
        true
    }

    fn call(&self, _x: &Vector) -> Result<Vector, FunctionError> {
        Ok(self.value.clone())
    }

    fn jacobian(&self, _x: &Vector) -> Result<Matrix, FunctionError> {
        Ok(Matrix::zeros(
            self.value.len(),
            self.input_size,
            Representation::Sparse,
        ))
    }

    fn hessian(&self, _x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        check_component(self, component)?;
        Ok(DenseMatrix::zeros((self.input_size, self.input_size)))
    }
}
