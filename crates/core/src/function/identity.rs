use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Representation, Vector};

use super::{Function, FunctionClass, FunctionError, check_component};

/// The identity map on `ℝⁿ`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    size: usize,
    representation: Representation,
    name: String,
}

impl Identity {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            representation: Representation::Dense,
            name: "identity".to_owned(),
        }
    }

    #[must_use]
    pub fn with_representation(mut self, representation: Representation) -> Self {
        self.representation = representation;
        self
    }
}

impl Function for Identity {
    fn input_size(&self) -> usize {
        self.size
    }

    fn output_size(&self) -> usize {
        self.size
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> FunctionClass {
        FunctionClass::Linear
    }

    fn representation(&self) -> Representation {
        self.representation
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        Ok(x.clone())
    }

    fn jacobian(&self, _x: &Vector) -> Result<Matrix, FunctionError> {
        Ok(Matrix::from_triplets(
            self.size,
            self.size,
            (0..self.size).map(|i| (i, i, 1.0)),
            self.representation,
        ))
    }

    fn gradient(&self, _x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        check_component(self, component)?;
        let mut out = Vector::zeros(self.size);
        out[component] = 1.0;
        Ok(out)
    }

    fn hessian(&self, _x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        check_component(self, component)?;
        Ok(DenseMatrix::zeros((self.size, self.size)))
    }
}
