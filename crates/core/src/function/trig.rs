use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Representation, Vector};

use super::{Function, FunctionClass, FunctionError, check_component};

/// Component-wise cosine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cos {
    size: usize,
    name: String,
}

/// Component-wise sine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sin {
    size: usize,
    name: String,
}

impl Cos {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            name: "cos".to_owned(),
        }
    }
}

impl Sin {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            name: "sin".to_owned(),
        }
    }
}

/// Diagonal Jacobian with entries `d(xᵢ)`.
fn diagonal(x: &Vector, d: impl Fn(f64) -> f64) -> Matrix {
    Matrix::from_triplets(
        x.len(),
        x.len(),
        x.iter().enumerate().map(|(i, v)| (i, i, d(*v))),
        Representation::Sparse,
    )
}

/// Hessian of component `i`: only `(i, i)` is non-zero.
fn single_entry(size: usize, i: usize, value: f64) -> DenseMatrix {
    let mut out = DenseMatrix::zeros((size, size));
    out[[i, i]] = value;
    out
}

impl Function for Cos {
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
        FunctionClass::TwiceDifferentiable
    }

    fn representation(&self) -> Representation {
        Representation::Sparse
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        Ok(x.mapv(f64::cos))
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        Ok(diagonal(x, |v| -v.sin()))
    }

    fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        check_component(self, component)?;
        Ok(single_entry(self.size, component, -x[component].cos()))
    }
}

impl Function for Sin {
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
        FunctionClass::TwiceDifferentiable
    }

    fn representation(&self) -> Representation {
        Representation::Sparse
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        Ok(x.mapv(f64::sin))
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        Ok(diagonal(x, f64::cos))
    }

    fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        check_component(self, component)?;
        Ok(single_entry(self.size, component, -x[component].sin()))
    }
}
