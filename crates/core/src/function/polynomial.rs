use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Vector};

use super::{Function, FunctionClass, FunctionError, check_component};

/// A polynomial of one variable, `Σ cₖ tᵏ`.
///
/// Derivatives of every order are exact.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: Vector,
    name: String,
}

impl Polynomial {
    /// Creates a polynomial from coefficients in increasing degree.
    ///
    /// # Errors
    ///
    /// Returns an error if `coefficients` is empty.
    pub fn new(coefficients: Vector) -> Result<Self, FunctionError> {
        if coefficients.is_empty() {
            return Err(FunctionError::Invalid {
                what: "polynomial",
                reason: "at least one coefficient is required".to_owned(),
            });
        }
        Ok(Self {
            coefficients,
            name: "polynomial".to_owned(),
        })
    }

    #[must_use]
    pub fn coefficients(&self) -> &Vector {
        &self.coefficients
    }

    #[must_use]
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Coefficients of the `order`-th derivative.
    fn derived(&self, order: u32) -> Vec<f64> {
        let order = order as usize;
        self.coefficients
            .iter()
            .enumerate()
            .skip(order)
            .map(|(k, c)| {
                let falling: f64 = (k + 1 - order..=k).map(|m| m as f64).product();
                c * falling
            })
            .collect()
    }

    /// Evaluates with Horner's scheme.
    fn horner(coefficients: &[f64], t: f64) -> f64 {
        coefficients.iter().rev().fold(0.0, |acc, c| c + acc * t)
    }
}

impl Function for Polynomial {
    fn input_size(&self) -> usize {
        1
    }

    fn output_size(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> FunctionClass {
        FunctionClass::Derivable(u32::MAX)
    }

    fn is_constant(&self) -> bool {
        self.coefficients.iter().skip(1).all(|c| *c == 0.0)
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        self.derivative(x[0], 0)
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        let slope = self.derivative(x[0], 1)?[0];
        Ok(Matrix::Dense(DenseMatrix::from_elem((1, 1), slope)))
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        check_component(self, component)?;
        self.derivative(x[0], 1)
    }

    fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        check_component(self, component)?;
        let curvature = self.derivative(x[0], 2)?[0];
        Ok(DenseMatrix::from_elem((1, 1), curvature))
    }

    fn derivative(&self, t: f64, order: u32) -> Result<Vector, FunctionError> {
        let coefficients = self.derived(order);
        Ok(Vector::from_elem(1, Self::horner(&coefficients, t)))
    }
}
