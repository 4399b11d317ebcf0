use ndarray::s;

use crate::function::{
    Function, FunctionClass, FunctionError, SharedFunction, check_component, display_name,
};
use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Representation, Vector};

use super::{require_differentiable, require_twice};

/// Applies a function to consecutive blocks of the argument.
///
/// With `f: ℝⁿ → ℝᵐ` repeated `k` times, the result maps `ℝⁿᵏ → ℝᵐᵏ` and its
/// Jacobian is block diagonal.
pub struct Map {
    function: SharedFunction,
    repeat: usize,
    name: String,
}

impl Map {
    /// Repeats `function` over `repeat` argument blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if `repeat` is zero.
    pub fn new(function: SharedFunction, repeat: usize) -> Result<Self, FunctionError> {
        if repeat == 0 {
            return Err(FunctionError::Invalid {
                what: "map",
                reason: "repeat count must be at least one".to_owned(),
            });
        }
        Ok(Self {
            name: format!("map({}, {repeat})", display_name(&*function, "f")),
            function,
            repeat,
        })
    }

    fn block(&self, x: &Vector, b: usize) -> Vector {
        let n = self.function.input_size();
        x.slice(s![b * n..(b + 1) * n]).to_owned()
    }

    /// Block and local component of output `component`.
    fn locate(&self, component: usize) -> (usize, usize) {
        let m = self.function.output_size();
        (component / m, component % m)
    }
}

impl Function for Map {
    fn input_size(&self) -> usize {
        self.function.input_size() * self.repeat
    }

    fn output_size(&self) -> usize {
        self.function.output_size() * self.repeat
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> FunctionClass {
        match self.function.class() {
            // Repeating widens the argument past a single variable.
            FunctionClass::Derivable(n) if self.repeat > 1 => {
                FunctionClass::TwiceDifferentiable.meet(FunctionClass::Derivable(n))
            }
            class => class,
        }
    }

    fn representation(&self) -> Representation {
        self.function.representation()
    }

    fn is_constant(&self) -> bool {
        self.function.is_constant()
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        let mut out = Vec::with_capacity(self.output_size());
        for b in 0..self.repeat {
            out.extend(self.function.call(&self.block(x, b))?.iter().copied());
        }
        Ok(Vector::from(out))
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        require_differentiable(&self.name, self.class())?;
        let blocks = (0..self.repeat)
            .map(|b| self.function.jacobian(&self.block(x, b)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Matrix::block_diagonal(&blocks, self.representation()))
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        require_differentiable(&self.name, self.class())?;
        check_component(self, component)?;
        let (b, local) = self.locate(component);
        let n = self.function.input_size();

        let mut out = Vector::zeros(self.input_size());
        out.slice_mut(s![b * n..(b + 1) * n])
            .assign(&self.function.gradient(&self.block(x, b), local)?);
        Ok(out)
    }

    fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        require_twice(&self.name, self.class())?;
        check_component(self, component)?;
        let (b, local) = self.locate(component);
        let n = self.function.input_size();

        let mut out = DenseMatrix::zeros((self.input_size(), self.input_size()));
        out.slice_mut(s![b * n..(b + 1) * n, b * n..(b + 1) * n])
            .assign(&self.function.hessian(&self.block(x, b), local)?);
        Ok(out)
    }
}
