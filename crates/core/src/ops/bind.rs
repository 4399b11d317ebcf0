use crate::function::{Function, FunctionClass, FunctionError, SharedFunction, display_name};
use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Representation, Vector};

use super::{require_differentiable, require_twice};

/// Fixes some arguments of a function to constant values.
///
/// The result takes the remaining free arguments, in their original order.
/// Its Jacobian is the original Jacobian restricted to the free columns.
pub struct Bind {
    function: SharedFunction,
    values: Vec<Option<f64>>,
    free: Vec<usize>,
    name: String,
}

impl Bind {
    /// Binds every argument whose entry in `values` is `Some`.
    ///
    /// # Errors
    ///
    /// Returns an error if `values` does not have one entry per argument.
    pub fn new(function: SharedFunction, values: Vec<Option<f64>>) -> Result<Self, FunctionError> {
        if values.len() != function.input_size() {
            return Err(FunctionError::mismatch(
                "bound values",
                function.input_size(),
                values.len(),
            ));
        }
        let free = values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.is_none().then_some(i))
            .collect();
        Ok(Self {
            name: format!("bind({})", display_name(&*function, "f")),
            function,
            values,
            free,
        })
    }

    /// Rebuilds the full argument from the free one.
    fn expand(&self, x: &Vector) -> Vector {
        let mut free = x.iter();
        self.values
            .iter()
            .map(|bound| match bound {
                Some(value) => *value,
                None => free.next().copied().unwrap_or(f64::NAN),
            })
            .collect()
    }
}

impl Function for Bind {
    fn input_size(&self) -> usize {
        self.free.len()
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
        self.free.is_empty() || self.function.is_constant()
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        self.function.call(&self.expand(x))
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        require_differentiable(&self.name, self.class())?;
        let jacobian = self.function.jacobian(&self.expand(x))?;
        Ok(jacobian.select_columns(&self.free))
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        require_differentiable(&self.name, self.class())?;
        let gradient = self.function.gradient(&self.expand(x), component)?;
        Ok(self.free.iter().map(|&j| gradient[j]).collect())
    }

    fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        require_twice(&self.name, self.class())?;
        let hessian = self.function.hessian(&self.expand(x), component)?;
        let n = self.free.len();
        Ok(DenseMatrix::from_shape_fn((n, n), |(r, c)| {
            hessian[[self.free[r], self.free[c]]]
        }))
    }
}
