use crate::function::{
    Function, FunctionClass, FunctionError, SharedFunction, check_component, display_name,
};
use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Representation, Vector};

use super::{require_differentiable, require_twice};

/// Keeps a contiguous range of a function's outputs.
pub struct Selection {
    function: SharedFunction,
    rows: Vec<usize>,
    name: String,
}

impl Selection {
    /// Keeps outputs `start..start + size`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range extends past the last output.
    pub fn new(function: SharedFunction, start: usize, size: usize) -> Result<Self, FunctionError> {
        let end = start.saturating_add(size);
        if end > function.output_size() {
            return Err(FunctionError::mismatch(
                "selection end",
                function.output_size(),
                end,
            ));
        }
        Ok(Self {
            name: format!("selection({})", display_name(&*function, "f")),
            function,
            rows: (start..end).collect(),
        })
    }

    #[must_use]
    pub fn start(&self) -> usize {
        self.rows.first().copied().unwrap_or(0)
    }
}

/// Keeps the outputs flagged in a mask.
pub struct SelectionById {
    function: SharedFunction,
    rows: Vec<usize>,
    name: String,
}

impl SelectionById {
    /// Keeps output `i` when `mask[i]` is `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if `mask` does not have one entry per output.
    pub fn new(function: SharedFunction, mask: Vec<bool>) -> Result<Self, FunctionError> {
        if mask.len() != function.output_size() {
            return Err(FunctionError::mismatch(
                "selection mask",
                function.output_size(),
                mask.len(),
            ));
        }
        Ok(Self {
            name: format!("selection by id({})", display_name(&*function, "f")),
            function,
            rows: mask
                .iter()
                .enumerate()
                .filter_map(|(i, keep)| keep.then_some(i))
                .collect(),
        })
    }

    /// Indices of the kept outputs.
    #[must_use]
    pub fn selected(&self) -> &[usize] {
        &self.rows
    }
}

/// Shared evaluation for both selections: `rows` lists the kept outputs.
fn select_call(
    function: &SharedFunction,
    rows: &[usize],
    x: &Vector,
) -> Result<Vector, FunctionError> {
    let value = function.call(x)?;
    Ok(rows.iter().map(|&i| value[i]).collect())
}

macro_rules! selection_function {
    ($ty:ty) => {
        impl Function for $ty {
            fn input_size(&self) -> usize {
                self.function.input_size()
            }

            fn output_size(&self) -> usize {
                self.rows.len()
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
                self.function.is_constant()
            }

            fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
                select_call(&self.function, &self.rows, x)
            }

            fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
                require_differentiable(&self.name, self.class())?;
                Ok(self.function.jacobian(x)?.select_rows(&self.rows))
            }

            fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
                require_differentiable(&self.name, self.class())?;
                check_component(self, component)?;
                self.function.gradient(x, self.rows[component])
            }

            fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
                require_twice(&self.name, self.class())?;
                check_component(self, component)?;
                self.function.hessian(x, self.rows[component])
            }
        }
    };
}

selection_function!(Selection);
selection_function!(SelectionById);

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    use crate::function::{Identity, shared};

    #[test]
    fn selects_contiguous_range() {
        let s = Selection::new(shared(Identity::new(4)), 1, 2).unwrap();
        let x = array![1.0, 2.0, 3.0, 4.0];

        assert_eq!(s.call(&x).unwrap(), array![2.0, 3.0]);
        assert_eq!(s.start(), 1);
        assert_eq!(
            s.jacobian(&x).unwrap().to_dense(),
            array![[0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]]
        );
        assert!(Selection::new(shared(Identity::new(4)), 3, 2).is_err());
    }

    #[test]
    fn selects_by_mask() {
        let s = SelectionById::new(shared(Identity::new(3)), vec![true, false, true]).unwrap();
        let x = array![1.0, 2.0, 3.0];

        assert_eq!(s.selected(), &[0, 2]);
        assert_eq!(s.call(&x).unwrap(), array![1.0, 3.0]);
        assert_eq!(s.gradient(&x, 1).unwrap(), array![0.0, 0.0, 1.0]);
        assert!(SelectionById::new(shared(Identity::new(3)), vec![true]).is_err());
    }
}
