use crate::function::{Function, FunctionClass, FunctionError, NumericLinear};
use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Representation, Vector};

/// Pins some arguments to fixed values.
///
/// Output `k` is `x[iₖ] − vₖ` for the `k`-th frozen pair `(iₖ, vₖ)`, so the
/// function vanishes exactly when every frozen argument holds its value.
/// Added to a problem with zero bounds it acts as an equality constraint
/// with a constant, full-rank Jacobian.
pub struct Freeze {
    linear: NumericLinear,
    frozen: Vec<(usize, f64)>,
    name: String,
}

impl Freeze {
    /// Freezes each `(index, value)` pair of an `input_size`-argument vector.
    ///
    /// # Errors
    ///
    /// Returns an error if `frozen` is empty, an index is out of range, or an
    /// index appears twice.
    pub fn new(input_size: usize, frozen: Vec<(usize, f64)>) -> Result<Self, FunctionError> {
        if frozen.is_empty() {
            return Err(FunctionError::Invalid {
                what: "frozen arguments",
                reason: "nothing to freeze".to_owned(),
            });
        }
        let mut seen = vec![false; input_size];
        for &(index, _) in &frozen {
            match seen.get_mut(index) {
                None => {
                    return Err(FunctionError::Invalid {
                        what: "frozen arguments",
                        reason: format!("index {index} is out of range for {input_size} arguments"),
                    });
                }
                Some(true) => {
                    return Err(FunctionError::Invalid {
                        what: "frozen arguments",
                        reason: format!("index {index} is frozen twice"),
                    });
                }
                Some(slot) => *slot = true,
            }
        }

        let selector = Matrix::from_triplets(
            frozen.len(),
            input_size,
            frozen.iter().enumerate().map(|(k, &(index, _))| (k, index, 1.0)),
            Representation::Sparse,
        );
        let offset = frozen.iter().map(|&(_, value)| -value).collect();
        Ok(Self {
            linear: NumericLinear::new(selector, offset)?,
            name: format!("freeze({})", describe(&frozen)),
            frozen,
        })
    }

    #[must_use]
    pub fn frozen(&self) -> &[(usize, f64)] {
        &self.frozen
    }
}

fn describe(frozen: &[(usize, f64)]) -> String {
    frozen
        .iter()
        .map(|(index, value)| format!("x[{index}] = {value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Function for Freeze {
    fn input_size(&self) -> usize {
        self.linear.input_size()
    }

    fn output_size(&self) -> usize {
        self.frozen.len()
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

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        self.linear.call(x)
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        self.linear.jacobian(x)
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        self.linear.gradient(x, component)
    }

    fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        self.linear.hessian(x, component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    #[test]
    fn vanishes_at_the_frozen_point() {
        let freeze = Freeze::new(4, vec![(0, 3.0), (1, 7.0), (2, 0.0)]).unwrap();

        assert_eq!(freeze.output_size(), 3);
        assert_eq!(freeze.name(), "freeze(x[0] = 3, x[1] = 7, x[2] = 0)");
        assert_eq!(freeze.call(&array![3.0, 7.0, 0.0, 666.0]).unwrap(), array![0.0, 0.0, 0.0]);
        assert_eq!(freeze.call(&array![8.0, 2.0, 5.0, 666.0]).unwrap(), array![5.0, -5.0, 5.0]);
    }

    #[test]
    fn jacobian_selects_the_frozen_arguments() {
        let freeze = Freeze::new(3, vec![(2, 1.0), (0, -1.0)]).unwrap();
        let jacobian = freeze.jacobian(&array![0.0, 0.0, 0.0]).unwrap();

        assert_eq!(jacobian.representation(), Representation::Sparse);
        assert_eq!(jacobian.to_dense(), array![[0.0, 0.0, 1.0], [1.0, 0.0, 0.0]]);
        assert_eq!(freeze.gradient(&array![5.0, 5.0, 5.0], 1).unwrap(), array![1.0, 0.0, 0.0]);
        assert_eq!(freeze.hessian(&array![0.0, 0.0, 0.0], 0).unwrap(), DenseMatrix::zeros((3, 3)));
    }

    #[test]
    fn rejects_bad_indices() {
        assert!(Freeze::new(2, Vec::new()).is_err());
        assert!(Freeze::new(2, vec![(2, 0.0)]).is_err());
        assert!(Freeze::new(2, vec![(1, 0.0), (1, 1.0)]).is_err());
    }
}
