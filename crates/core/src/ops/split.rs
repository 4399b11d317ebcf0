use crate::function::{Function, FunctionClass, FunctionError, SharedFunction, check_component};
use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Representation, Vector};

use super::{Selection, require_differentiable, require_twice};

/// Scalar view of one output component of a function.
pub struct Split {
    function: SharedFunction,
    index: usize,
    name: String,
}

impl Split {
    /// Views output `index` of `function`.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    pub fn new(function: SharedFunction, index: usize) -> Result<Self, FunctionError> {
        check_component(&*function, index)?;
        Ok(Self {
            name: format!("{} (split, function Id = {index})", function.name()),
            function,
            index,
        })
    }

    /// One scalar view per output component.
    #[must_use]
    pub fn all(function: &SharedFunction) -> Vec<Self> {
        (0..function.output_size())
            .map(|index| Self {
                name: format!("{} (split, function Id = {index})", function.name()),
                function: function.clone(),
                index,
            })
            .collect()
    }

    /// Partitions outputs into views over `(start, size)` ranges.
    ///
    /// # Errors
    ///
    /// Returns an error if a range extends past the output or two ranges
    /// overlap.
    pub fn ranges(
        function: &SharedFunction,
        ranges: &[(usize, usize)],
    ) -> Result<Vec<Selection>, FunctionError> {
        let mut sorted = ranges.to_vec();
        sorted.sort_unstable();
        for pair in sorted.windows(2) {
            let ((a, a_size), (b, _)) = (pair[0], pair[1]);
            if a.saturating_add(a_size) > b {
                return Err(FunctionError::Invalid {
                    what: "split ranges",
                    reason: format!("range starting at {a} overlaps range starting at {b}"),
                });
            }
        }
        ranges
            .iter()
            .map(|&(start, size)| Selection::new(function.clone(), start, size))
            .collect()
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Function for Split {
    fn input_size(&self) -> usize {
        self.function.input_size()
    }

    fn output_size(&self) -> usize {
        1
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
        Ok(Vector::from_elem(1, self.function.call(x)?[self.index]))
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        require_differentiable(&self.name, self.class())?;
        Ok(self.function.jacobian(x)?.select_rows(&[self.index]))
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        require_differentiable(&self.name, self.class())?;
        check_component(self, component)?;
        self.function.gradient(x, self.index)
    }

    fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        require_twice(&self.name, self.class())?;
        check_component(self, component)?;
        self.function.hessian(x, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    use crate::function::{Sin, shared};

    #[test]
    fn splits_every_component() {
        let f = shared(Sin::new(3));
        let parts = Split::all(&f);
        let x = array![0.0, 0.5, 1.0];

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].name(), "sin (split, function Id = 2)");
        assert_eq!(parts[1].call(&x).unwrap(), array![0.5_f64.sin()]);
        assert_eq!(
            parts[1].gradient(&x, 0).unwrap(),
            array![0.0, 0.5_f64.cos(), 0.0]
        );
        assert!(Split::new(f, 3).is_err());
    }

    #[test]
    fn range_views_must_be_disjoint() {
        let f = shared(Sin::new(4));
        let views = Split::ranges(&f, &[(0, 2), (2, 2)]).unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[1].start(), 2);

        assert!(Split::ranges(&f, &[(0, 3), (2, 2)]).is_err());
        assert!(Split::ranges(&f, &[(3, 2)]).is_err());
    }

    #[test]
    fn oversized_ranges_are_rejected() {
        let f = shared(Sin::new(4));

        assert!(Split::ranges(&f, &[(1, usize::MAX), (2, 1)]).is_err());
        assert!(Split::ranges(&f, &[(usize::MAX, 2)]).is_err());
    }
}
