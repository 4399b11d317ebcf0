use crate::function::{Function, FunctionClass, FunctionError, SharedFunction, display_name};
use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Representation, Vector};

use super::{require_differentiable, require_twice};

fn check_factors(
    what: &'static str,
    expected: usize,
    factors: &Vector,
) -> Result<(), FunctionError> {
    if factors.len() != expected {
        return Err(FunctionError::mismatch(what, expected, factors.len()));
    }
    match factors.iter().find(|f| !f.is_finite()) {
        Some(bad) => Err(FunctionError::Invalid {
            what,
            reason: format!("{bad} is not a finite factor"),
        }),
        None => Ok(()),
    }
}

/// A function of scaled arguments, `y ↦ f(d ⊙ y)`.
///
/// Jacobian columns are multiplied by `d`, Hessians by `d dᵀ`.
pub struct ArgumentScaling {
    function: SharedFunction,
    factors: Vector,
    name: String,
}

impl ArgumentScaling {
    /// Evaluates `function` at the argument multiplied entry-wise by `factors`.
    ///
    /// # Errors
    ///
    /// Returns an error if `factors` does not have one finite entry per
    /// argument.
    pub fn new(function: SharedFunction, factors: Vector) -> Result<Self, FunctionError> {
        check_factors("argument scaling", function.input_size(), &factors)?;
        Ok(Self {
            name: format!("{} (scaled arguments)", display_name(&*function, "f")),
            function,
            factors,
        })
    }

    #[must_use]
    pub fn factors(&self) -> &Vector {
        &self.factors
    }
}

impl Function for ArgumentScaling {
    fn input_size(&self) -> usize {
        self.function.input_size()
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
        self.function.is_constant()
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        self.function.call(&(x * &self.factors))
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        require_differentiable(&self.name, self.class())?;
        let jacobian = self.function.jacobian(&(x * &self.factors))?;
        Ok(jacobian.scale_columns(&self.factors))
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        require_differentiable(&self.name, self.class())?;
        Ok(self.function.gradient(&(x * &self.factors), component)? * &self.factors)
    }

    fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        require_twice(&self.name, self.class())?;
        let hessian = self.function.hessian(&(x * &self.factors), component)?;
        let d = &self.factors;
        Ok(DenseMatrix::from_shape_fn(hessian.dim(), |(r, c)| {
            hessian[[r, c]] * d[r] * d[c]
        }))
    }
}

/// A function whose outputs are multiplied by per-output factors,
/// `x ↦ s ⊙ f(x)`.
pub struct OutputScaling {
    function: SharedFunction,
    factors: Vector,
    name: String,
}

impl OutputScaling {
    /// Multiplies output `i` of `function` by `factors[i]`.
    ///
    /// # Errors
    ///
    /// Returns an error if `factors` does not have one finite entry per
    /// output.
    pub fn new(function: SharedFunction, factors: Vector) -> Result<Self, FunctionError> {
        check_factors("output scaling", function.output_size(), &factors)?;
        Ok(Self {
            name: format!("{} (scaled outputs)", display_name(&*function, "f")),
            function,
            factors,
        })
    }

    #[must_use]
    pub fn factors(&self) -> &Vector {
        &self.factors
    }
}

impl Function for OutputScaling {
    fn input_size(&self) -> usize {
        self.function.input_size()
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
        self.function.is_constant() || self.factors.iter().all(|f| *f == 0.0)
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        Ok(self.function.call(x)? * &self.factors)
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        require_differentiable(&self.name, self.class())?;
        Ok(self.function.jacobian(x)?.scale_rows(&self.factors))
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        require_differentiable(&self.name, self.class())?;
        let factor = self.factors.get(component).copied().unwrap_or(1.0);
        Ok(self.function.gradient(x, component)? * factor)
    }

    fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        require_twice(&self.name, self.class())?;
        let factor = self.factors.get(component).copied().unwrap_or(1.0);
        Ok(self.function.hessian(x, component)? * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    use crate::derivative::{check_gradient, check_jacobian};
    use crate::function::{NumericLinear, NumericQuadratic, Sin, shared};

    #[test]
    fn argument_scaling_stretches_the_domain() {
        // x₀² + x₁²
        let bowl = NumericQuadratic::new(DenseMatrix::eye(2) * 2.0, array![0.0, 0.0], 0.0).unwrap();
        let scaled = ArgumentScaling::new(shared(bowl), array![2.0, 0.5]).unwrap();
        let y = array![1.0, 4.0];

        // f(2, 2)
        assert_eq!(scaled.call(&y).unwrap(), array![8.0]);
        // ∂/∂y = d ⊙ ∇f(d ⊙ y) = (2·4, 0.5·4)
        assert_eq!(scaled.gradient(&y, 0).unwrap(), array![8.0, 2.0]);
        assert_eq!(scaled.jacobian(&y).unwrap().to_dense(), array![[8.0, 2.0]]);
        assert_eq!(scaled.hessian(&y, 0).unwrap(), array![[8.0, 0.0], [0.0, 0.5]]);
        assert!(check_gradient(&scaled, 0, &y, 1e-4));
    }

    #[test]
    fn output_scaling_keeps_sparse_jacobians() {
        let sine = shared(Sin::new(2));
        let scaled = OutputScaling::new(sine, array![3.0, -1.0]).unwrap();
        let x = array![0.2, 0.4];

        assert_eq!(scaled.name(), "sin (scaled outputs)");
        assert_eq!(
            scaled.call(&x).unwrap(),
            array![3.0 * 0.2_f64.sin(), -(0.4_f64.sin())]
        );
        let jacobian = scaled.jacobian(&x).unwrap();
        assert_eq!(jacobian.representation(), Representation::Sparse);
        assert!(check_jacobian(&scaled, &x, 1e-4));
        assert_eq!(scaled.hessian(&x, 0).unwrap()[[0, 0]], -3.0 * 0.2_f64.sin());
    }

    #[test]
    fn factors_must_match_and_be_finite() {
        let linear = shared(NumericLinear::new(array![[1.0, 2.0]], array![0.0]).unwrap());

        assert!(ArgumentScaling::new(linear.clone(), array![1.0]).is_err());
        assert!(OutputScaling::new(linear.clone(), array![1.0, 1.0]).is_err());
        assert!(OutputScaling::new(linear.clone(), array![f64::NAN]).is_err());
        assert!(OutputScaling::new(linear, array![0.0]).unwrap().is_constant());
    }
}
