use crate::function::{
    Function, FunctionClass, FunctionError, SharedFunction, check_component, display_name,
};
use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Representation, Vector};

use super::{require_differentiable, require_twice};

/// The partial derivative `∂f/∂xⱼ` of a function, as a function.
///
/// Its value is column `j` of the operand's Jacobian. Its own derivatives
/// come from the operand's Hessians: the gradient of output `i` is row `j`
/// of `∇²fᵢ`. Only Linear and Quadratic operands, whose Hessians are
/// constant, keep second derivatives; any other twice differentiable operand
/// gives a Differentiable result and a merely differentiable one a Plain
/// result.
pub struct PartialDerivative {
    function: SharedFunction,
    variable: usize,
    class: FunctionClass,
    name: String,
}

impl PartialDerivative {
    /// Differentiates `function` with respect to argument `variable`.
    ///
    /// # Errors
    ///
    /// Returns an error if `function` is not differentiable or `variable` is
    /// not one of its arguments.
    pub fn new(function: SharedFunction, variable: usize) -> Result<Self, FunctionError> {
        let name = format!("derivative of {}", display_name(&*function, "f"));
        require_differentiable(&name, function.class())?;
        if variable >= function.input_size() {
            return Err(FunctionError::Invalid {
                what: "derivative variable",
                reason: format!(
                    "argument {variable} is out of range for {} arguments",
                    function.input_size()
                ),
            });
        }
        let class = match function.class() {
            FunctionClass::Linear | FunctionClass::Quadratic => FunctionClass::Linear,
            other if other.is_twice_differentiable() => FunctionClass::Differentiable,
            _ => FunctionClass::Plain,
        };
        Ok(Self {
            function,
            variable,
            class,
            name,
        })
    }

    #[must_use]
    pub fn variable(&self) -> usize {
        self.variable
    }
}

impl Function for PartialDerivative {
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
        self.class
    }

    fn representation(&self) -> Representation {
        Representation::Dense
    }

    fn is_constant(&self) -> bool {
        self.function.is_constant() || self.function.class() == FunctionClass::Linear
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        let jacobian = self.function.jacobian(x)?;
        Ok((0..jacobian.rows())
            .map(|i| jacobian.get(i, self.variable))
            .collect())
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        require_differentiable(&self.name, self.class)?;
        let (m, n) = (self.output_size(), self.input_size());
        let mut out = DenseMatrix::zeros((m, n));
        for i in 0..m {
            let hessian = self.function.hessian(x, i)?;
            out.row_mut(i).assign(&hessian.row(self.variable));
        }
        Ok(Matrix::Dense(out))
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        require_differentiable(&self.name, self.class)?;
        let hessian = self.function.hessian(x, component)?;
        Ok(hessian.row(self.variable).to_owned())
    }

    /// Only reachable for affine results, whose Hessians vanish.
    fn hessian(&self, _x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        require_twice(&self.name, self.class)?;
        check_component(self, component)?;
        Ok(DenseMatrix::zeros((self.input_size(), self.input_size())))
    }
}
