use crate::function::{Function, FunctionClass, FunctionError, SharedFunction, display_name};
use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Promotion, Representation, Vector};

use super::{require_differentiable, require_twice};

/// Composition `outer(inner(x))`.
///
/// The Jacobian follows the chain rule, `J_outer(inner(x)) · J_inner(x)`.
pub struct Chain {
    outer: SharedFunction,
    inner: SharedFunction,
    name: String,
    class: FunctionClass,
    representation: Representation,
}

impl Chain {
    /// Builds `outer ∘ inner`.
    ///
    /// # Errors
    ///
    /// Returns an error if `inner`'s output size differs from `outer`'s input
    /// size.
    pub fn new(outer: SharedFunction, inner: SharedFunction) -> Result<Self, FunctionError> {
        if outer.input_size() != inner.output_size() {
            return Err(FunctionError::mismatch(
                "chain inner output",
                outer.input_size(),
                inner.output_size(),
            ));
        }
        Ok(Self {
            name: format!(
                "{}({})",
                display_name(&*outer, "f"),
                display_name(&*inner, "g")
            ),
            class: composed_class(outer.class(), inner.class(), inner.input_size()),
            representation: outer
                .representation()
                .promote(inner.representation(), Promotion::Evaluating),
            outer,
            inner,
        })
    }
}

/// Class of `outer ∘ inner`.
fn composed_class(outer: FunctionClass, inner: FunctionClass, input_size: usize) -> FunctionClass {
    let met = outer.meet(inner);
    match met {
        // A quadratic of a quadratic is quartic.
        FunctionClass::Quadratic
            if outer != FunctionClass::Linear && inner != FunctionClass::Linear =>
        {
            FunctionClass::TwiceDifferentiable
        }
        FunctionClass::Derivable(_) if input_size != 1 => {
            FunctionClass::TwiceDifferentiable.meet(met)
        }
        _ => met,
    }
}

impl Function for Chain {
    fn input_size(&self) -> usize {
        self.inner.input_size()
    }

    fn output_size(&self) -> usize {
        self.outer.output_size()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> FunctionClass {
        self.class
    }

    fn representation(&self) -> Representation {
        self.representation
    }

    fn is_constant(&self) -> bool {
        self.outer.is_constant() || self.inner.is_constant()
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        self.outer.call(&self.inner.call(x)?)
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        require_differentiable(&self.name, self.class)?;
        let y = self.inner.call(x)?;
        let outer = self.outer.jacobian(&y)?;
        let inner = self.inner.jacobian(x)?;
        Ok(outer.matmul(&inner).into_representation(self.representation))
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        require_differentiable(&self.name, self.class)?;
        let y = self.inner.call(x)?;
        let outer = self.outer.gradient(&y, component)?;
        Ok(self.inner.jacobian(x)?.transpose_mul_vector(&outer))
    }

    /// `J_innerᵀ H_outer J_inner + Σₖ ∂outer/∂yₖ · H_innerₖ`.
    fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        require_twice(&self.name, self.class)?;
        let y = self.inner.call(x)?;
        let jacobian = self.inner.jacobian(x)?.to_dense();
        let outer_hessian = self.outer.hessian(&y, component)?;
        let outer_gradient = self.outer.gradient(&y, component)?;

        let mut out = jacobian.t().dot(&outer_hessian).dot(&jacobian);
        for (k, weight) in outer_gradient.iter().enumerate() {
            if *weight != 0.0 {
                out = out + self.inner.hessian(x, k)? * *weight;
            }
        }
        Ok(out)
    }
}
