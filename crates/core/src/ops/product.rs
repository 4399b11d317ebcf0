use ndarray::Array2;

use crate::function::{
    Function, FunctionClass, FunctionError, SharedFunction, check_component, display_name,
};
use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Promotion, Representation, Vector};

use super::{require_differentiable, require_twice, same_input};

/// Pointwise product of two functions.
///
/// Both operands share the input size. Their outputs either have the same
/// size or one of them is scalar and multiplies every component of the other.
/// Derivatives follow the product rule `∇(uᵢvᵢ) = uᵢ∇vᵢ + vᵢ∇uᵢ`.
pub struct Product {
    lhs: SharedFunction,
    rhs: SharedFunction,
    output_size: usize,
    name: String,
    class: FunctionClass,
    representation: Representation,
}

impl Product {
    /// Builds `lhs · rhs`.
    ///
    /// # Errors
    ///
    /// Returns an error if input sizes differ, or output sizes differ and
    /// neither is one.
    pub fn new(lhs: SharedFunction, rhs: SharedFunction) -> Result<Self, FunctionError> {
        same_input("product", &*lhs, &*rhs)?;
        let (m, n) = (lhs.output_size(), rhs.output_size());
        if m != n && m != 1 && n != 1 {
            return Err(FunctionError::mismatch("product output", m, n));
        }

        let both_vary = !lhs.is_constant() && !rhs.is_constant();
        Ok(Self {
            output_size: m.max(n),
            name: format!(
                "{} * {}",
                display_name(&*lhs, "f"),
                display_name(&*rhs, "g")
            ),
            class: lhs.class().product(rhs.class(), both_vary),
            representation: lhs
                .representation()
                .promote(rhs.representation(), Promotion::Evaluating),
            lhs,
            rhs,
        })
    }

    /// Repeats a scalar operand's value to the output size.
    fn broadcast(&self, value: Vector) -> Vector {
        if value.len() == self.output_size {
            value
        } else {
            Vector::from_elem(self.output_size, value[0])
        }
    }

    /// Repeats a scalar operand's Jacobian row to the output size.
    fn broadcast_jacobian(&self, jacobian: Matrix) -> Matrix {
        if jacobian.rows() == self.output_size {
            jacobian
        } else {
            let cols = jacobian.cols();
            let repr = jacobian.representation();
            let blocks = vec![jacobian; self.output_size];
            Matrix::vstack(&blocks, cols, repr)
        }
    }

    /// Operand component feeding output `component`.
    fn operand_component(operand: &SharedFunction, component: usize) -> usize {
        if operand.output_size() == 1 { 0 } else { component }
    }
}

impl Function for Product {
    fn input_size(&self) -> usize {
        self.lhs.input_size()
    }

    fn output_size(&self) -> usize {
        self.output_size
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
        self.lhs.is_constant() && self.rhs.is_constant()
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        let u = self.broadcast(self.lhs.call(x)?);
        let v = self.broadcast(self.rhs.call(x)?);
        Ok(u * v)
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        require_differentiable(&self.name, self.class)?;
        let u = self.broadcast(self.lhs.call(x)?);
        let v = self.broadcast(self.rhs.call(x)?);
        let ju = self.broadcast_jacobian(self.lhs.jacobian(x)?);
        let jv = self.broadcast_jacobian(self.rhs.jacobian(x)?);

        let jacobian = jv.scale_rows(&u).add(&ju.scale_rows(&v));
        Ok(jacobian.into_representation(self.representation))
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        require_differentiable(&self.name, self.class)?;
        check_component(self, component)?;
        let i = Self::operand_component(&self.lhs, component);
        let k = Self::operand_component(&self.rhs, component);

        let u = self.lhs.call(x)?[i];
        let v = self.rhs.call(x)?[k];
        Ok(self.rhs.gradient(x, k)? * u + self.lhs.gradient(x, i)? * v)
    }

    fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        require_twice(&self.name, self.class)?;
        check_component(self, component)?;
        let i = Self::operand_component(&self.lhs, component);
        let k = Self::operand_component(&self.rhs, component);

        let u = self.lhs.call(x)?[i];
        let v = self.rhs.call(x)?[k];
        let gu = self.lhs.gradient(x, i)?;
        let gv = self.rhs.gradient(x, k)?;
        let n = gu.len();
        let outer = |a: &Vector, b: &Vector| {
            Array2::from_shape_fn((n, n), |(r, c)| a[r] * b[c])
        };

        Ok(self.rhs.hessian(x, k)? * u
            + self.lhs.hessian(x, i)? * v
            + outer(&gu, &gv)
            + outer(&gv, &gu))
    }
}
