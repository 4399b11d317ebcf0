use crate::function::{Function, FunctionClass, FunctionError, SharedFunction, display_name};
use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Promotion, Representation, Vector};

use super::{forward_function, require_differentiable, require_twice, same_input};

/// `lhs + sign · rhs`, shared by [`Plus`] and [`Minus`].
struct Sum {
    lhs: SharedFunction,
    rhs: SharedFunction,
    sign: f64,
    name: String,
    class: FunctionClass,
    representation: Representation,
}

impl Sum {
    fn new(lhs: SharedFunction, rhs: SharedFunction, sign: f64) -> Result<Self, FunctionError> {
        same_input("sum", &*lhs, &*rhs)?;
        if lhs.output_size() != rhs.output_size() {
            return Err(FunctionError::mismatch(
                "sum output",
                lhs.output_size(),
                rhs.output_size(),
            ));
        }
        let op = if sign > 0.0 { '+' } else { '-' };
        let name = format!(
            "{} {op} {}",
            display_name(&*lhs, "f"),
            display_name(&*rhs, "g")
        );
        Ok(Self {
            class: lhs.class().meet(rhs.class()),
            representation: lhs
                .representation()
                .promote(rhs.representation(), Promotion::Structural),
            lhs,
            rhs,
            sign,
            name,
        })
    }

    fn input_size(&self) -> usize {
        self.lhs.input_size()
    }

    fn output_size(&self) -> usize {
        self.lhs.output_size()
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
        Ok(self.lhs.call(x)? + self.rhs.call(x)? * self.sign)
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        require_differentiable(&self.name, self.class)?;
        let lhs = self.lhs.jacobian(x)?;
        let rhs = self.rhs.jacobian(x)?;
        let sum = if self.sign > 0.0 {
            lhs.add(&rhs)
        } else {
            lhs.sub(&rhs)
        };
        Ok(sum.into_representation(self.representation))
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        require_differentiable(&self.name, self.class)?;
        Ok(self.lhs.gradient(x, component)? + self.rhs.gradient(x, component)? * self.sign)
    }

    fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        require_twice(&self.name, self.class)?;
        Ok(self.lhs.hessian(x, component)? + self.rhs.hessian(x, component)? * self.sign)
    }
}

/// The sum of two functions with identical sizes.
pub struct Plus(Sum);

/// The difference of two functions with identical sizes.
pub struct Minus(Sum);

impl Plus {
    /// Builds `lhs + rhs`.
    ///
    /// # Errors
    ///
    /// Returns an error if input or output sizes differ.
    pub fn new(lhs: SharedFunction, rhs: SharedFunction) -> Result<Self, FunctionError> {
        Sum::new(lhs, rhs, 1.0).map(Self)
    }
}

impl Minus {
    /// Builds `lhs − rhs`.
    ///
    /// # Errors
    ///
    /// Returns an error if input or output sizes differ.
    pub fn new(lhs: SharedFunction, rhs: SharedFunction) -> Result<Self, FunctionError> {
        Sum::new(lhs, rhs, -1.0).map(Self)
    }
}

forward_function!(Plus);
forward_function!(Minus);

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;

    use crate::function::{Constant, Identity, shared};

    #[test]
    fn sums_values_and_jacobians() {
        let id = shared(Identity::new(2));
        let c = shared(Constant::new(2, array![1.0, 2.0]));

        let plus = Plus::new(id.clone(), c.clone()).unwrap();
        assert_eq!(plus.name(), "identity + constant");
        assert_eq!(plus.class(), FunctionClass::Linear);
        assert_eq!(plus.representation(), Representation::Sparse);
        assert_eq!(plus.call(&array![1.0, 1.0]).unwrap(), array![2.0, 3.0]);
        assert_eq!(
            plus.jacobian(&array![0.0, 0.0]).unwrap().to_dense(),
            array![[1.0, 0.0], [0.0, 1.0]]
        );

        let minus = Minus::new(id, c).unwrap();
        assert_eq!(minus.name(), "identity - constant");
        let value = minus.call(&array![1.0, 1.0]).unwrap();
        assert_relative_eq!(value[1], -1.0);
    }

    #[test]
    fn rejects_mismatched_operands() {
        let a = shared(Identity::new(2));
        let b = shared(Identity::new(3));
        assert!(matches!(
            Plus::new(a, b),
            Err(FunctionError::DimensionMismatch { .. })
        ));
    }
}
