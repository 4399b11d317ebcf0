use ndarray::concatenate;

use crate::function::{
    Function, FunctionClass, FunctionError, SharedFunction, check_component, display_name,
};
use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Promotion, Representation, Vector};

use super::{require_differentiable, require_twice, same_input};

/// Stacks the outputs of functions sharing an input size.
///
/// Outputs and Jacobian rows appear in operand order.
pub struct Concatenate {
    parts: Vec<SharedFunction>,
    offsets: Vec<usize>,
    output_size: usize,
    name: String,
    class: FunctionClass,
    representation: Representation,
}

impl Concatenate {
    /// Stacks `parts` in order.
    ///
    /// # Errors
    ///
    /// Returns an error if `parts` is empty or input sizes differ.
    pub fn new(parts: Vec<SharedFunction>) -> Result<Self, FunctionError> {
        let Some(first) = parts.first() else {
            return Err(FunctionError::Invalid {
                what: "concatenation",
                reason: "at least one function is required".to_owned(),
            });
        };
        for part in &parts[1..] {
            same_input("concatenation", &**first, &**part)?;
        }

        let mut offsets = Vec::with_capacity(parts.len());
        let mut output_size = 0;
        for part in &parts {
            offsets.push(output_size);
            output_size += part.output_size();
        }

        let names: Vec<_> = parts.iter().map(|p| display_name(&**p, "f")).collect();
        let class = parts
            .iter()
            .map(|p| p.class())
            .reduce(FunctionClass::meet)
            .unwrap_or(FunctionClass::Plain);
        let representation = Representation::promote_all(
            parts.iter().map(|p| p.representation()),
            Promotion::Structural,
        );

        Ok(Self {
            name: format!("concatenate({})", names.join(", ")),
            parts,
            offsets,
            output_size,
            class,
            representation,
        })
    }

    /// Operand holding output `component`, and the local index inside it.
    fn locate(&self, component: usize) -> (&SharedFunction, usize) {
        let block = self.offsets.partition_point(|offset| *offset <= component) - 1;
        (&self.parts[block], component - self.offsets[block])
    }
}

impl Function for Concatenate {
    fn input_size(&self) -> usize {
        self.parts[0].input_size()
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
        self.parts.iter().all(|p| p.is_constant())
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        let values = self
            .parts
            .iter()
            .map(|p| p.call(x))
            .collect::<Result<Vec<_>, _>>()?;
        let views: Vec<_> = values.iter().map(Vector::view).collect();
        concatenate(ndarray::Axis(0), &views).map_err(|e| FunctionError::Invalid {
            what: "concatenated output",
            reason: e.to_string(),
        })
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        require_differentiable(&self.name, self.class)?;
        let blocks = self
            .parts
            .iter()
            .map(|p| p.jacobian(x))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Matrix::vstack(
            &blocks,
            self.input_size(),
            self.representation,
        ))
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        require_differentiable(&self.name, self.class)?;
        check_component(self, component)?;
        let (part, local) = self.locate(component);
        part.gradient(x, local)
    }

    fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        require_twice(&self.name, self.class)?;
        check_component(self, component)?;
        let (part, local) = self.locate(component);
        part.hessian(x, local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    use crate::function::{Constant, Identity, Sin, shared};

    #[test]
    fn stacks_outputs_in_order() {
        let c = Concatenate::new(vec![
            shared(Identity::new(2)),
            shared(Constant::new(2, array![7.0])),
            shared(Sin::new(2)),
        ])
        .unwrap();
        let x = array![0.0, 1.0];

        assert_eq!(c.output_size(), 5);
        assert_eq!(c.name(), "concatenate(identity, constant, sin)");
        assert_eq!(c.class(), FunctionClass::TwiceDifferentiable);
        assert_eq!(c.representation(), Representation::Sparse);

        let value = c.call(&x).unwrap();
        assert_eq!(value.slice(ndarray::s![..3]), array![0.0, 1.0, 7.0]);

        let jac = c.jacobian(&x).unwrap();
        assert_eq!((jac.rows(), jac.cols()), (5, 2));
        assert_eq!(jac.get(1, 1), 1.0);
        assert_eq!(jac.get(3, 0), 1.0);
        assert_eq!(c.gradient(&x, 2).unwrap(), array![0.0, 0.0]);
    }

    #[test]
    fn rejects_empty_and_mismatched_parts() {
        assert!(Concatenate::new(Vec::new()).is_err());
        let mismatched = vec![shared(Identity::new(2)), shared(Identity::new(3))];
        assert!(Concatenate::new(mismatched).is_err());
    }
}
