use std::fmt;

use crate::derivative::{self, Policy, Step};
use crate::matrix::Matrix;
use crate::repr::{Representation, Vector};

use super::{Function, FunctionClass, FunctionError};

type ValueFn = dyn Fn(&Vector) -> Result<Vector, FunctionError> + Send + Sync;
type JacobianFn = dyn Fn(&Vector) -> Result<Matrix, FunctionError> + Send + Sync;

/// A function defined by closures.
///
/// Without an analytic Jacobian, derivatives fall back on forward differences
/// when the declared class allows it.
pub struct FnFunction {
    name: String,
    input_size: usize,
    output_size: usize,
    class: FunctionClass,
    representation: Representation,
    value: Box<ValueFn>,
    jacobian: Option<Box<JacobianFn>>,
}

impl FnFunction {
    pub fn new<V>(
        name: impl Into<String>,
        input_size: usize,
        output_size: usize,
        class: FunctionClass,
        value: V,
    ) -> Self
    where
        V: Fn(&Vector) -> Result<Vector, FunctionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            input_size,
            output_size,
            class,
            representation: Representation::Dense,
            value: Box::new(value),
            jacobian: None,
        }
    }

    /// Provides an analytic Jacobian.
    #[must_use]
    pub fn with_jacobian<J>(mut self, jacobian: J) -> Self
    where
        J: Fn(&Vector) -> Result<Matrix, FunctionError> + Send + Sync + 'static,
    {
        self.jacobian = Some(Box::new(jacobian));
        self
    }

    #[must_use]
    pub fn with_representation(mut self, representation: Representation) -> Self {
        self.representation = representation;
        self
    }
}

impl fmt::Debug for FnFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFunction")
            .field("name", &self.name)
            .field("input_size", &self.input_size)
            .field("output_size", &self.output_size)
            .field("class", &self.class)
            .field("analytic_jacobian", &self.jacobian.is_some())
            .finish_non_exhaustive()
    }
}

impl Function for FnFunction {
    fn input_size(&self) -> usize {
        self.input_size
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

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        (self.value)(x)
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        if !self.class.is_differentiable() {
            return Err(FunctionError::not_differentiable(&self.name));
        }
        match &self.jacobian {
            Some(jacobian) => {
                let jacobian = jacobian(x)?;
                Ok(jacobian.into_representation(self.representation))
            }
            None => derivative::jacobian(self, x, Policy::Simple, Step::default()),
        }
    }
}
