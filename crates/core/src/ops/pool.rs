use tracing::trace;

use crate::function::{Function, FunctionClass, FunctionError, SharedFunction};
use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Representation, Vector};

use super::{Concatenate, require_differentiable, same_input};

/// Functions sharing one expensive computation.
///
/// The engine runs first at every request and is expected to leave its
/// results where the pooled functions can read them; its own output is
/// discarded. Before a Jacobian or gradient the engine's Jacobian is
/// requested instead, so it can prepare derivative data. The pooled outputs
/// are stacked in order.
///
/// A pool is at most Differentiable.
pub struct Pool {
    engine: SharedFunction,
    functions: Concatenate,
    class: FunctionClass,
    name: String,
}

impl Pool {
    /// Pools `functions` behind `engine`.
    ///
    /// # Errors
    ///
    /// Returns an error if `functions` is empty or any input size differs from
    /// the engine's.
    pub fn new(
        engine: SharedFunction,
        functions: Vec<SharedFunction>,
        name: impl Into<String>,
    ) -> Result<Self, FunctionError> {
        for function in &functions {
            same_input("pool", &*engine, &**function)?;
        }
        let functions = Concatenate::new(functions)?;
        let class = engine
            .class()
            .meet(functions.class())
            .meet(FunctionClass::Differentiable);
        let name = name.into();
        Ok(Self {
            name: if name.is_empty() { "function pool".to_owned() } else { name },
            engine,
            functions,
            class,
        })
    }

    #[must_use]
    pub fn engine(&self) -> &SharedFunction {
        &self.engine
    }
}

impl Function for Pool {
    fn input_size(&self) -> usize {
        self.engine.input_size()
    }

    fn output_size(&self) -> usize {
        self.functions.output_size()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> FunctionClass {
        self.class
    }

    fn representation(&self) -> Representation {
        self.functions.representation()
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        trace!(pool = %self.name, engine = self.engine.name(), "running engine");
        self.engine.call(x)?;
        self.functions.call(x)
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        require_differentiable(&self.name, self.class)?;
        trace!(pool = %self.name, engine = self.engine.name(), "running engine jacobian");
        self.engine.jacobian(x)?;
        self.functions.jacobian(x)
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        require_differentiable(&self.name, self.class)?;
        self.engine.jacobian(x)?;
        self.functions.gradient(x, component)
    }

    fn hessian(&self, _x: &Vector, _component: usize) -> Result<DenseMatrix, FunctionError> {
        Err(FunctionError::not_differentiable(&self.name))
    }
}
