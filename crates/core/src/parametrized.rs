//! Families of functions indexed by a parameter vector.
//!
//! A [`ParametrizedFunction`] maps a parameter `p` to a function `f_p`. The
//! common case, fixing the leading arguments of a function of `(p, x)`, is
//! provided by [`Parametrized`].

use std::fmt;
use std::sync::Arc;

use crate::function::{Function, FunctionError, SharedFunction, display_name};
use crate::ops::Bind;
use crate::repr::Vector;

/// A mapping from a parameter vector to a function.
pub trait ParametrizedFunction: Send + Sync {
    /// Size of the parameter vector.
    fn parameter_size(&self) -> usize;

    /// Input size of every produced function.
    fn function_input_size(&self) -> usize;

    /// Output size of every produced function.
    fn function_output_size(&self) -> usize;

    fn name(&self) -> &str;

    /// Builds the function selected by `parameter`.
    ///
    /// # Errors
    ///
    /// Returns an error if `parameter` has the wrong size or the function
    /// cannot be built.
    fn instantiate(&self, parameter: &Vector) -> Result<SharedFunction, FunctionError>;
}

/// A function of `(p, x)` read as a family of functions of `x`.
///
/// Instantiating with `p` binds the first `parameter_size` arguments, so
/// evaluating the result at `x` evaluates the original at `(p, x)`.
#[derive(Clone)]
pub struct Parametrized {
    function: SharedFunction,
    parameter_size: usize,
    name: String,
}

impl Parametrized {
    /// Splits the arguments of `function` into a leading parameter of
    /// `parameter_size` entries and the free rest.
    ///
    /// # Errors
    ///
    /// Returns an error if `parameter_size` exceeds the function's input.
    pub fn new(function: SharedFunction, parameter_size: usize) -> Result<Self, FunctionError> {
        if parameter_size > function.input_size() {
            return Err(FunctionError::mismatch(
                "parameter",
                function.input_size(),
                parameter_size,
            ));
        }
        Ok(Self {
            name: format!("parametrized({})", display_name(&*function, "f")),
            function,
            parameter_size,
        })
    }

    #[must_use]
    pub fn function(&self) -> &SharedFunction {
        &self.function
    }
}

impl ParametrizedFunction for Parametrized {
    fn parameter_size(&self) -> usize {
        self.parameter_size
    }

    fn function_input_size(&self) -> usize {
        self.function.input_size() - self.parameter_size
    }

    fn function_output_size(&self) -> usize {
        self.function.output_size()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn instantiate(&self, parameter: &Vector) -> Result<SharedFunction, FunctionError> {
        if parameter.len() != self.parameter_size {
            return Err(FunctionError::ArgumentSize {
                name: self.name.clone(),
                expected: self.parameter_size,
                actual: parameter.len(),
            });
        }
        let values = parameter
            .iter()
            .map(|p| Some(*p))
            .chain(std::iter::repeat_n(None, self.function_input_size()))
            .collect();
        Ok(Arc::new(Bind::new(self.function.clone(), values)?))
    }
}

impl fmt::Debug for Parametrized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parametrized")
            .field("name", &self.name)
            .field("parameter_size", &self.parameter_size)
            .finish()
    }
}
