use thiserror::Error;

use crate::derivative::StepError;

/// Errors raised while building or evaluating functions.
#[derive(Debug, Error)]
pub enum FunctionError {
    /// Operands or parameters have incompatible sizes at construction.
    #[error("{context}: expected size {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// The argument passed to a function has the wrong size.
    #[error("argument of `{name}` has size {actual}, expected {expected}")]
    ArgumentSize {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("`{name}` is not differentiable")]
    NotDifferentiable { name: String },

    #[error("`{name}` does not provide derivatives of order {order}")]
    UnsupportedOrder { name: String, order: u32 },

    #[error("component {index} is out of range for `{name}` with {size} outputs")]
    ComponentOutOfRange {
        name: String,
        index: usize,
        size: usize,
    },

    /// The argument lies outside the set where the function is defined.
    #[error("`{name}` is not defined at {value}")]
    OutOfDomain { name: String, value: f64 },

    /// A construction argument is structurally invalid.
    #[error("invalid {what}: {reason}")]
    Invalid { what: &'static str, reason: String },

    /// Finite-difference probing produced non-finite values.
    #[error("probing `{name}` produced {count} non-finite values")]
    NonFiniteProbe { name: String, count: usize },

    #[error(transparent)]
    Step(#[from] StepError),

    /// A user-supplied evaluation failed.
    #[error("evaluation of `{name}` failed")]
    Evaluation {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FunctionError {
    pub(crate) fn mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    pub(crate) fn not_differentiable(name: &str) -> Self {
        Self::NotDifferentiable {
            name: name.to_owned(),
        }
    }
}
