use braid_core::FunctionError;
use thiserror::Error;

use crate::{CallbackError, SolverState};

/// Errors that end a solve.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The backend gave up, possibly after some iterations.
    #[error("{message}")]
    Failed {
        message: String,
        last_state: Option<Box<SolverState>>,
    },

    /// Raised before the first iteration, so there is no state to keep.
    #[error("problem has no starting point")]
    NoStartingPoint,

    /// Evaluating the problem's functions failed.
    #[error("{source}")]
    Function {
        source: FunctionError,
        last_state: Option<Box<SolverState>>,
    },
}

impl From<FunctionError> for SolverError {
    fn from(source: FunctionError) -> Self {
        Self::Function {
            source,
            last_state: None,
        }
    }
}

impl SolverError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            last_state: None,
        }
    }

    /// A failure that records the state the backend was in when it stopped.
    pub fn failed_at(message: impl Into<String>, state: SolverState) -> Self {
        Self::Failed {
            message: message.into(),
            last_state: Some(Box::new(state)),
        }
    }

    /// An evaluation failure at the state the backend was working on.
    pub fn function_at(source: FunctionError, state: SolverState) -> Self {
        Self::Function {
            source,
            last_state: Some(Box::new(state)),
        }
    }

    /// The last state the backend held before the failure, if it kept it.
    #[must_use]
    pub fn last_state(&self) -> Option<&SolverState> {
        match self {
            Self::Failed { last_state, .. } | Self::Function { last_state, .. } => {
                last_state.as_deref()
            }
            Self::NoStartingPoint => None,
        }
    }
}

/// Non-fatal issues attached to an otherwise successful solution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolverWarning {
    /// A callback failed; the solve went on without it.
    #[error("callback `{callback}` failed at iteration {iteration}: {message}")]
    Callback {
        callback: String,
        iteration: usize,
        message: String,
    },

    /// A backend-specific warning.
    #[error("{0}")]
    Backend(String),
}

impl SolverWarning {
    pub(crate) fn from_callback(error: &CallbackError, iteration: usize) -> Self {
        Self::Callback {
            callback: error.callback().to_owned(),
            iteration,
            message: error.message().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use braid_core::{Problem, function::Identity, function::SumOfSquares, shared};

    #[test]
    fn failure_keeps_last_state() {
        let problem =
            Problem::new(shared(SumOfSquares::new(shared(Identity::new(2))).unwrap())).unwrap();
        let mut state = SolverState::new(&problem);
        state.cost = Some(42.0);

        let error = SolverError::failed_at("diverged", state);
        assert_eq!(error.to_string(), "diverged");
        assert_eq!(error.last_state().and_then(|s| s.cost), Some(42.0));
        assert!(SolverError::failed("no luck").last_state().is_none());
        assert!(SolverError::NoStartingPoint.last_state().is_none());
    }

    fn mismatch() -> FunctionError {
        FunctionError::DimensionMismatch {
            context: "argument".into(),
            expected: 2,
            actual: 3,
        }
    }

    #[test]
    fn evaluation_failure_keeps_its_state() {
        let problem =
            Problem::new(shared(SumOfSquares::new(shared(Identity::new(2))).unwrap())).unwrap();
        let mut state = SolverState::new(&problem);
        state.iteration = 7;

        let error = SolverError::function_at(mismatch(), state);
        assert_eq!(error.last_state().map(|s| s.iteration), Some(7));
        assert!(std::error::Error::source(&error).is_some());

        let bare = SolverError::from(mismatch());
        assert!(bare.last_state().is_none());
        assert_eq!(bare.to_string(), error.to_string());
    }

    #[test]
    fn callback_warning_names_the_callback() {
        let error = CallbackError::new("logger", "disk full");
        let warning = SolverWarning::from_callback(&error, 3);

        assert_eq!(
            warning.to_string(),
            "callback `logger` failed at iteration 3: disk full"
        );
    }
}
