use std::fmt;

use braid_core::Problem;

use crate::SolverState;

use super::{Action, Callback, CallbackError};

/// The combined outcome of fanning a state out to several callbacks.
#[derive(Debug, Default)]
pub struct Dispatch {
    /// `Some(StopEarly)` if any callback asked to stop.
    pub action: Option<Action>,

    /// Failures, in registration order.
    pub errors: Vec<CallbackError>,
}

/// Fans each state out to a list of callbacks, in registration order.
///
/// Every callback sees every state: a failure or a stop request from one
/// callback does not hide the state from the ones registered after it.
#[derive(Default)]
pub struct Multiplexer {
    callbacks: Vec<Box<dyn Callback>>,
}

impl Multiplexer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, callback: Box<dyn Callback>) {
        self.callbacks.push(callback);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.callbacks.iter().map(|c| c.name())
    }

    pub fn dispatch(&mut self, problem: &Problem, state: &SolverState) -> Dispatch {
        let mut outcome = Dispatch::default();
        for callback in &mut self.callbacks {
            match callback.on_iteration(problem, state) {
                Ok(Some(Action::StopEarly)) => outcome.action = Some(Action::StopEarly),
                Ok(None) => {}
                Err(error) => outcome.errors.push(error),
            }
        }
        outcome
    }
}

impl Callback for Multiplexer {
    fn name(&self) -> &str {
        "multiplexer"
    }

    /// Dispatches to every callback.
    ///
    /// Failures take precedence over a stop request, since a single result
    /// cannot carry both.
    fn on_iteration(
        &mut self,
        problem: &Problem,
        state: &SolverState,
    ) -> Result<Option<Action>, CallbackError> {
        let Dispatch { action, errors } = self.dispatch(problem, state);
        if errors.is_empty() {
            return Ok(action);
        }
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(CallbackError::new(self.name(), message))
    }
}

impl fmt::Debug for Multiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
