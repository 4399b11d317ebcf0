use std::fmt;

use braid_core::Problem;

use crate::SolverState;

use super::{Action, Callback, CallbackError};

/// Adapts a closure into a [`Callback`].
///
/// The closure cannot fail; implement [`Callback`] directly for fallible
/// callbacks.
pub struct Wrapper<F> {
    name: String,
    function: F,
}

impl<F> Wrapper<F>
where
    F: FnMut(&Problem, &SolverState) -> Option<Action> + Send,
{
    pub fn new(name: impl Into<String>, function: F) -> Self {
        Self {
            name: name.into(),
            function,
        }
    }
}

impl<F> Callback for Wrapper<F>
where
    F: FnMut(&Problem, &SolverState) -> Option<Action> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_iteration(
        &mut self,
        problem: &Problem,
        state: &SolverState,
    ) -> Result<Option<Action>, CallbackError> {
        Ok((self.function)(problem, state))
    }
}

impl<F> fmt::Debug for Wrapper<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper").field("name", &self.name).finish()
    }
}
