//! Per-iteration callbacks.
//!
//! A solver publishes a [`SolverState`] after each iteration. Callbacks may
//! inspect it and return [`Action::StopEarly`] to ask the solver to stop at
//! its next iteration boundary.
//!
//! A failing callback does not abort the solve: its [`CallbackError`] becomes
//! a [`SolverWarning`](crate::SolverWarning) on the eventual solution.

mod multiplexer;
mod wrapper;

pub use multiplexer::{Dispatch, Multiplexer};
pub use wrapper::Wrapper;

use braid_core::Problem;
use thiserror::Error;

use crate::SolverState;

/// Actions a callback can request from the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop iterating and return the current iterate.
    StopEarly,
}

/// A callback failure.
#[derive(Debug, Error)]
#[error("callback `{callback}` failed: {message}")]
pub struct CallbackError {
    callback: String,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CallbackError {
    pub fn new(callback: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            callback: callback.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Wraps a foreign error raised inside a callback.
    pub fn from_source<E>(callback: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            callback: callback.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    #[must_use]
    pub fn callback(&self) -> &str {
        &self.callback
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Receives solver states and decides whether the solve should proceed.
///
/// Returning `Ok(None)` lets the solver continue unchanged.
pub trait Callback: Send {
    fn name(&self) -> &str;

    /// Observes the state published after an iteration.
    ///
    /// # Errors
    ///
    /// Returns a [`CallbackError`] if the callback could not process the
    /// state; the solver records it as a warning and continues.
    fn on_iteration(
        &mut self,
        problem: &Problem,
        state: &SolverState,
    ) -> Result<Option<Action>, CallbackError>;
}

impl<C: Callback + ?Sized> Callback for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn on_iteration(
        &mut self,
        problem: &Problem,
        state: &SolverState,
    ) -> Result<Option<Action>, CallbackError> {
        (**self).on_iteration(problem, state)
    }
}
