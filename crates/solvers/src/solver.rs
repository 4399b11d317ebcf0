use std::sync::Arc;

use braid_core::Problem;
use tracing::{debug, warn};

use crate::callback::{Action, Callback, Multiplexer};
use crate::{Parameters, Solution, SolverError, SolverState, SolverWarning, Status};

/// An optimization backend bound to a problem.
///
/// Backends implement the iteration loop; the shared lifecycle (status
/// transitions, callback dispatch, warnings) is usually delegated to a
/// [`SolverBase`].
pub trait Solver: Send {
    fn name(&self) -> &str;

    fn problem(&self) -> &Problem;

    fn parameters(&self) -> &Parameters;

    fn parameters_mut(&mut self) -> &mut Parameters;

    fn status(&self) -> Status;

    /// Registers a callback invoked after every iteration.
    fn add_callback(&mut self, callback: Box<dyn Callback>);

    /// Runs the backend to completion.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] if the backend fails. Callback failures are
    /// not errors; they appear as warnings on the solution.
    fn solve(&mut self) -> Result<Solution, SolverError>;
}

/// State shared by every backend: its problem, parameters, callbacks and
/// lifecycle.
///
/// A backend's `solve` calls [`SolverBase::begin`], publishes a state after
/// each iteration with [`SolverBase::publish`], and hands its outcome to
/// [`SolverBase::finish`].
#[derive(Debug)]
pub struct SolverBase {
    name: String,
    problem: Arc<Problem>,
    parameters: Parameters,
    callbacks: Multiplexer,
    status: Status,
    warnings: Vec<SolverWarning>,
}

impl SolverBase {
    pub fn new(name: impl Into<String>, problem: Arc<Problem>) -> Self {
        Self {
            name: name.into(),
            problem,
            parameters: Parameters::new(),
            callbacks: Multiplexer::new(),
            status: Status::Created,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// A shared handle to the problem, for use while `self` is borrowed mutably.
    #[must_use]
    pub fn shared_problem(&self) -> Arc<Problem> {
        Arc::clone(&self.problem)
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn add_callback(&mut self, callback: Box<dyn Callback>) {
        debug!(solver = %self.name, callback = callback.name(), "registered callback");
        self.callbacks.push(callback);
    }

    /// Enters [`Status::Running`], discarding warnings from a previous solve.
    pub fn begin(&mut self) {
        debug!(solver = %self.name, from = ?self.status, "solve started");
        self.status = Status::Running;
        self.warnings.clear();
    }

    /// A fresh state at the problem's starting point, carrying a copy of the
    /// solver's parameters.
    #[must_use]
    pub fn state(&self) -> SolverState {
        let mut state = SolverState::new(&self.problem);
        state.parameters = self.parameters.clone();
        state
    }

    /// Publishes `state` to every callback.
    ///
    /// Callback failures are logged and kept as warnings. Returns
    /// `Some(StopEarly)` if any callback asked to stop; the backend must end
    /// its loop after the current iteration.
    #[must_use = "a callback may have asked the solver to stop"]
    pub fn publish(&mut self, state: &SolverState) -> Option<Action> {
        let dispatch = self.callbacks.dispatch(&self.problem, state);
        for error in &dispatch.errors {
            warn!(
                solver = %self.name,
                iteration = state.iteration,
                %error,
                "callback failed, continuing"
            );
            self.warnings
                .push(SolverWarning::from_callback(error, state.iteration));
        }
        if dispatch.action.is_some() {
            debug!(solver = %self.name, iteration = state.iteration, "callback requested stop");
        }
        dispatch.action
    }

    /// Records a backend warning to attach to the solution.
    pub fn warn(&mut self, warning: SolverWarning) {
        warn!(solver = %self.name, %warning, "solver warning");
        self.warnings.push(warning);
    }

    /// Settles the terminal status and attaches collected warnings.
    ///
    /// # Errors
    ///
    /// Returns `outcome`'s error unchanged.
    pub fn finish(
        &mut self,
        outcome: Result<Solution, SolverError>,
    ) -> Result<Solution, SolverError> {
        match outcome {
            Ok(mut solution) => {
                solution.warnings.append(&mut self.warnings);
                self.status = if solution.has_warnings() {
                    Status::Warning
                } else {
                    Status::Succeeded
                };
                debug!(
                    solver = %self.name,
                    status = ?self.status,
                    iterations = solution.iterations,
                    "solve finished"
                );
                Ok(solution)
            }
            Err(error) => {
                self.status = Status::Failed;
                debug!(solver = %self.name, %error, "solve failed");
                Err(error)
            }
        }
    }
}
