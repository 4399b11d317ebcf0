//! Backend-neutral solver contract for Braid.
//!
//! A [`Solver`] is bound to a [`Problem`](braid_core::Problem) and runs an
//! opaque iteration loop. After each iteration it publishes a
//! [`SolverState`] to its [`Callback`]s, which may ask it to stop early.
//!
//! - [`SolverFactory`] resolves backends by name
//! - [`Parameters`] hold typed, named backend settings
//! - [`ResultAnalyzer`] checks KKT, LICQ and null gradients at a solution
//!
//! # Errors and warnings
//!
//! A solve either returns a [`Solution`] or a [`SolverError`]. Issues that do
//! not end the solve, such as a failing callback, are attached to the
//! solution as [`SolverWarning`]s. Resolving an unknown backend name is a
//! separate [`FactoryError`].

pub mod analyzer;
pub mod callback;
pub mod dummy;
mod error;
mod factory;
mod parameters;
mod solution;
mod solver;
mod state;

pub use analyzer::{AnalyzerConfig, AnalyzerConfigError, AnalyzerError, ResultAnalyzer};
pub use callback::{Action, Callback, CallbackError, Multiplexer, Wrapper};
pub use error::{SolverError, SolverWarning};
pub use factory::{FactoryError, SolverConstructor, SolverFactory};
pub use parameters::{
    FromParameter, Parameter, ParameterError, ParameterKind, ParameterValue, Parameters,
};
pub use solution::{Solution, Status};
pub use solver::{Solver, SolverBase};
pub use state::SolverState;
