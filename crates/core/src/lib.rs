//! Core types for the Braid optimization framework.
//!
//! This crate defines what solvers and observers build on:
//!
//! - [`Function`]: a vector-valued mapping tagged with a [`FunctionClass`]
//!   and a [`Representation`] for its Jacobians
//! - [`ops`]: combinators that compose functions while tracking class and
//!   representation
//! - [`derivative`]: finite-difference derivatives and gradient validation
//! - [`cache`]: LRU memoization of function evaluations
//! - [`parametrized`]: families of functions indexed by a parameter
//! - [`Problem`]: a scalar cost with bounded constraints and arguments
//! - [`ScalingHelper`]: constraint scaling suggested from sampled Jacobians

pub mod cache;
pub mod derivative;
pub mod function;
mod interval;
mod matrix;
pub mod ops;
pub mod parametrized;
mod problem;
mod repr;
mod scaling;

pub use cache::{CacheConfig, CacheConfigError, CachedFunction};
pub use derivative::{FiniteDifference, Policy, Step, StepError};
pub use function::{Function, FunctionClass, FunctionError, FunctionExt, SharedFunction, shared};
pub use interval::{Interval, IntervalError};
pub use matrix::Matrix;
pub use ops::Compose;
pub use problem::{Constraint, ConstraintKind, Problem, ProblemError};
pub use scaling::ScalingHelper;
pub use repr::{DenseMatrix, PROMOTION, Promotion, Representation, SparseMatrix, Vector};
