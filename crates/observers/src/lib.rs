//! Reusable solver callbacks for Braid.
//!
//! These [`Callback`](braid_solvers::Callback)s work with any backend built
//! on the solver contract:
//!
//! - [`OptimizationLogger`] records a chosen set of [`LogFacets`] at every
//!   iteration to a [`LogSink`]
//! - [`IterationLimit`] asks the solver to stop after a number of iterations
//!
//! Two sinks are provided. [`MemorySink`] keeps records in memory for
//! inspection, and [`JsonLinesSink`] writes a `journal.jsonl` file with one
//! JSON object per line.

mod facets;
mod limit;
mod logger;
mod record;
mod sink;

pub use facets::LogFacets;
pub use limit::IterationLimit;
pub use logger::OptimizationLogger;
pub use record::{ConstraintRecord, IterationRecord, SessionHeader, SessionSummary};
pub use sink::{JOURNAL, JsonLinesSink, LogSink, MemorySink, SinkError};
