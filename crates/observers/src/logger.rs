use std::time::Instant;

use braid_core::{Function, FunctionError, Problem};
use braid_solvers::{Action, Callback, CallbackError, SolverState};
use jiff::Timestamp;
use tracing::{trace, warn};

use crate::facets::LogFacets;
use crate::record::{ConstraintRecord, IterationRecord, SessionHeader, SessionSummary};
use crate::sink::{LogSink, SinkError};

/// A callback that records solver states to a [`LogSink`].
///
/// The session opens with the first published state and closes on
/// [`OptimizationLogger::finish`] or when the logger is dropped. Quantities
/// the solver did not publish, such as constraint values, are evaluated on
/// the problem at the current iterate.
///
/// ```
/// use braid_observers::{LogFacets, MemorySink, OptimizationLogger};
///
/// let journal = MemorySink::new();
/// let logger = OptimizationLogger::new(journal.clone(), LogFacets::COST | LogFacets::X);
/// # drop(logger);
/// ```
#[derive(Debug)]
pub struct OptimizationLogger<S: LogSink> {
    sink: S,
    facets: LogFacets,
    started: Option<Instant>,
    iterations: usize,
    finished: bool,
}

impl<S: LogSink> OptimizationLogger<S> {
    pub const NAME: &'static str = "optimization logger";

    #[must_use]
    pub fn new(sink: S, facets: LogFacets) -> Self {
        Self {
            sink,
            facets,
            started: None,
            iterations: 0,
            finished: false,
        }
    }

    #[must_use]
    pub fn facets(&self) -> LogFacets {
        self.facets
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Number of states recorded so far.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Closes the session.
    ///
    /// Does nothing if no state was recorded or the session is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot store the summary.
    pub fn finish(&mut self) -> Result<(), SinkError> {
        let Some(started) = self.started else {
            return Ok(());
        };
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.sink.finish(&SessionSummary {
            iterations: self.iterations,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        })
    }

    fn begin(&mut self, problem: &Problem) -> Result<Instant, SinkError> {
        if let Some(started) = self.started {
            return Ok(started);
        }
        let header = SessionHeader {
            started_at: Timestamp::now().to_string(),
            problem: problem.to_string(),
            facets: self.facets.names().collect(),
        };
        self.sink.begin(&header)?;
        let started = Instant::now();
        self.started = Some(started);
        Ok(started)
    }

    fn capture(
        &self,
        problem: &Problem,
        state: &SolverState,
        started: Instant,
    ) -> Result<IterationRecord, FunctionError> {
        let facets = self.facets;
        let x = &state.x;
        let mut record = IterationRecord::new(state.iteration);

        if facets.contains(LogFacets::X) {
            record.x = Some(x.to_vec());
        }
        if facets.contains(LogFacets::COST) {
            record.cost = match state.cost {
                Some(cost) => Some(cost),
                None => Some(problem.cost().call(x)?[0]),
            };
        }

        let log_values = facets.contains(LogFacets::CONSTRAINT);
        let log_jacobians = facets.contains(LogFacets::CONSTRAINT_JACOBIAN);
        if log_values || log_jacobians {
            let published = state
                .constraints
                .as_ref()
                .filter(|c| c.len() == problem.constraints_output_size());
            let mut offset = 0;
            for constraint in problem.constraints() {
                let function = constraint.function();
                let size = constraint.output_size();
                let values = if !log_values {
                    None
                } else if let Some(all) = published {
                    Some(all.slice(ndarray::s![offset..offset + size]).to_vec())
                } else {
                    Some(function.call(x)?.to_vec())
                };
                let jacobian = if log_jacobians && function.class().is_differentiable() {
                    let dense = function.jacobian(x)?.to_dense();
                    Some(dense.rows().into_iter().map(|row| row.to_vec()).collect())
                } else {
                    None
                };
                record.constraints.push(ConstraintRecord {
                    name: function.name().to_owned(),
                    values,
                    jacobian,
                });
                offset += size;
            }
        }

        if facets.contains(LogFacets::CONSTRAINT_VIOLATION) && !problem.constraints().is_empty() {
            record.constraint_violation = match state.constraint_violation {
                Some(violation) => Some(violation),
                None => Some(problem.constraint_violation(x)?),
            };
        }
        if facets.contains(LogFacets::SOLVER) {
            record.solver = Some(
                state
                    .parameters
                    .iter()
                    .map(|(key, parameter)| (key.to_owned(), parameter.value.to_string()))
                    .collect(),
            );
        }
        if facets.contains(LogFacets::TIME) {
            record.elapsed_seconds = Some(started.elapsed().as_secs_f64());
        }
        Ok(record)
    }
}

impl<S: LogSink> Callback for OptimizationLogger<S> {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_iteration(
        &mut self,
        problem: &Problem,
        state: &SolverState,
    ) -> Result<Option<Action>, CallbackError> {
        if self.finished {
            return Err(CallbackError::from_source(Self::NAME, SinkError::Finished));
        }
        let started = self
            .begin(problem)
            .map_err(|error| CallbackError::from_source(Self::NAME, error))?;
        let record = self
            .capture(problem, state, started)
            .map_err(|error| CallbackError::from_source(Self::NAME, error))?;
        self.sink
            .record(&record)
            .map_err(|error| CallbackError::from_source(Self::NAME, error))?;
        self.iterations += 1;
        trace!(iteration = state.iteration, "recorded solver state");
        Ok(None)
    }
}

impl<S: LogSink> Drop for OptimizationLogger<S> {
    fn drop(&mut self) {
        if let Err(error) = self.finish() {
            warn!(%error, "failed to close optimization log");
        }
    }
}
