//! Backends that do not optimize, for testing the solver plumbing.

use std::sync::Arc;

use braid_core::{Function, FunctionError, Problem, Vector};
use ndarray::array;
use tracing::debug;

use crate::callback::{Action, Callback};
use crate::{Parameters, Solution, Solver, SolverBase, SolverError, SolverState, Status};

fn declare_dummy_parameters(parameters: &mut Parameters) {
    parameters.declare("dummy-parameter", "dummy parameter", 42.0);
    parameters.declare("dummy-parameter2", "yet another dummy parameter", 3);
    parameters.declare("dummy-parameter3", "just a dummy key", "...and a dummy value!");
    parameters.declare("dummy-parameter4", "dummy vector", array![1.0, 2.0, 3.0, 4.0]);
    parameters.declare("dummy-parameter5", "dummy boolean", false);
}

/// Returns the starting point unchanged after a single iteration.
#[derive(Debug)]
pub struct DummySolver {
    base: SolverBase,
}

impl DummySolver {
    pub const NAME: &'static str = "dummy";

    #[must_use]
    pub fn new(problem: Arc<Problem>) -> Self {
        let mut base = SolverBase::new(Self::NAME, problem);
        declare_dummy_parameters(base.parameters_mut());
        Self { base }
    }

    fn run(&mut self) -> Result<Solution, SolverError> {
        let problem = self.base.shared_problem();
        let x = problem
            .starting_point()
            .cloned()
            .ok_or(SolverError::NoStartingPoint)?;

        let mut state = self.base.state();
        let (value, constraints) = match evaluate(&problem, &mut state) {
            Ok(evaluated) => evaluated,
            Err(error) => return Err(SolverError::function_at(error, state)),
        };
        if self.base.publish(&state) == Some(Action::StopEarly) {
            debug!(solver = Self::NAME, "stop requested on the only iteration");
        }

        Ok(Solution {
            x,
            value,
            constraints,
            lambda: None,
            iterations: 1,
            warnings: Vec::new(),
        })
    }
}

/// Fills the cost, constraints and violation of `state` at its iterate.
fn evaluate(problem: &Problem, state: &mut SolverState) -> Result<(f64, Vector), FunctionError> {
    let value = problem.cost().call(&state.x)?[0];
    let constraints = problem.constraint_values(&state.x)?;
    state.cost = Some(value);
    state.constraint_violation = Some(problem.constraint_violation(&state.x)?);
    state.constraints = Some(constraints.clone());
    Ok((value, constraints))
}

/// Publishes the starting point once per iteration until a callback stops
/// it or `max-iterations` is reached.
///
/// The iterate never moves, so the solution is the starting point; the
/// iteration count shows where the loop ended.
#[derive(Debug)]
pub struct DummyIterationsSolver {
    base: SolverBase,
}

impl DummyIterationsSolver {
    pub const NAME: &'static str = "dummy-iterations";

    /// Iterations run when no callback stops the loop.
    pub const DEFAULT_MAX_ITERATIONS: i64 = 10;

    #[must_use]
    pub fn new(problem: Arc<Problem>) -> Self {
        let mut base = SolverBase::new(Self::NAME, problem);
        base.parameters_mut().declare(
            "max-iterations",
            "number of iterations without early stop",
            Self::DEFAULT_MAX_ITERATIONS,
        );
        Self { base }
    }

    fn run(&mut self) -> Result<Solution, SolverError> {
        let problem = self.base.shared_problem();
        if problem.starting_point().is_none() {
            return Err(SolverError::NoStartingPoint);
        }
        let max_iterations = self
            .base
            .parameters()
            .get::<i64>("max-iterations")
            .map_err(|error| SolverError::failed(error.to_string()))?;
        let max_iterations = usize::try_from(max_iterations).unwrap_or(0);

        let mut state = self.base.state();
        let (mut value, mut constraints) = (f64::NAN, Vector::zeros(0));
        let mut iterations = 0;
        while iterations < max_iterations {
            state.iteration = iterations;
            (value, constraints) = match evaluate(&problem, &mut state) {
                Ok(evaluated) => evaluated,
                Err(error) => return Err(SolverError::function_at(error, state)),
            };
            iterations += 1;
            if self.base.publish(&state) == Some(Action::StopEarly) {
                debug!(solver = Self::NAME, iteration = state.iteration, "stopping early");
                break;
            }
        }
        if iterations == 0 {
            return Err(SolverError::failed_at("no iteration was allowed", state));
        }

        Ok(Solution {
            x: state.x,
            value,
            constraints,
            lambda: None,
            iterations,
            warnings: Vec::new(),
        })
    }
}

/// Always fails, after publishing a made-up state to its callbacks.
///
/// The error carries that state, which makes this backend useful for testing
/// failure reporting and loggers.
#[derive(Debug)]
pub struct DummyLastStateSolver {
    base: SolverBase,
}

impl DummyLastStateSolver {
    pub const NAME: &'static str = "dummy-laststate";

    #[must_use]
    pub fn new(problem: Arc<Problem>) -> Self {
        let mut base = SolverBase::new(Self::NAME, problem);
        declare_dummy_parameters(base.parameters_mut());
        Self { base }
    }

    fn run(&mut self) -> Result<Solution, SolverError> {
        let problem = self.base.shared_problem();

        let mut state = self.base.state();
        state.x = Vector::from_elem(problem.input_size(), 1337.0);
        state.cost = Some(42.0);
        state.constraints = Some(Vector::zeros(problem.constraints_output_size()));
        state.constraint_violation = Some(42.0);
        // Failing is the outcome either way.
        let _ = self.base.publish(&state);

        Err(SolverError::failed_at("the dummy solver always fails", state))
    }
}

macro_rules! delegate_to_base {
    ($solver:ty) => {
        impl Solver for $solver {
            fn name(&self) -> &str {
                self.base.name()
            }

            fn problem(&self) -> &Problem {
                self.base.problem()
            }

            fn parameters(&self) -> &Parameters {
                self.base.parameters()
            }

            fn parameters_mut(&mut self) -> &mut Parameters {
                self.base.parameters_mut()
            }

            fn status(&self) -> Status {
                self.base.status()
            }

            fn add_callback(&mut self, callback: Box<dyn Callback>) {
                self.base.add_callback(callback);
            }

            fn solve(&mut self) -> Result<Solution, SolverError> {
                self.base.begin();
                let outcome = self.run();
                self.base.finish(outcome)
            }
        }
    };
}

delegate_to_base!(DummySolver);
delegate_to_base!(DummyLastStateSolver);
delegate_to_base!(DummyIterationsSolver);

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use braid_core::function::{FnFunction, Identity, SumOfSquares};
    use braid_core::{FunctionClass, Interval, shared};

    use crate::callback::Wrapper;

    fn problem(start: Option<Vector>) -> Arc<Problem> {
        let cost = shared(SumOfSquares::new(shared(Identity::new(2))).unwrap());
        let mut problem = Problem::new(cost).unwrap();
        problem
            .add_constraint(
                shared(Identity::new(2)),
                vec![Interval::at_least(0.0).unwrap(); 2],
                None,
            )
            .unwrap();
        if let Some(x) = start {
            problem.set_starting_point(x).unwrap();
        }
        Arc::new(problem)
    }

    #[test]
    fn dummy_returns_the_starting_point() {
        let mut solver = DummySolver::new(problem(Some(array![3.0, -4.0])));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        solver.add_callback(Box::new(Wrapper::new("record", move |_: &Problem, s: &SolverState| {
            log.lock().unwrap().push(s.cost);
            None::<Action>
        })));

        let solution = solver.solve().unwrap();
        assert_eq!(solution.x, array![3.0, -4.0]);
        assert_eq!(solution.value, 25.0);
        assert_eq!(solution.constraints, array![3.0, -4.0]);
        assert_eq!(solution.iterations, 1);
        assert_eq!(solver.status(), Status::Succeeded);
        assert_eq!(*seen.lock().unwrap(), [Some(25.0)]);
    }

    #[test]
    fn dummy_needs_a_starting_point() {
        let mut solver = DummySolver::new(problem(None));
        assert!(matches!(solver.solve(), Err(SolverError::NoStartingPoint)));
        assert_eq!(solver.status(), Status::Failed);
    }

    #[test]
    fn dummy_declares_its_parameters() {
        let solver = DummySolver::new(problem(None));
        let parameters = solver.parameters();

        assert_eq!(parameters.len(), 5);
        assert_eq!(parameters.get::<f64>("dummy-parameter"), Ok(42.0));
        assert_eq!(parameters.get::<i64>("dummy-parameter2"), Ok(3));
        assert_eq!(
            parameters.get::<&str>("dummy-parameter3"),
            Ok("...and a dummy value!")
        );
        assert_eq!(solver.name(), "dummy");
        assert_eq!(solver.status(), Status::Created);
    }

    #[test]
    fn last_state_solver_fails_with_its_state() {
        let mut solver = DummyLastStateSolver::new(problem(Some(array![0.0, 0.0])));
        let err = solver.solve().unwrap_err();

        let state = err.last_state().unwrap();
        assert_eq!(state.x, array![1337.0, 1337.0]);
        assert_eq!(state.cost, Some(42.0));
        assert_eq!(state.constraint_violation, Some(42.0));
        assert_eq!(solver.status(), Status::Failed);
    }

    #[test]
    fn published_states_carry_the_parameters() {
        let mut solver = DummySolver::new(problem(Some(array![1.0, 1.0])));
        let seen = Arc::new(Mutex::new(None));
        let log = Arc::clone(&seen);
        solver.add_callback(Box::new(Wrapper::new(
            "record",
            move |_: &Problem, s: &SolverState| {
                *log.lock().unwrap() = s.parameters.get::<bool>("dummy-parameter5").ok();
                None::<Action>
            },
        )));

        solver.solve().unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(false));
    }

    #[test]
    fn evaluation_failures_keep_the_state() {
        let bad = FnFunction::new("broken", 2, 1, FunctionClass::Plain, |_: &Vector| {
            Err(FunctionError::Evaluation {
                name: "broken".into(),
                source: "no value here".into(),
            })
        });
        let mut problem = Problem::new(shared(bad)).unwrap();
        problem.set_starting_point(array![0.5, 0.5]).unwrap();
        let mut solver = DummySolver::new(Arc::new(problem));

        let error = solver.solve().unwrap_err();
        assert!(matches!(error, SolverError::Function { .. }));
        assert_eq!(error.last_state().map(|s| s.x.clone()), Some(array![0.5, 0.5]));
        assert_eq!(solver.status(), Status::Failed);
    }

    #[test]
    fn iterations_stop_when_a_callback_asks() {
        let mut solver = DummyIterationsSolver::new(problem(Some(array![1.0, 2.0])));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        solver.add_callback(Box::new(Wrapper::new(
            "stop at 3",
            move |_: &Problem, s: &SolverState| {
                log.lock().unwrap().push(s.iteration);
                (s.iteration == 3).then_some(Action::StopEarly)
            },
        )));

        let solution = solver.solve().unwrap();
        assert_eq!(solution.iterations, 4);
        assert_eq!(*seen.lock().unwrap(), [0, 1, 2, 3]);
        assert_eq!(solution.x, array![1.0, 2.0]);
        assert_eq!(solution.value, 5.0);
        assert_eq!(solver.status(), Status::Succeeded);
    }

    #[test]
    fn iterations_run_to_the_parameter_without_a_stop() {
        let mut solver = DummyIterationsSolver::new(problem(Some(array![0.0, 0.0])));
        solver.parameters_mut().set("max-iterations", 6).unwrap();
        assert_eq!(solver.solve().unwrap().iterations, 6);

        solver.parameters_mut().set("max-iterations", 0).unwrap();
        let error = solver.solve().unwrap_err();
        assert_eq!(error.last_state().map(|s| s.iteration), Some(0));
    }
}
