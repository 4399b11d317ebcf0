use braid_core::Problem;
use braid_solvers::{Action, Callback, CallbackError, SolverState};
use tracing::debug;

/// Stops a solve once a number of iterations has completed.
///
/// Iteration `i` is the `i + 1`-th iteration, so a limit of `n` stops the
/// solver after the state with iteration `n - 1`. A limit of zero stops at
/// the first state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationLimit {
    max_iterations: usize,
}

impl IterationLimit {
    pub const NAME: &'static str = "iteration limit";

    #[must_use]
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    #[must_use]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

impl Callback for IterationLimit {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_iteration(
        &mut self,
        _problem: &Problem,
        state: &SolverState,
    ) -> Result<Option<Action>, CallbackError> {
        if state.iteration + 1 >= self.max_iterations {
            debug!(
                iteration = state.iteration,
                limit = self.max_iterations,
                "iteration limit reached"
            );
            return Ok(Some(Action::StopEarly));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use braid_core::function::Identity;
    use braid_core::function::SumOfSquares;
    use braid_core::shared;

    use super::*;

    #[test]
    fn stops_once_the_limit_is_reached() {
        let cost = SumOfSquares::new(shared(Identity::new(1))).unwrap();
        let problem = Problem::new(shared(cost)).unwrap();
        let mut state = SolverState::new(&problem);
        let mut limit = IterationLimit::new(3);

        let actions: Vec<_> = (0..4)
            .map(|iteration| {
                state.iteration = iteration;
                limit.on_iteration(&problem, &state).unwrap()
            })
            .collect();

        assert_eq!(
            actions,
            [None, None, Some(Action::StopEarly), Some(Action::StopEarly)]
        );
        assert_eq!(
            IterationLimit::new(0).on_iteration(&problem, &state).unwrap(),
            Some(Action::StopEarly)
        );
    }
}
