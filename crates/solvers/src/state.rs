use std::fmt;

use braid_core::{Problem, Vector};

use crate::Parameters;

/// A snapshot of a solver published to callbacks after each iteration.
///
/// Only `iteration` and `x` are always meaningful; backends fill the other
/// fields when they have the information at hand.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverState {
    /// Zero-based iteration counter.
    pub iteration: usize,

    /// The current iterate.
    pub x: Vector,

    /// Cost at `x`.
    pub cost: Option<f64>,

    /// Stacked constraint values at `x`.
    pub constraints: Option<Vector>,

    /// Largest distance of a constraint value to its bounds.
    pub constraint_violation: Option<f64>,

    /// The solver's parameters when the state was taken, plus any
    /// backend-internal quantities such as step sizes.
    ///
    /// States built with [`SolverBase::state`](crate::SolverBase::state) start
    /// from a copy of the solver's table.
    pub parameters: Parameters,
}

impl SolverState {
    /// Creates the state of a solver that has not iterated yet.
    ///
    /// The iterate starts at the problem's starting point, or at the origin
    /// if there is none.
    #[must_use]
    pub fn new(problem: &Problem) -> Self {
        let x = problem
            .starting_point()
            .cloned()
            .unwrap_or_else(|| Vector::zeros(problem.input_size()));
        Self {
            iteration: 0,
            x,
            cost: None,
            constraints: None,
            constraint_violation: None,
            parameters: Parameters::new(),
        }
    }
}

impl fmt::Display for SolverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solver state (iteration {}):", self.iteration)?;
        writeln!(f, "  x: {}", self.x)?;
        if let Some(cost) = self.cost {
            writeln!(f, "  Cost: {cost}")?;
        }
        if let Some(violation) = self.constraint_violation {
            writeln!(f, "  Constraint violation: {violation}")?;
        }
        for (key, parameter) in self.parameters.iter() {
            writeln!(f, "  {key}: {}", parameter.value)?;
        }
        Ok(())
    }
}
