use std::fmt;

use braid_core::Vector;

use crate::SolverWarning;

/// Where a solver is in its lifecycle.
///
/// A solver starts `Created`, is `Running` while [`Solver::solve`] executes,
/// and ends in one of the three terminal states.
///
/// [`Solver::solve`]: crate::Solver::solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Created,
    Running,

    /// Solved without warnings.
    Succeeded,

    /// The solve ended with a [`SolverError`](crate::SolverError).
    Failed,

    /// Solved, but the solution carries warnings.
    Warning,
}

impl Status {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Warning)
    }
}

/// The outcome of a successful solve.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// The point the solver returned.
    pub x: Vector,

    /// Cost at `x`.
    pub value: f64,

    /// Stacked constraint values at `x`.
    pub constraints: Vector,

    /// Lagrange multipliers, laid out as one entry per argument bound
    /// followed by one entry per constraint row.
    pub lambda: Option<Vector>,

    /// Number of iterations performed.
    pub iterations: usize,

    /// Non-fatal issues raised during the solve.
    pub warnings: Vec<SolverWarning>,
}

impl Solution {
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Result:")?;
        writeln!(f, "  x: {}", self.x)?;
        writeln!(f, "  Value: {}", self.value)?;
        if !self.constraints.is_empty() {
            writeln!(f, "  Constraints values: {}", self.constraints)?;
        }
        if let Some(lambda) = &self.lambda {
            writeln!(f, "  Lambda: {lambda}")?;
        }
        writeln!(f, "  Iterations: {}", self.iterations)?;
        for warning in &self.warnings {
            writeln!(f, "  Warning: {warning}")?;
        }
        Ok(())
    }
}
