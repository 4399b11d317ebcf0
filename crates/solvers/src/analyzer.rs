//! Optimality diagnostics for a solution.
//!
//! A [`ResultAnalyzer`] answers three independent questions about a candidate
//! point returned by a solver:
//!
//! - [`ResultAnalyzer::kkt`]: is the Lagrangian gradient `∇f(x) + λ_b + Jᵀλ_c`
//!   close to zero?
//! - [`ResultAnalyzer::licq`]: are the gradients of the active bounds and
//!   constraints linearly independent? When they are not, a failed KKT check
//!   is inconclusive.
//! - [`ResultAnalyzer::null_gradient`]: does an active constraint have a zero
//!   gradient, which usually points at a redundant or badly scaled
//!   constraint?
//!
//! Each query is computed on first use and cached.

mod config;
mod rank;


pub use config::{AnalyzerConfig, AnalyzerConfigError};

use std::cell::OnceCell;
use std::fmt;

use braid_core::{DenseMatrix, Function, FunctionError, Matrix, Problem, Vector};
use ndarray::s;
use thiserror::Error;

use crate::Solution;

/// Errors that can occur while analyzing a solution.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("solution point has size {actual}, problem expects {expected}")]
    PointSize { expected: usize, actual: usize },

    #[error(transparent)]
    Function(#[from] FunctionError),
}

/// An active constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveRow {
    /// Index of the constraint in the problem.
    pub constraint: usize,

    /// Output of that constraint.
    pub local: usize,

    /// Row in the stacked constraint Jacobian.
    pub row: usize,
}

/// Bounds and constraint rows that are active at the solution.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSet {
    /// Arguments sitting on one of their bounds.
    pub bounds: Vec<usize>,

    /// Constraint rows sitting on one of their bounds.
    pub rows: Vec<ActiveRow>,

    /// Gradients of the active set: one unit row per active bound, then the
    /// Jacobian row of each active constraint.
    pub jacobian: DenseMatrix,
}

/// Result of the KKT stationarity check.
#[derive(Debug, Clone, PartialEq)]
pub struct KktData {
    /// Gradient of the Lagrangian at the solution.
    pub residual: Vector,

    /// Multipliers provided by the solver, if any.
    pub lambda: Option<Vector>,

    pub tolerance: f64,
}

impl KktData {
    #[must_use]
    pub fn residual_norm(&self) -> f64 {
        self.residual.dot(&self.residual).sqrt()
    }

    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.residual_norm() < self.tolerance
    }
}

/// Result of the linear independence constraint qualification check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LicqData {
    pub rank: usize,
    pub max_rank: usize,
}

impl LicqData {
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.rank == self.max_rank
    }
}

/// An active constraint row whose gradient vanishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullRow {
    pub constraint: usize,
    pub name: String,
    pub local: usize,
}

/// Result of the null gradient check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullGradientData {
    /// Active constraint rows with a vanishing gradient.
    pub rows: Vec<NullRow>,

    /// Arguments on which the cost gradient is exactly zero.
    ///
    /// Reported for inspection only; they do not affect the verdict.
    pub zero_cost_components: Vec<usize>,
}

impl NullGradientData {
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Lazily evaluated optimality queries over a problem and a solution.
pub struct ResultAnalyzer<'a> {
    problem: &'a Problem,
    solution: &'a Solution,
    config: AnalyzerConfig,
    cost_gradient: OnceCell<Vector>,
    jacobian: OnceCell<Matrix>,
    active: OnceCell<ActiveSet>,
    kkt: OnceCell<KktData>,
    licq: OnceCell<LicqData>,
    null_gradient: OnceCell<NullGradientData>,
}

impl<'a> ResultAnalyzer<'a> {
    #[must_use]
    pub fn new(problem: &'a Problem, solution: &'a Solution) -> Self {
        Self::with_config(problem, solution, AnalyzerConfig::default())
    }

    #[must_use]
    pub fn with_config(
        problem: &'a Problem,
        solution: &'a Solution,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            problem,
            solution,
            config,
            cost_gradient: OnceCell::new(),
            jacobian: OnceCell::new(),
            active: OnceCell::new(),
            kkt: OnceCell::new(),
            licq: OnceCell::new(),
            null_gradient: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Checks KKT stationarity.
    ///
    /// Multipliers are read from the solution as `[n bound multipliers,
    /// m constraint multipliers]`; missing entries count as zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the cost or the constraints cannot be
    /// differentiated at the solution.
    pub fn kkt(&self) -> Result<&KktData, AnalyzerError> {
        if let Some(data) = self.kkt.get() {
            return Ok(data);
        }

        let n = self.problem.input_size();
        let m = self.problem.constraints_output_size();
        let mut residual = self.cost_gradient()?.clone();

        if let Some(lambda) = &self.solution.lambda {
            let bounds = lambda.slice(s![..n.min(lambda.len())]);
            residual
                .slice_mut(s![..bounds.len()])
                .zip_mut_with(&bounds, |r, l| *r += l);

            let mut weights = Vector::zeros(m);
            if lambda.len() > n {
                let available = (lambda.len() - n).min(m);
                weights
                    .slice_mut(s![..available])
                    .assign(&lambda.slice(s![n..n + available]));
            }
            if weights.iter().any(|w| *w != 0.0) {
                residual += &self.jacobian()?.transpose_mul_vector(&weights);
            }
        }

        let data = KktData {
            residual,
            lambda: self.solution.lambda.clone(),
            tolerance: self.config.kkt_tolerance(),
        };
        Ok(self.kkt.get_or_init(|| data))
    }

    /// Checks that the active gradients are linearly independent.
    ///
    /// # Errors
    ///
    /// Returns an error if the active set cannot be computed.
    pub fn licq(&self) -> Result<&LicqData, AnalyzerError> {
        if let Some(data) = self.licq.get() {
            return Ok(data);
        }

        let active = self.active_set()?;
        let (rows, cols) = active.jacobian.dim();
        let data = LicqData {
            rank: rank::rank(&active.jacobian, self.config.rank_tolerance()),
            max_rank: rows.min(cols),
        };
        Ok(self.licq.get_or_init(|| data))
    }

    /// Looks for active constraints with a vanishing gradient.
    ///
    /// # Errors
    ///
    /// Returns an error if the active set or the cost gradient cannot be
    /// computed.
    pub fn null_gradient(&self) -> Result<&NullGradientData, AnalyzerError> {
        if let Some(data) = self.null_gradient.get() {
            return Ok(data);
        }

        let active = self.active_set()?;
        let offset = active.bounds.len();
        let rows = active
            .rows
            .iter()
            .enumerate()
            .filter(|(k, _)| {
                let row = active.jacobian.row(offset + k);
                row.dot(&row).sqrt() < self.config.null_gradient_tolerance()
            })
            .map(|(_, active_row)| NullRow {
                constraint: active_row.constraint,
                name: self.problem.constraints()[active_row.constraint]
                    .function()
                    .name()
                    .to_owned(),
                local: active_row.local,
            })
            .collect();

        let zero_cost_components = self
            .cost_gradient()?
            .iter()
            .enumerate()
            .filter(|(_, g)| **g == 0.0)
            .map(|(i, _)| i)
            .collect();

        let data = NullGradientData {
            rows,
            zero_cost_components,
        };
        Ok(self.null_gradient.get_or_init(|| data))
    }

    /// Bounds and constraint rows active at the solution.
    ///
    /// # Errors
    ///
    /// Returns an error if the solution has the wrong size or the
    /// constraints cannot be evaluated or differentiated.
    pub fn active_set(&self) -> Result<&ActiveSet, AnalyzerError> {
        if let Some(active) = self.active.get() {
            return Ok(active);
        }

        let x = self.point()?;
        let tol = self.config.active_tolerance();
        let on_bound = |value: f64, lower: f64, upper: f64| {
            (value - lower).abs() < tol || (value - upper).abs() < tol
        };

        let bounds: Vec<usize> = x
            .iter()
            .zip(self.problem.argument_bounds())
            .enumerate()
            .filter(|(_, (v, b))| on_bound(**v, b.lower(), b.upper()))
            .map(|(i, _)| i)
            .collect();

        let values = self.problem.constraint_values(x)?;
        let mut rows = Vec::new();
        let mut row = 0;
        for (constraint, c) in self.problem.constraints().iter().enumerate() {
            for (local, bound) in c.bounds().iter().enumerate() {
                if on_bound(values[row], bound.lower(), bound.upper()) {
                    rows.push(ActiveRow {
                        constraint,
                        local,
                        row,
                    });
                }
                row += 1;
            }
        }

        let n = self.problem.input_size();
        let mut jacobian = DenseMatrix::zeros((bounds.len() + rows.len(), n));
        for (k, &i) in bounds.iter().enumerate() {
            jacobian[[k, i]] = 1.0;
        }
        if !rows.is_empty() {
            let full = self.jacobian()?;
            for (k, active_row) in rows.iter().enumerate() {
                jacobian
                    .row_mut(bounds.len() + k)
                    .assign(&full.row(active_row.row));
            }
        }

        let active = ActiveSet {
            bounds,
            rows,
            jacobian,
        };
        Ok(self.active.get_or_init(|| active))
    }

    fn point(&self) -> Result<&'a Vector, AnalyzerError> {
        let x = &self.solution.x;
        let expected = self.problem.input_size();
        if x.len() == expected {
            Ok(x)
        } else {
            Err(AnalyzerError::PointSize {
                expected,
                actual: x.len(),
            })
        }
    }

    fn cost_gradient(&self) -> Result<&Vector, AnalyzerError> {
        if let Some(gradient) = self.cost_gradient.get() {
            return Ok(gradient);
        }
        let gradient = self.problem.cost().gradient(self.point()?, 0)?;
        Ok(self.cost_gradient.get_or_init(|| gradient))
    }

    fn jacobian(&self) -> Result<&Matrix, AnalyzerError> {
        if let Some(jacobian) = self.jacobian.get() {
            return Ok(jacobian);
        }
        let jacobian = self.problem.jacobian(self.point()?)?;
        Ok(self.jacobian.get_or_init(|| jacobian))
    }
}

impl fmt::Debug for ResultAnalyzer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultAnalyzer")
            .field("config", &self.config)
            .field("kkt", &self.kkt.get())
            .field("licq", &self.licq.get())
            .field("null_gradient", &self.null_gradient.get())
            .finish_non_exhaustive()
    }
}

fn verdict(satisfied: bool) -> &'static str {
    if satisfied { "satisfied" } else { "not satisfied" }
}

impl fmt::Display for KktData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "KKT conditions: {}", verdict(self.is_satisfied()))?;
        writeln!(f, "  ∇L(x*,λ*) = {}", self.residual)?;
        match &self.lambda {
            Some(lambda) => write!(f, "  λ = {lambda}"),
            None => write!(f, "  λ was not provided"),
        }
    }
}

impl fmt::Display for LicqData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "LICQ conditions: {}", verdict(self.is_satisfied()))?;
        writeln!(f, "  rank: {}", self.rank)?;
        write!(f, "  max_rank: {}", self.max_rank)
    }
}

impl fmt::Display for NullGradientData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Null gradient condition: {}", verdict(self.is_satisfied()))?;
        for row in &self.rows {
            write!(
                f,
                "\n  - Constraint {} ({}): null gradient at output {}",
                row.constraint, row.name, row.local
            )?;
        }
        Ok(())
    }
}
