use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use braid_core::Problem;
use thiserror::Error;
use tracing::debug;

use crate::Solver;
use crate::dummy::{DummyIterationsSolver, DummyLastStateSolver, DummySolver};

/// Builds a backend bound to a problem.
pub type SolverConstructor = Box<dyn Fn(Arc<Problem>) -> Box<dyn Solver> + Send + Sync>;

/// Errors that can occur when resolving a backend by name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FactoryError {
    #[error("no solver named `{name}` (available: {})", available.join(", "))]
    UnknownSolver {
        name: String,
        available: Vec<String>,
    },
}

/// A registry of backends, resolved by name at runtime.
#[derive(Default)]
pub struct SolverFactory {
    constructors: BTreeMap<String, SolverConstructor>,
}

impl SolverFactory {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the dummy backends.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut factory = Self::new();
        factory.register(DummySolver::NAME, |problem| Box::new(DummySolver::new(problem)));
        factory.register(DummyLastStateSolver::NAME, |problem| {
            Box::new(DummyLastStateSolver::new(problem))
        });
        factory.register(DummyIterationsSolver::NAME, |problem| {
            Box::new(DummyIterationsSolver::new(problem))
        });
        factory
    }

    /// Registers a backend, replacing any backend with the same name.
    ///
    /// Returns `true` if a backend was replaced.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> bool
    where
        F: Fn(Arc<Problem>) -> Box<dyn Solver> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(solver = %name, "registered solver");
        self.constructors
            .insert(name, Box::new(constructor))
            .is_some()
    }

    /// Builds the backend registered as `name`, bound to `problem`.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::UnknownSolver`] if no backend has that name.
    pub fn create(
        &self,
        name: &str,
        problem: Arc<Problem>,
    ) -> Result<Box<dyn Solver>, FactoryError> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| FactoryError::UnknownSolver {
                name: name.to_owned(),
                available: self.available().map(str::to_owned).collect(),
            })?;
        debug!(solver = name, "creating solver");
        Ok(constructor(problem))
    }

    /// Registered backend names, in order.
    pub fn available(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }
}

impl fmt::Debug for SolverFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.available()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use braid_core::{function::Identity, function::SumOfSquares, shared};

    use crate::Status;

    fn problem() -> Arc<Problem> {
        let cost = shared(SumOfSquares::new(shared(Identity::new(2))).unwrap());
        Arc::new(Problem::new(cost).unwrap())
    }

    #[test]
    fn builtin_backends() {
        let factory = SolverFactory::with_builtin();

        assert_eq!(
            factory.available().collect::<Vec<_>>(),
            ["dummy", "dummy-iterations", "dummy-laststate"]
        );
        let solver = factory.create("dummy", problem()).unwrap();
        assert_eq!(solver.name(), "dummy");
        assert_eq!(solver.status(), Status::Created);
    }

    #[test]
    fn unknown_name_is_a_resolution_error() {
        let factory = SolverFactory::with_builtin();
        let err = factory.create("ipopt", problem()).err().expect("expected resolution error");

        assert_eq!(
            err.to_string(),
            "no solver named `ipopt` (available: dummy, dummy-iterations, dummy-laststate)"
        );
        assert!(SolverFactory::new().create("dummy", problem()).is_err());
    }

    #[test]
    fn register_replaces_by_name() {
        let mut factory = SolverFactory::new();
        assert!(!factory.register("custom", |p| Box::new(DummySolver::new(p))));
        assert!(factory.register("custom", |p| Box::new(DummyLastStateSolver::new(p))));

        let solver = factory.create("custom", problem()).unwrap();
        assert_eq!(solver.name(), "dummy-laststate");
        assert!(factory.contains("custom"));
    }
}
