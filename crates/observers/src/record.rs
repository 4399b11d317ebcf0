use std::collections::BTreeMap;

use serde::Serialize;

/// Opens a logging session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionHeader {
    /// When the logger saw its first iteration, in RFC 3339 format.
    pub started_at: String,

    /// Human-readable summary of the problem.
    pub problem: String,

    /// Names of the logged facets.
    pub facets: Vec<&'static str>,
}

/// Closes a logging session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub iterations: usize,
    pub elapsed_seconds: f64,
}

/// Values of a single constraint at an iterate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintRecord {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f64>>,

    /// Dense Jacobian rows; absent for constraints without derivatives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jacobian: Option<Vec<Vec<f64>>>,
}

/// What the logger captured at one iteration.
///
/// Fields for facets that are not logged are `None` (or empty) and left out
/// of the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationRecord {
    pub iteration: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<f64>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ConstraintRecord>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint_violation: Option<f64>,

    /// Solver-internal quantities, rendered as text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver: Option<BTreeMap<String, String>>,

    /// Seconds since the first logged iteration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<f64>,
}

impl IterationRecord {
    #[must_use]
    pub fn new(iteration: usize) -> Self {
        Self {
            iteration,
            x: None,
            cost: None,
            constraints: Vec::new(),
            constraint_violation: None,
            solver: None,
            elapsed_seconds: None,
        }
    }
}
