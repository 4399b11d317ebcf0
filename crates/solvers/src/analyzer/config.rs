use thiserror::Error;

/// Tolerances used by the [`ResultAnalyzer`](super::ResultAnalyzer).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerConfig {
    active_tolerance: f64,
    rank_tolerance: f64,
    kkt_tolerance: f64,
    null_gradient_tolerance: f64,
}

/// Errors that can occur when validating an analyzer config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerConfigError {
    #[error("active_tolerance must be finite and non-negative")]
    ActiveTolerance,

    #[error("rank_tolerance must be finite and non-negative")]
    RankTolerance,

    #[error("kkt_tolerance must be finite and non-negative")]
    KktTolerance,

    #[error("null_gradient_tolerance must be finite and non-negative")]
    NullGradientTolerance,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        // Known-good values, unwrap is safe
        Self::new(1e-12, 1e-10, 1e-8, 1e-12).unwrap()
    }
}

impl AnalyzerConfig {
    /// Creates a new config with validated tolerances.
    ///
    /// # Errors
    ///
    /// Returns an error if any tolerance is negative or non-finite.
    pub fn new(
        active_tolerance: f64,
        rank_tolerance: f64,
        kkt_tolerance: f64,
        null_gradient_tolerance: f64,
    ) -> Result<Self, AnalyzerConfigError> {
        let valid = |t: f64| t.is_finite() && t >= 0.0;
        if !valid(active_tolerance) {
            return Err(AnalyzerConfigError::ActiveTolerance);
        }
        if !valid(rank_tolerance) {
            return Err(AnalyzerConfigError::RankTolerance);
        }
        if !valid(kkt_tolerance) {
            return Err(AnalyzerConfigError::KktTolerance);
        }
        if !valid(null_gradient_tolerance) {
            return Err(AnalyzerConfigError::NullGradientTolerance);
        }

        Ok(Self {
            active_tolerance,
            rank_tolerance,
            kkt_tolerance,
            null_gradient_tolerance,
        })
    }

    /// Distance to a bound under which the bound counts as active.
    #[must_use]
    pub fn active_tolerance(&self) -> f64 {
        self.active_tolerance
    }

    /// Relative pivot size under which elimination stops counting rank.
    #[must_use]
    pub fn rank_tolerance(&self) -> f64 {
        self.rank_tolerance
    }

    /// Norm of the Lagrangian gradient under which KKT holds.
    #[must_use]
    pub fn kkt_tolerance(&self) -> f64 {
        self.kkt_tolerance
    }

    /// Norm under which an active constraint gradient counts as null.
    #[must_use]
    pub fn null_gradient_tolerance(&self) -> f64 {
        self.null_gradient_tolerance
    }
}
