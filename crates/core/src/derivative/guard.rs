use std::cell::Cell;

use tracing::debug;

use crate::repr::Vector;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    static NON_FINITE: Cell<usize> = const { Cell::new(0) };
}

/// Scoped marker around finite-difference probing on the current thread.
///
/// Floating-point operations never trap in Rust, so probes that leave the
/// function's domain simply yield `inf` or `NaN`. The guard counts those
/// values and reports them once, when it is released. State is per thread,
/// so concurrent probing on other threads is unaffected.
#[derive(Debug)]
pub struct ProbeGuard {
    name: String,
    non_finite: usize,
}

impl ProbeGuard {
    /// Enters a probing scope for the function named `name`.
    #[must_use]
    pub fn acquire(name: &str) -> Self {
        DEPTH.with(|d| d.set(d.get() + 1));
        Self {
            name: name.to_owned(),
            non_finite: 0,
        }
    }

    /// Records the non-finite entries of a probed value.
    pub fn inspect(&mut self, value: &Vector) {
        let count = value.iter().filter(|v| !v.is_finite()).count();
        if count > 0 {
            self.non_finite += count;
            NON_FINITE.with(|n| n.set(n.get() + count));
        }
    }

    /// Number of non-finite values seen by this guard so far.
    #[must_use]
    pub fn non_finite(&self) -> usize {
        self.non_finite
    }

    /// Returns `true` while any probing scope is open on this thread.
    #[must_use]
    pub fn is_probing() -> bool {
        DEPTH.with(Cell::get) > 0
    }

    /// Total non-finite values recorded on this thread.
    #[must_use]
    pub fn non_finite_total() -> usize {
        NON_FINITE.with(Cell::get)
    }
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        let depth = DEPTH.with(|d| {
            let depth = d.get().saturating_sub(1);
            d.set(depth);
            depth
        });
        if self.non_finite > 0 {
            debug!(
                function = %self.name,
                non_finite = self.non_finite,
                depth,
                "finite-difference probe produced non-finite values"
            );
        }
    }
}
