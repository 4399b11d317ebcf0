use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A set of facets of the solver state to log.
///
/// Combine facets with `|`:
///
/// ```
/// use braid_observers::LogFacets;
///
/// let facets = LogFacets::COST | LogFacets::X;
/// assert!(facets.contains(LogFacets::COST));
/// assert!(!facets.contains(LogFacets::TIME));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LogFacets(u8);

impl LogFacets {
    pub const NONE: Self = Self(0);
    pub const COST: Self = Self(1);
    pub const CONSTRAINT: Self = Self(1 << 1);
    pub const CONSTRAINT_JACOBIAN: Self = Self(1 << 2);
    pub const CONSTRAINT_VIOLATION: Self = Self(1 << 3);
    pub const SOLVER: Self = Self(1 << 4);
    pub const TIME: Self = Self(1 << 5);
    pub const X: Self = Self(1 << 6);
    pub const ALL: Self = Self((1 << 7) - 1);

    const NAMES: [(Self, &'static str); 7] = [
        (Self::COST, "cost"),
        (Self::CONSTRAINT, "constraint"),
        (Self::CONSTRAINT_JACOBIAN, "constraint-jacobian"),
        (Self::CONSTRAINT_VIOLATION, "constraint-violation"),
        (Self::SOLVER, "solver"),
        (Self::TIME, "time"),
        (Self::X, "x"),
    ];

    /// Whether every facet of `other` is in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Names of the facets in the set, in declaration order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(facet, _)| self.contains(*facet))
            .map(|(_, name)| name)
    }
}

impl BitOr for LogFacets {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for LogFacets {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for LogFacets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_contains_every_facet() {
        for (facet, _) in LogFacets::NAMES {
            assert!(LogFacets::ALL.contains(facet));
            assert!(!LogFacets::NONE.contains(facet));
        }
        assert_eq!(LogFacets::ALL.names().count(), 7);
        assert!(LogFacets::NONE.is_empty());
    }

    #[test]
    fn combine_and_remove() {
        let mut facets = LogFacets::COST;
        facets |= LogFacets::TIME;

        assert!(facets.contains(LogFacets::COST | LogFacets::TIME));
        assert!(!facets.contains(LogFacets::COST | LogFacets::X));
        assert_eq!(facets.without(LogFacets::TIME), LogFacets::COST);
        assert_eq!(format!("{facets:?}"), r#"{"cost", "time"}"#);
    }
}
