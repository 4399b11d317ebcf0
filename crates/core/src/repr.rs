//! Numeric representations and the promotion table used by combinators.
//!
//! Every function declares whether its derivatives are produced as dense or
//! sparse matrices. When two functions are combined, the representation of the
//! result is resolved once, at construction, by looking up the combinator's
//! [`Promotion`] rule in [`PROMOTION`].

use ndarray::{Array1, Array2};
use sprs::CsMat;

/// A dense vector of values (arguments, results, gradients).
pub type Vector = Array1<f64>;

/// A dense, row-major matrix.
pub type DenseMatrix = Array2<f64>;

/// A compressed sparse matrix.
pub type SparseMatrix = CsMat<f64>;

/// Storage used for Jacobians produced by a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Representation {
    #[default]
    Dense,
    Sparse,
}

impl Representation {
    /// Precision epsilon associated with the representation's scalar type.
    #[must_use]
    pub const fn epsilon(self) -> f64 {
        f64::EPSILON
    }

    /// Value used to encode an unbounded side of an interval.
    #[must_use]
    pub const fn infinity(self) -> f64 {
        f64::INFINITY
    }

    const fn index(self) -> usize {
        match self {
            Self::Dense => 0,
            Self::Sparse => 1,
        }
    }

    /// Resolves the representation of a combination of `self` and `other`.
    #[must_use]
    pub const fn promote(self, other: Self, rule: Promotion) -> Self {
        PROMOTION[rule.index()][self.index()][other.index()]
    }

    /// Folds [`Representation::promote`] over any number of operands.
    ///
    /// Returns [`Representation::Dense`] for an empty iterator.
    pub fn promote_all<I>(reprs: I, rule: Promotion) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut iter = reprs.into_iter();
        let Some(first) = iter.next() else {
            return Self::Dense;
        };
        iter.fold(first, |acc, r| acc.promote(r, rule))
    }
}

/// Promotion rule applied by a combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Promotion {
    /// Operations that only rearrange or add derivative blocks.
    ///
    /// Sparse wins: stacking or summing a sparse block keeps the result sparse.
    Structural,

    /// Operations that multiply derivative blocks together.
    ///
    /// Dense wins: products of a dense block fill in the result anyway.
    Evaluating,
}

impl Promotion {
    const fn index(self) -> usize {
        match self {
            Self::Structural => 0,
            Self::Evaluating => 1,
        }
    }
}

use Representation::{Dense as D, Sparse as S};

/// Lookup table indexed as `PROMOTION[rule][lhs][rhs]`.
pub const PROMOTION: [[[Representation; 2]; 2]; 2] = [
    // Structural
    [[D, S], [S, S]],
    // Evaluating
    [[D, D], [D, S]],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_promotion_prefers_sparse() {
        assert_eq!(D.promote(D, Promotion::Structural), D);
        assert_eq!(D.promote(S, Promotion::Structural), S);
        assert_eq!(S.promote(D, Promotion::Structural), S);
        assert_eq!(S.promote(S, Promotion::Structural), S);
    }

    #[test]
    fn evaluating_promotion_prefers_dense() {
        assert_eq!(D.promote(S, Promotion::Evaluating), D);
        assert_eq!(S.promote(D, Promotion::Evaluating), D);
        assert_eq!(S.promote(S, Promotion::Evaluating), S);
    }

    #[test]
    fn promote_all_folds_operands() {
        assert_eq!(
            Representation::promote_all([D, D, S], Promotion::Structural),
            S
        );
        assert_eq!(
            Representation::promote_all([S, S, D], Promotion::Evaluating),
            D
        );
        assert_eq!(Representation::promote_all([], Promotion::Structural), D);
    }
}
