use std::fmt;

/// Capability tag describing which derivatives a function guarantees.
///
/// Classes are ordered by what they guarantee: a linear function is also
/// quadratic, a quadratic one is twice differentiable, and so on. Combinators
/// resolve their own class from their operands with [`FunctionClass::meet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FunctionClass {
    /// Only values are available.
    Plain,

    /// First derivatives are available.
    Differentiable,

    /// First and second derivatives are available.
    TwiceDifferentiable,

    /// Derivatives of every order up to `n` are available (scalar input).
    Derivable(u32),

    /// At most quadratic in its argument.
    Quadratic,

    /// Affine in its argument.
    Linear,
}

impl FunctionClass {
    const fn rank(self) -> u8 {
        match self {
            Self::Plain => 0,
            Self::Differentiable => 1,
            Self::TwiceDifferentiable => 2,
            Self::Derivable(n) => {
                if n >= 2 {
                    2
                } else {
                    n as u8
                }
            }
            Self::Quadratic => 3,
            Self::Linear => 4,
        }
    }

    #[must_use]
    pub const fn is_differentiable(self) -> bool {
        self.rank() >= 1
    }

    #[must_use]
    pub const fn is_twice_differentiable(self) -> bool {
        self.rank() >= 2
    }

    /// Highest derivative order the class guarantees.
    #[must_use]
    pub const fn max_order(self) -> u32 {
        match self {
            Self::Plain => 0,
            Self::Differentiable => 1,
            Self::TwiceDifferentiable => 2,
            Self::Derivable(n) => n,
            Self::Quadratic | Self::Linear => u32::MAX,
        }
    }

    /// The strongest class guaranteed by both `self` and `other`.
    #[must_use]
    pub const fn meet(self, other: Self) -> Self {
        match (self, other) {
            (Self::Derivable(a), Self::Derivable(b)) => Self::Derivable(if a < b { a } else { b }),
            (Self::Derivable(n), Self::TwiceDifferentiable)
            | (Self::TwiceDifferentiable, Self::Derivable(n))
                if n >= 2 =>
            {
                Self::TwiceDifferentiable
            }
            _ if self.rank() <= other.rank() => self,
            _ => other,
        }
    }

    /// The class one derivative order below `self`.
    #[must_use]
    pub const fn lowered(self) -> Self {
        match self {
            Self::Linear => Self::Quadratic,
            Self::Quadratic => Self::TwiceDifferentiable,
            Self::Derivable(n) if n > 2 => Self::Derivable(n - 1),
            Self::TwiceDifferentiable | Self::Derivable(2) => Self::Differentiable,
            Self::Derivable(_) | Self::Differentiable | Self::Plain => Self::Plain,
        }
    }

    /// Class of a pointwise product of two operands.
    ///
    /// The product loses one order when both factors vary, but the product of
    /// two differentiable functions stays differentiable.
    #[must_use]
    pub const fn product(self, other: Self, both_vary: bool) -> Self {
        let met = self.meet(other);
        if !both_vary {
            return met;
        }
        let lowered = met.lowered();
        if met.is_differentiable() && !lowered.is_differentiable() {
            Self::Differentiable
        } else {
            lowered
        }
    }
}

impl fmt::Display for FunctionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "function"),
            Self::Differentiable => write!(f, "differentiable function"),
            Self::TwiceDifferentiable => write!(f, "twice differentiable function"),
            Self::Derivable(n) => write!(f, "{n} times derivable function"),
            Self::Quadratic => write!(f, "quadratic function"),
            Self::Linear => write!(f, "linear function"),
        }
    }
}
