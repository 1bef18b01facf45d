#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Literals and variables as they appear in a DIMACS formula.
//!
//! A variable is a 1-based index. A literal is stored as the signed DIMACS
//! integer: the magnitude is the variable and the sign is the polarity
//! (positive means the unnegated variable).

use core::ops::{Neg, Not};
use std::fmt::{Display, Formatter};

/// 1-based variable identifier. Index 0 is never a valid variable.
pub type Variable = usize;

/// A signed DIMACS literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Literal(i32);

impl Literal {
    /// Creates the literal of `var` with the given polarity.
    ///
    /// # Panics
    ///
    /// If `var` does not fit into a DIMACS integer.
    #[must_use]
    pub fn new(var: Variable, polarity: bool) -> Self {
        let var = i32::try_from(var).expect("literal variable overflowed");

        if polarity { Self(var) } else { Self(-var) }
    }

    /// Wraps a raw DIMACS integer. `0` is the clause terminator and is not a literal.
    #[must_use]
    pub const fn from_i32(value: i32) -> Self {
        debug_assert!(value != 0, "0 is the clause terminator, not a literal");
        Self(value)
    }

    #[must_use]
    pub const fn to_i32(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn variable(self) -> Variable {
        self.0.unsigned_abs() as Variable
    }

    /// `true` for an unnegated literal.
    #[must_use]
    pub const fn polarity(self) -> bool {
        self.0.is_positive()
    }

    #[must_use]
    pub const fn negated(self) -> Self {
        Self(-self.0)
    }

    /// Truth value of this literal when its variable takes `value`.
    #[must_use]
    pub const fn is_true_under(self, value: bool) -> bool {
        self.polarity() == value
    }
}

impl Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl Not for Literal {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::from_i32(value)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_neg() {
        assert_eq!(Literal::new(1, false).negated(), Literal::new(1, true));
        assert_eq!(-Literal::new(1, true), Literal::new(1, false));
        assert_eq!(!Literal::from_i32(-7), Literal::from_i32(7));
    }

    #[test]
    fn test_variable_and_polarity() {
        let lit = Literal::from_i32(-3);
        assert_eq!(lit.variable(), 3);
        assert!(!lit.polarity());
        assert_eq!(Literal::new(3, true).to_i32(), 3);
    }

    #[test]
    fn test_truth_under_value() {
        let pos = Literal::from_i32(2);
        let neg = Literal::from_i32(-2);
        assert!(pos.is_true_under(true));
        assert!(!pos.is_true_under(false));
        assert!(neg.is_true_under(false));
        assert!(!neg.is_true_under(true));
    }

    #[test]
    fn test_display() {
        assert_eq!(Literal::from_i32(-12).to_string(), "-12");
    }
}
