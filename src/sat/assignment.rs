#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The current truth assignment of a local search run.
//!
//! Unlike a systematic solver, local search keeps every variable assigned at
//! all times; a move is a flip. Values are bit-packed, index 0 is unused so
//! that variables can be addressed by their DIMACS id directly.

use crate::sat::literal::{Literal, Variable};
use bit_vec::BitVec;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment(BitVec);

impl Assignment {
    /// All `num_vars` variables set to false.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(BitVec::from_elem(num_vars + 1, false))
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// # Panics
    ///
    /// If `var` is out of range.
    #[must_use]
    pub fn value(&self, var: Variable) -> bool {
        self.0[var]
    }

    pub fn set(&mut self, var: Variable, value: bool) {
        self.0.set(var, value);
    }

    pub fn flip(&mut self, var: Variable) {
        let value = self.0[var];
        self.0.set(var, !value);
    }

    #[must_use]
    pub fn literal_value(&self, lit: Literal) -> bool {
        lit.is_true_under(self.value(lit.variable()))
    }

    /// Draws a fresh uniform value for every variable, in increasing variable order.
    pub fn randomize(&mut self, rng: &mut fastrand::Rng) {
        for var in 1..=self.num_vars() {
            self.0.set(var, rng.bool());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, bool)> + '_ {
        self.0.iter().enumerate().skip(1)
    }

    /// The assignment as signed DIMACS literals.
    #[must_use]
    pub fn solutions(&self) -> Solutions {
        Solutions(
            self.iter()
                .map(|(var, value)| Literal::new(var, value).to_i32())
                .collect(),
        )
    }
}

/// A model in DIMACS form: one signed literal per variable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Solutions(pub Vec<i32>);

impl Solutions {
    #[must_use]
    pub fn new(literals: Vec<i32>) -> Self {
        Self(literals)
    }

    pub fn iter(&self) -> impl Iterator<Item = &i32> {
        self.0.iter()
    }

    #[must_use]
    pub fn check(&self, lit: i32) -> bool {
        self.0.contains(&lit)
    }
}

impl Display for Solutions {
    /// Renders the `v` line of a DIMACS result, terminated by `0`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "v 0")
        } else {
            write!(f, "v {} 0", self.0.iter().join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_all_false() {
        let a = Assignment::new(3);
        assert_eq!(a.num_vars(), 3);
        assert!(a.iter().all(|(_, v)| !v));
    }

    #[test]
    fn test_flip_twice_restores() {
        let mut a = Assignment::new(2);
        a.flip(2);
        assert!(a.value(2));
        assert!(!a.value(1));
        a.flip(2);
        assert!(!a.value(2));
    }

    #[test]
    fn test_literal_value() {
        let mut a = Assignment::new(2);
        a.set(1, true);
        assert!(a.literal_value(Literal::from_i32(1)));
        assert!(!a.literal_value(Literal::from_i32(-1)));
        assert!(a.literal_value(Literal::from_i32(-2)));
    }

    #[test]
    fn test_randomize_is_reproducible() {
        let mut a = Assignment::new(64);
        let mut b = Assignment::new(64);
        a.randomize(&mut fastrand::Rng::with_seed(7));
        b.randomize(&mut fastrand::Rng::with_seed(7));
        assert_eq!(a, b);
        assert!(!a.value(0), "index 0 is never touched");
    }

    #[test]
    fn test_solutions_display() {
        let mut a = Assignment::new(3);
        a.set(1, true);
        a.set(3, true);
        assert_eq!(a.solutions(), Solutions::new(vec![1, -2, 3]));
        assert_eq!(a.solutions().to_string(), "v 1 -2 3 0");
        assert!(a.solutions().check(-2));
    }
}
