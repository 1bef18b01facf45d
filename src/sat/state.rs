#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The mutable state of one local search attempt: the assignment and the
//! tables derived from it.
//!
//! Invariants held between any two operations:
//! - `clause_status[c]` is the number of true literals of clause `c`,
//! - `unsatisfied` is the number of clauses whose count is zero,
//! - right after [`SearchState::rebuild_scores`], `scores[v]` is the decrease
//!   of `unsatisfied` that flipping `v` alone would cause.

use crate::sat::assignment::Assignment;
use crate::sat::clause::ClauseId;
use crate::sat::cnf::{AllocationError, Formula, try_filled};
use crate::sat::incremental;
use crate::sat::literal::Variable;
use std::ops::{Index, IndexMut};

/// Number of true literals per clause.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClauseStatus(Vec<u32>);

impl ClauseStatus {
    #[must_use]
    pub fn new(num_clauses: usize) -> Self {
        Self(vec![0; num_clauses])
    }

    /// # Errors
    ///
    /// If the table cannot be allocated.
    pub fn try_new(num_clauses: usize) -> Result<Self, AllocationError> {
        Ok(Self(try_filled(num_clauses, 0, "clause status")?))
    }

    pub fn iter(&self) -> impl Iterator<Item = &u32> {
        self.0.iter()
    }
}

impl Index<ClauseId> for ClauseStatus {
    type Output = u32;

    fn index(&self, index: ClauseId) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<ClauseId> for ClauseStatus {
    fn index_mut(&mut self, index: ClauseId) -> &mut Self::Output {
        &mut self.0[index]
    }
}

/// Flip score per variable, indexed by variable id (index 0 unused).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scores(Vec<i32>);

impl Scores {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![0; num_vars + 1])
    }

    /// # Errors
    ///
    /// If the table cannot be allocated.
    pub fn try_new(num_vars: usize) -> Result<Self, AllocationError> {
        Ok(Self(try_filled(num_vars + 1, 0, "variable score")?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, i32)> + '_ {
        self.0.iter().copied().enumerate().skip(1)
    }
}

impl Index<Variable> for Scores {
    type Output = i32;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<Variable> for Scores {
    fn index_mut(&mut self, index: Variable) -> &mut Self::Output {
        &mut self.0[index]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    assignment: Assignment,
    clause_status: ClauseStatus,
    unsatisfied: usize,
    scores: Scores,
}

impl SearchState {
    /// Zero-initialised tables sized for `formula`.
    ///
    /// # Errors
    ///
    /// If any table cannot be allocated.
    pub fn new(formula: &Formula) -> Result<Self, AllocationError> {
        Ok(Self {
            assignment: Assignment::new(formula.num_vars()),
            clause_status: ClauseStatus::try_new(formula.num_clauses())?,
            unsatisfied: 0,
            scores: Scores::try_new(formula.num_vars())?,
        })
    }

    /// Starts a fresh attempt: a uniformly random assignment followed by a
    /// full recount of every derived table.
    pub fn initialise(&mut self, formula: &Formula, rng: &mut fastrand::Rng) {
        self.assignment.randomize(rng);
        self.reset_tables(formula);
    }

    /// Replaces the assignment and recounts every derived table.
    pub fn load(&mut self, formula: &Formula, assignment: Assignment) {
        debug_assert_eq!(assignment.num_vars(), formula.num_vars());
        self.assignment = assignment;
        self.reset_tables(formula);
    }

    fn reset_tables(&mut self, formula: &Formula) {
        self.unsatisfied =
            incremental::compute_clause_status(&self.assignment, formula, &mut self.clause_status);
        self.rebuild_scores(formula);
    }

    /// Flips every variable in `vars` and patches the clause counts. Scores are
    /// left untouched; see [`SearchState::rebuild_scores`].
    pub fn flip(&mut self, formula: &Formula, vars: &[Variable]) {
        for &var in vars {
            self.assignment.flip(var);
        }
        incremental::apply_flips(
            vars,
            &self.assignment,
            formula,
            &mut self.clause_status,
            &mut self.unsatisfied,
        );
    }

    pub fn rebuild_scores(&mut self, formula: &Formula) {
        incremental::rebuild_scores(
            &self.assignment,
            formula,
            &self.clause_status,
            &mut self.scores,
        );
    }

    /// The unsatisfied-clause count flipping `var` would lead to; lower is better.
    #[must_use]
    pub fn quality(&self, var: Variable) -> i64 {
        self.unsatisfied_i64() - i64::from(self.scores[var])
    }

    #[must_use]
    pub fn unsatisfied_i64(&self) -> i64 {
        i64::try_from(self.unsatisfied).unwrap_or(i64::MAX)
    }

    #[must_use]
    pub const fn unsatisfied(&self) -> usize {
        self.unsatisfied
    }

    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        self.unsatisfied == 0
    }

    #[must_use]
    pub const fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    #[must_use]
    pub const fn clause_status(&self) -> &ClauseStatus {
        &self.clause_status
    }

    #[must_use]
    pub const fn scores(&self) -> &Scores {
        &self.scores
    }

    #[must_use]
    pub fn score(&self, var: Variable) -> i32 {
        self.scores[var]
    }

    #[must_use]
    pub fn into_assignment(self) -> Assignment {
        self.assignment
    }
}
