#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The immutable formula produced by parsing.
//!
//! Clauses are kept in one contiguous literal buffer with a per-clause offset
//! range, and the variable occurrence index is kept the same way: one
//! contiguous buffer of [`Occurrence`]s with a per-variable offset range.
//! Both tables are built once and only read afterwards.

use crate::sat::assignment::Assignment;
use crate::sat::clause::{ClauseId, Occurrence};
use crate::sat::literal::{Literal, Variable};
use itertools::Itertools;
use std::collections::TryReserveError;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Raised when one of the formula tables cannot be allocated.
#[derive(Debug, Error)]
#[error("failed to allocate the {table} table")]
pub struct AllocationError {
    pub table: &'static str,
    #[source]
    pub source: TryReserveError,
}

/// Allocates an empty vector with room for `len` elements, reporting failure
/// instead of aborting.
pub(crate) fn try_with_capacity<T>(
    len: usize,
    table: &'static str,
) -> Result<Vec<T>, AllocationError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|source| AllocationError { table, source })?;
    Ok(v)
}

/// Allocates a vector of `len` copies of `value`, reporting failure instead of aborting.
pub(crate) fn try_filled<T: Clone>(
    len: usize,
    value: T,
    table: &'static str,
) -> Result<Vec<T>, AllocationError> {
    let mut v = try_with_capacity(len, table)?;
    v.resize(len, value);
    Ok(v)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    num_vars: usize,
    literals: Vec<Literal>,
    /// `clause_offsets[c]..clause_offsets[c + 1]` is the literal range of clause `c`.
    clause_offsets: Vec<usize>,
    occurrences: Vec<Occurrence>,
    /// `occurrence_offsets[v]..occurrence_offsets[v + 1]` is the occurrence range of
    /// variable `v`. Entry 0 belongs to no variable and is always empty.
    occurrence_offsets: Vec<usize>,
}

impl Formula {
    /// Builds the clause table and the variable occurrence index.
    ///
    /// Every literal must reference a variable in `1..=num_vars`; the DIMACS
    /// parser guarantees this before calling.
    ///
    /// # Errors
    ///
    /// If any of the tables cannot be allocated.
    pub fn new<I, C>(num_vars: usize, clauses: I) -> Result<Self, AllocationError>
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[Literal]>,
    {
        let mut builder = FormulaBuilder::new(num_vars, 0)?;
        for clause in clauses {
            builder.add_clause(clause.as_ref())?;
        }
        builder.build()
    }

    #[must_use]
    pub const fn num_vars(&self) -> usize {
        self.num_vars
    }

    #[must_use]
    pub fn num_clauses(&self) -> usize {
        self.clause_offsets.len() - 1
    }

    #[must_use]
    pub fn num_literals(&self) -> usize {
        self.literals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_clauses() == 0
    }

    #[must_use]
    pub fn clause(&self, id: ClauseId) -> &[Literal] {
        &self.literals[self.clause_offsets[id]..self.clause_offsets[id + 1]]
    }

    pub fn clauses(&self) -> impl Iterator<Item = &[Literal]> + '_ {
        self.clause_offsets
            .iter()
            .tuple_windows()
            .map(|(&start, &end)| &self.literals[start..end])
    }

    /// Every clause containing `var`, together with the polarity of `var` there.
    #[must_use]
    pub fn occurrences(&self, var: Variable) -> &[Occurrence] {
        &self.occurrences[self.occurrence_offsets[var]..self.occurrence_offsets[var + 1]]
    }

    #[must_use]
    pub const fn variables(&self) -> RangeInclusive<Variable> {
        1..=self.num_vars
    }

    /// Number of clauses without a true literal, computed from scratch.
    #[must_use]
    pub fn count_unsatisfied(&self, assignment: &Assignment) -> usize {
        self.clauses()
            .filter(|clause| !clause.iter().any(|&l| assignment.literal_value(l)))
            .count()
    }

    /// Checks that `assignment` satisfies every clause.
    #[must_use]
    pub fn verify(&self, assignment: &Assignment) -> bool {
        self.count_unsatisfied(assignment) == 0
    }
}

impl Display for Formula {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "p cnf {} {}", self.num_vars, self.num_clauses())?;
        for clause in self.clauses() {
            writeln!(f, "{} 0", clause.iter().join(" "))?;
        }
        Ok(())
    }
}

/// Incrementally collects clauses, then lays out the flat tables.
#[derive(Debug, Clone)]
pub struct FormulaBuilder {
    num_vars: usize,
    literals: Vec<Literal>,
    clause_offsets: Vec<usize>,
    occurrence_counts: Vec<usize>,
}

impl FormulaBuilder {
    /// Reserves the tables for `num_vars` variables and `num_clauses` clauses.
    ///
    /// # Errors
    ///
    /// If the tables cannot be allocated.
    pub fn new(num_vars: usize, num_clauses: usize) -> Result<Self, AllocationError> {
        // An unrepresentable table size fails the reservation instead of wrapping.
        let mut clause_offsets =
            try_with_capacity(num_clauses.saturating_add(1), "clause offset")?;
        clause_offsets.push(0);

        Ok(Self {
            num_vars,
            literals: Vec::new(),
            clause_offsets,
            occurrence_counts: try_filled(num_vars.saturating_add(2), 0, "variable occurrence")?,
        })
    }

    /// Appends a clause.
    ///
    /// # Errors
    ///
    /// If the literal buffer cannot grow.
    pub fn add_clause(&mut self, clause: &[Literal]) -> Result<(), AllocationError> {
        self.literals
            .try_reserve(clause.len())
            .map_err(|source| AllocationError {
                table: "clause",
                source,
            })?;
        self.clause_offsets
            .try_reserve(1)
            .map_err(|source| AllocationError {
                table: "clause offset",
                source,
            })?;

        for &lit in clause {
            debug_assert!((1..=self.num_vars).contains(&lit.variable()));
            self.occurrence_counts[lit.variable()] += 1;
        }
        self.literals.extend_from_slice(clause);
        self.clause_offsets.push(self.literals.len());
        Ok(())
    }

    #[must_use]
    pub const fn num_vars(&self) -> usize {
        self.num_vars
    }

    #[must_use]
    pub fn num_clauses(&self) -> usize {
        self.clause_offsets.len() - 1
    }

    /// Lays out the occurrence index with a counting pass over the clauses.
    ///
    /// # Errors
    ///
    /// If the occurrence index cannot be allocated.
    pub fn build(self) -> Result<Formula, AllocationError> {
        let mut occurrence_offsets = try_filled(self.num_vars + 2, 0, "variable occurrence")?;
        for var in 1..=self.num_vars {
            occurrence_offsets[var + 1] = occurrence_offsets[var] + self.occurrence_counts[var];
        }

        let placeholder = Occurrence {
            clause: 0,
            polarity: false,
        };
        let mut occurrences = try_filled(self.literals.len(), placeholder, "occurrence")?;
        let mut cursor = occurrence_offsets.clone();

        for (clause, (&start, &end)) in self.clause_offsets.iter().tuple_windows().enumerate() {
            for &lit in &self.literals[start..end] {
                let slot = &mut cursor[lit.variable()];
                occurrences[*slot] = Occurrence::new(clause, lit);
                *slot += 1;
            }
        }

        Ok(Formula {
            num_vars: self.num_vars,
            literals: self.literals,
            clause_offsets: self.clause_offsets,
            occurrences,
            occurrence_offsets,
        })
    }
}
