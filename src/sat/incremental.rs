#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Bookkeeping that keeps the cached search tables consistent with the assignment.
//!
//! Two passes exist:
//! - [`rebuild_scores`] recomputes every variable's flip score from the
//!   clause satisfaction counts, in one pass over the occurrence index.
//! - [`apply_flips`] patches the clause satisfaction counts and the
//!   unsatisfied-clause count after some variables were flipped, touching only
//!   the clauses those variables occur in.
//!
//! The solver always runs both after a flip: the scores are rebuilt in full
//! every time rather than patched.

use crate::sat::assignment::Assignment;
use crate::sat::cnf::Formula;
use crate::sat::literal::Variable;
use crate::sat::state::{ClauseStatus, Scores};

/// Recomputes the satisfied-literal count of every clause from scratch.
///
/// Returns the number of unsatisfied clauses.
pub fn compute_clause_status(
    assignment: &Assignment,
    formula: &Formula,
    clause_status: &mut ClauseStatus,
) -> usize {
    let mut unsatisfied = 0;

    for (id, clause) in formula.clauses().enumerate() {
        let satisfied = clause
            .iter()
            .filter(|&&lit| assignment.literal_value(lit))
            .count();
        clause_status[id] = u32::try_from(satisfied).unwrap_or(u32::MAX);

        if satisfied == 0 {
            unsatisfied += 1;
        }
    }

    unsatisfied
}

/// Recomputes `scores[v]`, the number of clauses newly satisfied minus the
/// number newly unsatisfied if `v` alone were flipped.
///
/// A clause with two or more true literals cannot change. A clause whose only
/// true literal belongs to `v` would break. An unsatisfied clause would become
/// satisfied through `v`.
pub fn rebuild_scores(
    assignment: &Assignment,
    formula: &Formula,
    clause_status: &ClauseStatus,
    scores: &mut Scores,
) {
    for var in formula.variables() {
        let value = assignment.value(var);
        let mut score = 0;

        for occurrence in formula.occurrences(var) {
            match clause_status[occurrence.clause] {
                0 if !occurrence.is_true_under(value) => score += 1,
                1 if occurrence.is_true_under(value) => score -= 1,
                _ => {}
            }
        }

        scores[var] = score;
    }
}

/// Patches the clause satisfaction counts for variables that have just been
/// flipped in `assignment`, keeping `unsatisfied` equal to the number of
/// clauses with a zero count.
pub fn apply_flips(
    flipped: &[Variable],
    assignment: &Assignment,
    formula: &Formula,
    clause_status: &mut ClauseStatus,
    unsatisfied: &mut usize,
) {
    for &var in flipped {
        let value = assignment.value(var);

        for occurrence in formula.occurrences(var) {
            let old = clause_status[occurrence.clause];
            let new = if occurrence.is_true_under(value) {
                old + 1
            } else {
                old - 1
            };

            if old == 0 && new > 0 {
                *unsatisfied -= 1;
            } else if old > 0 && new == 0 {
                *unsatisfied += 1;
            }

            clause_status[occurrence.clause] = new;
        }
    }
}
