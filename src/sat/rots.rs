#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Robust Tabu Search (RoTS).
//!
//! One variable is flipped per iteration. The move is chosen by, in order:
//! 1. **Aspiration**: a uniformly probed variable whose flip strictly lowers
//!    the unsatisfied-clause count is taken regardless of its tabu status.
//! 2. **Stagnation escape**: scanning in variable order, the first variable
//!    left untouched for more than `stagnation_factor * num_vars` iterations
//!    is forced.
//! 3. **Best non-tabu move**: among variables flipped more than `tenure`
//!    iterations ago, the ones reaching the best quality (no worse than the
//!    current count) are collected and one is picked uniformly.
//!
//! The tenure is redrawn uniformly from `[tabu_tenure_min, tabu_tenure_max]`
//! every `num_vars` iterations.

use crate::sat::cnf::{AllocationError, Formula, try_filled, try_with_capacity};
use crate::sat::configs::SolverConfig;
use crate::sat::literal::Variable;
use crate::sat::state::SearchState;
use crate::sat::strategy::{Decision, SearchStrategy};
use log::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobustTabuSearch {
    num_vars: usize,
    tabu_tenure_min: usize,
    tabu_tenure_max: usize,
    stagnation_factor: usize,
    /// Current tenure.
    tabu_tenure: usize,
    /// Iteration of the last flip made by this strategy, per variable.
    last_flipped: Vec<usize>,
    candidates: Vec<Variable>,
}

impl RobustTabuSearch {
    /// # Errors
    ///
    /// If the tabu or candidate tables cannot be allocated.
    pub fn new(num_vars: usize, config: &SolverConfig) -> Result<Self, AllocationError> {
        Ok(Self {
            num_vars,
            tabu_tenure_min: config.tabu_tenure_min,
            tabu_tenure_max: config.tabu_tenure_max.max(config.tabu_tenure_min),
            stagnation_factor: config.stagnation_factor,
            tabu_tenure: config.tabu_tenure_min,
            last_flipped: try_filled(num_vars + 1, 0, "tabu")?,
            candidates: try_with_capacity(num_vars, "tabu candidate")?,
        })
    }

    #[must_use]
    pub const fn tabu_tenure(&self) -> usize {
        self.tabu_tenure
    }

    /// Whether `var` may be chosen as a regular move at `iteration`.
    ///
    /// While `iteration < tenure` no variable can be tabu yet.
    fn is_allowed(&self, var: Variable, iteration: usize) -> bool {
        iteration
            .checked_sub(self.tabu_tenure)
            .is_none_or(|threshold| self.last_flipped[var] < threshold)
    }

    fn is_stagnant(&self, var: Variable, iteration: usize, horizon: usize) -> bool {
        iteration > horizon && self.last_flipped[var] < iteration - horizon
    }
}

impl SearchStrategy for RobustTabuSearch {
    fn initialise(&mut self, restart: usize) {
        if restart > 0 {
            self.last_flipped.fill(0);
        }
    }

    fn decide(
        &mut self,
        iteration: usize,
        _formula: &Formula,
        state: &mut SearchState,
        rng: &mut fastrand::Rng,
    ) -> Decision {
        let n = self.num_vars;
        if n == 0 {
            return Decision::NoMove;
        }

        if iteration % n == 0 {
            self.tabu_tenure = rng.usize(self.tabu_tenure_min..=self.tabu_tenure_max);
        }

        let current = state.unsatisfied_i64();

        let probe = rng.usize(1..=n);
        if state.quality(probe) < current {
            trace!("iteration {iteration}: aspiration on {probe}");
            return Decision::flip(probe);
        }

        let horizon = self.stagnation_factor.saturating_mul(n);
        let mut best = current;
        self.candidates.clear();

        for var in 1..=n {
            if self.is_stagnant(var, iteration, horizon) {
                trace!("iteration {iteration}: stagnation escape on {var}");
                self.last_flipped[var] = iteration;
                return Decision::flip(var);
            }

            if self.is_allowed(var, iteration) {
                let quality = state.quality(var);
                if quality < best {
                    best = quality;
                    self.candidates.clear();
                    self.candidates.push(var);
                } else if quality == best {
                    self.candidates.push(var);
                }
            }
        }

        if self.candidates.is_empty() {
            return Decision::NoMove;
        }

        let chosen = self.candidates[rng.usize(..self.candidates.len())];
        self.last_flipped[chosen] = iteration;
        Decision::flip(chosen)
    }
}
