#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The flip-selection capability shared by the local search algorithms.
//!
//! A strategy is asked once per iteration which variable(s) to flip. It reads
//! the current [`SearchState`] and may keep private memory between calls, but
//! the restart/iteration loop itself lives in [`crate::sat::solver`].
//!
//! This module provides:
//! - The `SearchStrategy` trait and the `Decision` it returns.
//! - `StrategyType`, the user-facing algorithm name.
//! - `StrategyImpls`, an enum over the concrete strategies so one can be
//!   selected at runtime:
//!   - `RobustTabuSearch` (`rots`),
//!   - `IteratedLocalSearch` (`ilssa`), iterated local search with a
//!     simulated annealing acceptance step.

use crate::sat::cnf::{AllocationError, Formula};
use crate::sat::configs::SolverConfig;
use crate::sat::ilssa::IteratedLocalSearch;
use crate::sat::literal::Variable;
use crate::sat::rots::RobustTabuSearch;
use crate::sat::solver::SolveError;
use crate::sat::state::SearchState;
use clap::ValueEnum;
use smallvec::{SmallVec, smallvec};
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// What the strategy wants done in the current iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Flip these variables. A variable the strategy already flipped during
    /// the call is flipped back when listed again.
    Flip(SmallVec<[Variable; 2]>),
    /// Nothing to flip; the iteration still counts.
    NoMove,
    /// Abandon the current attempt and restart.
    RestartNeeded,
}

impl Decision {
    #[must_use]
    pub fn flip(var: Variable) -> Self {
        Self::Flip(smallvec![var])
    }
}

/// A flip-selection procedure.
pub trait SearchStrategy: Debug {
    /// Called at the start of every restart attempt, `restart` counting from 0.
    fn initialise(&mut self, restart: usize);

    /// Chooses the move of iteration `iteration` (0 is the first iteration of
    /// the attempt). The state may be modified by the call itself.
    fn decide(
        &mut self,
        iteration: usize,
        formula: &Formula,
        state: &mut SearchState,
        rng: &mut fastrand::Rng,
    ) -> Decision;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum StrategyType {
    /// Robust Tabu Search.
    #[default]
    #[value(name = "rots")]
    Rots,
    /// Iterated Local Search with Simulated Annealing.
    #[value(name = "ilssa")]
    IlsSa,
}

impl StrategyType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rots => "rots",
            Self::IlsSa => "ilssa",
        }
    }

    /// Allocates the concrete strategy for `formula`.
    ///
    /// # Errors
    ///
    /// If the strategy's tables cannot be allocated.
    pub fn to_impl(
        self,
        formula: &Formula,
        config: &SolverConfig,
    ) -> Result<StrategyImpls, AllocationError> {
        Ok(match self {
            Self::Rots => StrategyImpls::Rots(RobustTabuSearch::new(formula.num_vars(), config)?),
            Self::IlsSa => {
                StrategyImpls::IlsSa(IteratedLocalSearch::new(formula.num_vars(), config)?)
            }
        })
    }
}

impl Display for StrategyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for StrategyType {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rots" => Ok(Self::Rots),
            "ilssa" => Ok(Self::IlsSa),
            other => Err(SolveError::UnknownAlgorithm(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone)]
pub enum StrategyImpls {
    Rots(RobustTabuSearch),
    IlsSa(IteratedLocalSearch),
}

impl SearchStrategy for StrategyImpls {
    fn initialise(&mut self, restart: usize) {
        match self {
            Self::Rots(s) => s.initialise(restart),
            Self::IlsSa(s) => s.initialise(restart),
        }
    }

    fn decide(
        &mut self,
        iteration: usize,
        formula: &Formula,
        state: &mut SearchState,
        rng: &mut fastrand::Rng,
    ) -> Decision {
        match self {
            Self::Rots(s) => s.decide(iteration, formula, state, rng),
            Self::IlsSa(s) => s.decide(iteration, formula, state, rng),
        }
    }
}
