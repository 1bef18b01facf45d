#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The restart/iteration loop driving a [`SearchStrategy`].
//!
//! Each restart attempt draws a fresh random assignment, rebuilds every table
//! and then asks the strategy for up to `iteration_factor * num_vars` moves.
//! After every decision the chosen flips are applied, the scores are rebuilt in
//! full, and the run ends as soon as no clause is left unsatisfied. When every
//! attempt is spent the last assignment is returned together with its
//! unsatisfied-clause count.
//!
//! All randomness of a run comes from one `fastrand::Rng` seeded from
//! [`SolverConfig::seed`], so a run is reproducible from its seed.

use crate::sat::assignment::{Assignment, Solutions};
use crate::sat::cnf::{AllocationError, Formula};
use crate::sat::configs::SolverConfig;
use crate::sat::dimacs::{DimacsParseError, parse_file};
use crate::sat::state::SearchState;
use crate::sat::strategy::{Decision, SearchStrategy, StrategyImpls, StrategyType};
use log::{debug, info, trace};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolveError {
    #[error(transparent)]
    Parse(#[from] DimacsParseError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error("unknown algorithm `{0}` (expected `rots` or `ilssa`)")]
    UnknownAlgorithm(String),
}

/// Counters collected over one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolutionStats {
    /// Restart attempts started, the first one included.
    pub restarts: usize,
    pub iterations: usize,
    /// Variables listed by flip decisions, undone perturbations included.
    pub flips: usize,
    pub no_moves: usize,
    /// Attempts abandoned early at the strategy's request.
    pub restart_signals: usize,
}

/// The best-effort result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveOutcome {
    pub assignment: Assignment,
    pub unsatisfied: usize,
}

impl SolveOutcome {
    #[must_use]
    pub const fn is_satisfiable(&self) -> bool {
        self.unsatisfied == 0
    }

    #[must_use]
    pub fn solutions(&self) -> Solutions {
        self.assignment.solutions()
    }
}

#[derive(Debug, Clone)]
pub struct SlsSolver<S: SearchStrategy = StrategyImpls> {
    formula: Formula,
    strategy: S,
    config: SolverConfig,
    state: SearchState,
    rng: fastrand::Rng,
    stats: SolutionStats,
}

impl SlsSolver<StrategyImpls> {
    /// # Errors
    ///
    /// If the search or strategy tables cannot be allocated.
    pub fn with_strategy_type(
        formula: Formula,
        strategy: StrategyType,
        config: SolverConfig,
    ) -> Result<Self, AllocationError> {
        let strategy = strategy.to_impl(&formula, &config)?;
        Self::new(formula, strategy, config)
    }
}

impl<S: SearchStrategy> SlsSolver<S> {
    /// # Errors
    ///
    /// If the search tables cannot be allocated.
    pub fn new(formula: Formula, strategy: S, config: SolverConfig) -> Result<Self, AllocationError> {
        let mut state = SearchState::new(&formula)?;
        // Keeps the tables truthful even when no attempt is ever made.
        state.load(&formula, Assignment::new(formula.num_vars()));

        Ok(Self {
            formula,
            strategy,
            config,
            state,
            rng: fastrand::Rng::with_seed(config.seed),
            stats: SolutionStats::default(),
        })
    }

    #[must_use]
    pub const fn formula(&self) -> &Formula {
        &self.formula
    }

    #[must_use]
    pub const fn state(&self) -> &SearchState {
        &self.state
    }

    #[must_use]
    pub const fn stats(&self) -> SolutionStats {
        self.stats
    }

    pub fn solve(&mut self) -> SolveOutcome {
        let budget = self.config.iteration_budget(self.formula.num_vars());
        info!(
            "searching {} variables, {} clauses: {} restarts of {} iterations (seed {})",
            self.formula.num_vars(),
            self.formula.num_clauses(),
            self.config.restarts_max,
            budget,
            self.config.seed
        );

        for restart in 0..self.config.restarts_max {
            self.state.initialise(&self.formula, &mut self.rng);
            self.strategy.initialise(restart);
            self.stats.restarts += 1;

            if self.state.is_satisfied() {
                break;
            }

            self.run_attempt(budget);

            debug!(
                "restart {restart}: {} unsatisfied clauses",
                self.state.unsatisfied()
            );

            if self.state.is_satisfied() {
                break;
            }
        }

        info!(
            "search finished with {} unsatisfied clauses after {} iterations",
            self.state.unsatisfied(),
            self.stats.iterations
        );

        SolveOutcome {
            assignment: self.state.assignment().clone(),
            unsatisfied: self.state.unsatisfied(),
        }
    }

    /// One restart attempt. Stops early on success or when the strategy asks
    /// for a restart.
    fn run_attempt(&mut self, budget: usize) {
        for iteration in 0..budget {
            self.stats.iterations += 1;

            let decision =
                self.strategy
                    .decide(iteration, &self.formula, &mut self.state, &mut self.rng);
            trace!("iteration {iteration}: {decision:?}");

            match decision {
                Decision::Flip(vars) => {
                    self.state.flip(&self.formula, &vars);
                    self.state.rebuild_scores(&self.formula);
                    self.stats.flips += vars.len();
                }
                Decision::NoMove => self.stats.no_moves += 1,
                Decision::RestartNeeded => {
                    self.stats.restart_signals += 1;
                    return;
                }
            }

            if self.state.is_satisfied() {
                return;
            }
        }
    }
}

/// Reads a DIMACS instance and searches it with the named algorithm under the
/// default budgets.
///
/// Returns the final assignment and its number of unsatisfied clauses; zero
/// means the formula is satisfied.
///
/// # Errors
///
/// If `algorithm` is neither `rots` nor `ilssa`, the file cannot be parsed or
/// the tables cannot be allocated.
pub fn solve(
    instance: impl AsRef<Path>,
    algorithm: &str,
    seed: u64,
) -> Result<(Assignment, usize), SolveError> {
    solve_with_config(instance, algorithm, SolverConfig::default().with_seed(seed))
}

/// [`solve`] with explicit budgets and constants.
///
/// # Errors
///
/// See [`solve`].
pub fn solve_with_config(
    instance: impl AsRef<Path>,
    algorithm: &str,
    config: SolverConfig,
) -> Result<(Assignment, usize), SolveError> {
    let strategy: StrategyType = algorithm.parse()?;
    let formula = parse_file(instance)?;
    let outcome = solve_formula(formula, strategy, config)?;
    Ok((outcome.assignment, outcome.unsatisfied))
}

/// Searches an already parsed formula.
///
/// # Errors
///
/// If the tables cannot be allocated.
pub fn solve_formula(
    formula: Formula,
    strategy: StrategyType,
    config: SolverConfig,
) -> Result<SolveOutcome, AllocationError> {
    let mut solver = SlsSolver::with_strategy_type(formula, strategy, config)?;
    Ok(solver.solve())
}
