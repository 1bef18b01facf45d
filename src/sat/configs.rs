//! Tunables of the local search.

/// Search budgets and strategy constants.
///
/// The iteration budget of one restart attempt is `iteration_factor * num_vars`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Number of restart attempts before giving up.
    pub restarts_max: usize,
    /// Iterations per restart attempt, per variable.
    pub iteration_factor: usize,
    /// Lower bound of the RoTS tabu tenure.
    pub tabu_tenure_min: usize,
    /// Upper bound of the RoTS tabu tenure.
    pub tabu_tenure_max: usize,
    /// A variable untouched for `stagnation_factor * num_vars` iterations is forced.
    pub stagnation_factor: usize,
    /// ILS/SA starting temperature.
    pub temperature_max: f64,
    /// ILS/SA restarts once the temperature falls below this.
    pub temperature_min: f64,
    /// Seed of the single random stream driving a run.
    pub seed: u64,
}

pub const DEFAULT_RESTARTS_MAX: usize = 10;
pub const DEFAULT_ITERATION_FACTOR: usize = 100;
pub const DEFAULT_TABU_TENURE_MIN: usize = 10;
pub const DEFAULT_TABU_TENURE_MAX: usize = 15;
pub const DEFAULT_STAGNATION_FACTOR: usize = 10;
pub const DEFAULT_TEMPERATURE_MAX: f64 = 0.3;
pub const DEFAULT_TEMPERATURE_MIN: f64 = 0.01;

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            restarts_max: DEFAULT_RESTARTS_MAX,
            iteration_factor: DEFAULT_ITERATION_FACTOR,
            tabu_tenure_min: DEFAULT_TABU_TENURE_MIN,
            tabu_tenure_max: DEFAULT_TABU_TENURE_MAX,
            stagnation_factor: DEFAULT_STAGNATION_FACTOR,
            temperature_max: DEFAULT_TEMPERATURE_MAX,
            temperature_min: DEFAULT_TEMPERATURE_MIN,
            seed: 0,
        }
    }
}

impl SolverConfig {
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub const fn with_budget(mut self, restarts_max: usize, iteration_factor: usize) -> Self {
        self.restarts_max = restarts_max;
        self.iteration_factor = iteration_factor;
        self
    }

    #[must_use]
    pub const fn iteration_budget(&self, num_vars: usize) -> usize {
        self.iteration_factor.saturating_mul(num_vars)
    }
}
