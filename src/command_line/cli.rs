#![allow(clippy::cast_precision_loss)]

use clap::{ArgAction, Args, Parser, Subcommand};
use sls_sat::sat::cnf::{AllocationError, Formula};
use sls_sat::sat::configs::{
    DEFAULT_ITERATION_FACTOR, DEFAULT_RESTARTS_MAX, DEFAULT_STAGNATION_FACTOR,
    DEFAULT_TABU_TENURE_MAX, DEFAULT_TABU_TENURE_MIN, DEFAULT_TEMPERATURE_MAX,
    DEFAULT_TEMPERATURE_MIN, SolverConfig,
};
use sls_sat::sat::dimacs::{DimacsParseError, parse_file};
use sls_sat::sat::literal::Literal;
use sls_sat::sat::solver::{SlsSolver, SolutionStats, SolveOutcome};
use sls_sat::sat::strategy::StrategyType;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tikv_jemalloc_ctl::{epoch, stats};

/// Defines the command-line interface of the local search solver.
///
/// Uses `clap` for parsing arguments.
#[derive(Parser, Debug)]
#[command(
    name = "sls_sat",
    version,
    about = "A stochastic local search SAT solver (RoTS and ILS/SA)"
)]
pub(crate) struct Cli {
    /// An optional path argument. If provided without a subcommand,
    /// it's treated as the path to a DIMACS .cnf file to solve.
    pub path: Option<PathBuf>,

    /// Specifies the subcommand to execute (e.g. `file`, `text`, `dir`).
    #[clap(subcommand)]
    pub command: Option<Commands>,

    /// Common options applicable to all commands.
    #[command(flatten)]
    pub common: CommonOptions,
}

/// Enumerates the available subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve a CNF file in DIMACS format.
    File {
        /// Path to the DIMACS .cnf file.
        #[arg(long)]
        path: PathBuf,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve a CNF formula provided as plain text.
    Text {
        /// Literal CNF input as a string (e.g. "1 -2 0\n2 3 0").
        /// Each line represents a clause, literals are space-separated, and 0 terminates a clause.
        #[arg(short, long)]
        input: String,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve every `.cnf` file below a directory.
    Dir {
        /// Directory to walk.
        #[arg(long)]
        path: PathBuf,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Defines common command-line options shared across different subcommands.
#[derive(Args, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Enable debug output, providing more verbose logging during the search.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Check the final assignment against the formula with a full recount.
    #[arg(short, long, default_value_t = true, action = ArgAction::Set)]
    pub(crate) verify: bool,

    /// Enable printing of performance and problem statistics after solving.
    #[arg(short, long, default_value_t = true, action = ArgAction::Set)]
    pub(crate) stats: bool,

    /// Print the final assignment even when it does not satisfy the formula.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_solution: bool,

    /// The local search algorithm.
    #[arg(short, long, default_value_t = StrategyType::Rots)]
    pub(crate) algorithm: StrategyType,

    /// Random seed. Defaults to the current UNIX timestamp.
    #[arg(short = 'r', long)]
    pub(crate) seed: Option<u64>,

    /// Number of restart attempts.
    #[arg(long, default_value_t = DEFAULT_RESTARTS_MAX)]
    pub(crate) restarts: usize,

    /// Iterations per restart attempt, per variable.
    #[arg(long, default_value_t = DEFAULT_ITERATION_FACTOR)]
    pub(crate) iteration_factor: usize,

    #[arg(long, default_value_t = DEFAULT_TABU_TENURE_MIN)]
    pub(crate) tabu_tenure_min: usize,

    #[arg(long, default_value_t = DEFAULT_TABU_TENURE_MAX)]
    pub(crate) tabu_tenure_max: usize,

    #[arg(long, default_value_t = DEFAULT_STAGNATION_FACTOR)]
    pub(crate) stagnation_factor: usize,

    #[arg(long, default_value_t = DEFAULT_TEMPERATURE_MAX)]
    pub(crate) temperature_max: f64,

    #[arg(long, default_value_t = DEFAULT_TEMPERATURE_MIN)]
    pub(crate) temperature_min: f64,
}

impl Default for CommonOptions {
    fn default() -> Self {
        Self {
            debug: false,
            verify: true,
            stats: true,
            print_solution: false,
            algorithm: StrategyType::default(),
            seed: None,
            restarts: DEFAULT_RESTARTS_MAX,
            iteration_factor: DEFAULT_ITERATION_FACTOR,
            tabu_tenure_min: DEFAULT_TABU_TENURE_MIN,
            tabu_tenure_max: DEFAULT_TABU_TENURE_MAX,
            stagnation_factor: DEFAULT_STAGNATION_FACTOR,
            temperature_max: DEFAULT_TEMPERATURE_MAX,
            temperature_min: DEFAULT_TEMPERATURE_MIN,
        }
    }
}

impl CommonOptions {
    /// The solver configuration described by these options.
    pub(crate) fn config(&self) -> SolverConfig {
        SolverConfig {
            restarts_max: self.restarts,
            iteration_factor: self.iteration_factor,
            tabu_tenure_min: self.tabu_tenure_min,
            tabu_tenure_max: self.tabu_tenure_max,
            stagnation_factor: self.stagnation_factor,
            temperature_max: self.temperature_max,
            temperature_min: self.temperature_min,
            seed: self.seed.unwrap_or_else(unix_time_seed),
        }
    }
}

fn unix_time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Parse(#[from] DimacsParseError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error("'{token}' on line {line} is not a valid literal")]
    InvalidText { token: String, line: usize },

    #[error("provided path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("the final assignment leaves {actual} clauses unsatisfied, the search reported {reported}")]
    VerificationFailed { reported: usize, actual: usize },
}

/// Solves every `.cnf` file below `path`, stopping at the first error.
///
/// # Errors
///
/// If `path` is not a directory, or any instance fails to parse or solve.
pub(crate) fn solve_dir(path: &Path, common: &CommonOptions) -> Result<(), CliError> {
    if !path.is_dir() {
        return Err(CliError::NotADirectory(path.to_path_buf()));
    }

    for entry in walkdir::WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let file_path = entry.path();

        if !file_path.is_file() {
            continue;
        }

        if file_path.extension().is_none_or(|ext| ext != "cnf") {
            eprintln!("Skipping non-CNF file: {}", file_path.display());
            continue;
        }

        solve_file(file_path, common)?;
    }

    Ok(())
}

/// Parses and solves one DIMACS file.
///
/// # Errors
///
/// If the file cannot be parsed, or see [`solve_and_report`].
pub(crate) fn solve_file(path: &Path, common: &CommonOptions) -> Result<(), CliError> {
    let time = std::time::Instant::now();
    let formula = parse_file(path)?;
    let elapsed = time.elapsed();

    solve_and_report(&formula, common, Some(path), elapsed)
}

/// Parses a textual CNF formula: one clause per line, literals separated by
/// whitespace, a `0` terminating the clause. Comment and problem lines as well
/// as blank lines are skipped; the variable count is the largest variable seen.
///
/// # Errors
///
/// If a token is not an integer, or the formula tables cannot be allocated.
pub(crate) fn parse_textual_cnf(input: &str) -> Result<Formula, CliError> {
    let mut clauses: Vec<Vec<Literal>> = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('c') || line.starts_with('p') {
            continue;
        }

        let mut clause = Vec::new();
        for token in line.split_whitespace() {
            let value = token
                .parse::<i32>()
                .ok()
                .filter(|&v| v != i32::MIN)
                .ok_or_else(|| CliError::InvalidText {
                    token: token.to_owned(),
                    line: index + 1,
                })?;
            if value == 0 {
                break;
            }
            clause.push(Literal::from_i32(value));
        }
        clauses.push(clause);
    }

    let num_vars = clauses
        .iter()
        .flatten()
        .map(|lit| lit.variable())
        .max()
        .unwrap_or(0);

    Ok(Formula::new(num_vars, clauses)?)
}

/// Runs the search on `formula` with the configured algorithm.
///
/// # Errors
///
/// If the search tables cannot be allocated.
pub(crate) fn solve(
    formula: &Formula,
    label: Option<&Path>,
    common: &CommonOptions,
) -> Result<(SolveOutcome, Duration, SolutionStats), CliError> {
    if let Some(name) = label {
        println!("c Solving: {}", name.display());
    }

    let config = common.config();
    println!("c Algorithm: {}, seed: {}", common.algorithm, config.seed);

    if common.debug {
        println!("c Variables: {}", formula.num_vars());
        println!("c Clauses: {}", formula.num_clauses());
        println!("c Literals: {}", formula.num_literals());
    }

    let time = std::time::Instant::now();

    let mut solver = SlsSolver::with_strategy_type(formula.clone(), common.algorithm, config)?;
    let outcome = solver.solve();

    let elapsed = time.elapsed();

    if common.debug {
        println!("c Time: {elapsed:?}");
    }

    Ok((outcome, elapsed, solver.stats()))
}

/// Solves a formula, then verifies, reports statistics and renders the result.
///
/// # Errors
///
/// If the search tables cannot be allocated, or verification finds the
/// reported unsatisfied count to be wrong.
pub(crate) fn solve_and_report(
    formula: &Formula,
    common: &CommonOptions,
    label: Option<&Path>,
    parse_time: Duration,
) -> Result<(), CliError> {
    let (outcome, elapsed, solver_stats) = solve(formula, label, common)?;

    if common.verify {
        verify_outcome(formula, &outcome)?;
    }

    if common.stats {
        print_stats(parse_time, elapsed, formula, &solver_stats, memory_usage());
    }

    print_outcome(&outcome, common.print_solution);
    Ok(())
}

/// Recounts the unsatisfied clauses of the final assignment from scratch.
///
/// # Errors
///
/// If the recount disagrees with what the search reported.
pub(crate) fn verify_outcome(formula: &Formula, outcome: &SolveOutcome) -> Result<(), CliError> {
    let actual = formula.count_unsatisfied(&outcome.assignment);
    println!("c Verified: {}", actual == outcome.unsatisfied);

    if actual == outcome.unsatisfied {
        Ok(())
    } else {
        Err(CliError::VerificationFailed {
            reported: outcome.unsatisfied,
            actual,
        })
    }
}

/// Allocated and resident memory in MiB, if jemalloc can report them.
fn memory_usage() -> Option<(f64, f64)> {
    epoch::advance().ok()?;

    let allocated_bytes = stats::allocated::mib().ok()?.read().ok()?;
    let resident_bytes = stats::resident::mib().ok()?.read().ok()?;

    Some((
        allocated_bytes as f64 / (1024.0 * 1024.0),
        resident_bytes as f64 / (1024.0 * 1024.0),
    ))
}

/// Renders the result: the model line and `s SATISFIABLE` on success,
/// otherwise `s UNSATISFIABLE` with the number of clauses left unsatisfied.
pub(crate) fn print_outcome(outcome: &SolveOutcome, print_solution: bool) {
    if outcome.is_satisfiable() {
        println!("{}", outcome.solutions());
        println!("s SATISFIABLE");
    } else {
        if print_solution {
            println!("{}", outcome.solutions());
        }
        println!("c {} clauses left unsatisfied", outcome.unsatisfied);
        println!("s UNSATISFIABLE");
    }
}

/// Helper function to print a single statistic line in a formatted table row.
pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

/// Helper function to print a statistic line that includes a rate (value/second).
pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

/// Prints a summary of problem and search statistics.
pub(crate) fn print_stats(
    parse_time: Duration,
    elapsed: Duration,
    formula: &Formula,
    s: &SolutionStats,
    memory: Option<(f64, f64)>,
) {
    let elapsed_secs = elapsed.as_secs_f64();

    println!("\n=======================[ Problem Statistics ]=========================");
    stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Variables", formula.num_vars());
    stat_line("Clauses", formula.num_clauses());
    stat_line("Literals", formula.num_literals());

    println!("========================[ Search Statistics ]========================");
    stat_line("Restarts", s.restarts);
    stat_line("Early restarts", s.restart_signals);
    stat_line_with_rate("Iterations", s.iterations, elapsed_secs);
    stat_line_with_rate("Flips", s.flips, elapsed_secs);
    stat_line_with_rate("Idle iterations", s.no_moves, elapsed_secs);
    if let Some((allocated, resident)) = memory {
        stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
        stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    }
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    println!("=====================================================================");
}
