//! # `sls_sat`
//!
//! `sls_sat` is a command-line SAT solver based on stochastic local search.
//! It reads problems in CNF (Conjunctive Normal Form) DIMACS format, from a
//! file, from plain text or from every `.cnf` file of a directory.
//!
//! Two algorithms are available:
//! 1.  **RoTS (Robust Tabu Search)**: greedy flips guarded by a randomised tabu
//!     tenure, with aspiration and a stagnation escape.
//! 2.  **ILS/SA (Iterated Local Search with Simulated Annealing)**: a random
//!     perturbation per iteration followed by a greedy step whose ties pass a
//!     Metropolis test under a decaying temperature.
//!
//! Local search cannot prove unsatisfiability: when the budget runs out the
//! best-effort assignment is reported as `s UNSATISFIABLE` together with the
//! number of clauses it leaves unsatisfied.
//!
//! ## Usage
//!
//! ```sh
//! sls_sat [OPTIONS] <path_to_cnf_file>
//! sls_sat file --path <path_to_cnf_file> [OPTIONS]
//! sls_sat text --input "1 -2 0\n2 3 0" [OPTIONS]
//! sls_sat dir --path <directory> [OPTIONS]
//! sls_sat completions <shell>
//! ```
//!
//! ### Common Options
//!
//! -   `-a, --algorithm <rots|ilssa>`: search algorithm (default: `rots`).
//! -   `-r, --seed <SEED>`: random seed (default: current UNIX time).
//! -   `--restarts <N>`, `--iteration-factor <N>`: search budget; each restart
//!     runs `iteration-factor * variables` iterations.
//! -   `--tabu-tenure-min`, `--tabu-tenure-max`, `--stagnation-factor`,
//!     `--temperature-max`, `--temperature-min`: algorithm constants.
//! -   `-d, --debug`: debug logging.
//! -   `-v, --verify <BOOL>`: recount the final assignment (default: `true`).
//! -   `-s, --stats <BOOL>`: print statistics (default: `true`).
//! -   `-p, --print-solution`: print the assignment even when it is not a model.

use crate::command_line::cli::{
    Cli, CliError, Commands, CommonOptions, parse_textual_cnf, solve_and_report, solve_dir,
    solve_file,
};
use clap::{CommandFactory, Parser};
use log::LevelFilter;
use std::io::Write;
use std::process::ExitCode;

mod command_line;

/// Global allocator using `tikv-jemallocator` for memory usage tracking.
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn init_logging(common: &CommonOptions) {
    let level = if common.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .format(|buf, record| writeln!(buf, "c [{}] {}", record.level(), record.args()))
        .filter_level(level)
        .target(env_logger::Target::Stdout)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Some(Commands::File { path, common }) => {
            init_logging(&common);
            solve_file(&path, &common)
        }

        Some(Commands::Text { input, common }) => {
            init_logging(&common);
            let time = std::time::Instant::now();
            let formula = parse_textual_cnf(&input)?;
            let elapsed = time.elapsed();

            solve_and_report(&formula, &common, None, elapsed)
        }

        Some(Commands::Dir { path, common }) => {
            init_logging(&common);
            solve_dir(&path, &common)
        }

        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }

        None => {
            init_logging(&cli.common);
            if let Some(path) = cli.path {
                solve_file(&path, &cli.common)
            } else {
                eprintln!("No command provided. Use --help for more information.");
                Ok(())
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let no_input = cli.command.is_none() && cli.path.is_none();

    match run(cli) {
        Ok(()) if no_input => ExitCode::FAILURE,
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
