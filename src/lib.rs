//! Stochastic local search for SAT.
//!
//! Two strategies share one search engine: Robust Tabu Search (`rots`) and
//! Iterated Local Search with Simulated Annealing (`ilssa`). Instances are read
//! from DIMACS CNF files; see [`sat::solver::solve`] for the one-call entry point.

/// The `sat` module holds the formula tables, the DIMACS reader, the
/// incremental search state and both search strategies.
pub mod sat;
