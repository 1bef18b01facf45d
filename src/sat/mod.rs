#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
pub mod assignment;
pub mod clause;
pub mod cnf;
pub mod configs;
pub mod dimacs;
pub mod ilssa;
pub mod incremental;
pub mod literal;
pub mod rots;
pub mod solver;
pub mod state;
pub mod strategy;
