#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A parser for the DIMACS CNF (Conjunctive Normal Form) file format.
//!
//! The DIMACS CNF format is a standard text-based format for representing
//! boolean satisfiability problems. The format includes:
//! - Comment lines starting with 'c'.
//! - Exactly one problem line `p cnf <num_variables> <num_clauses>`, which must
//!   come before any clause. The declared counts size every table of the
//!   solver, so they are enforced rather than inferred.
//! - Clause lines: whitespace separated signed integers terminated by a `0`.
//!   Each literal must name a variable in `1..=num_variables`.
//! - An optional '%' line to indicate end-of-data (often used in competitions).
//!
//! Every violation is reported as a [`DimacsParseError`]; nothing is recovered.

use crate::sat::cnf::{AllocationError, Formula, FormulaBuilder};
use crate::sat::literal::Literal;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bound on the length of a clause line; its terminating `0` must end
/// within this many characters.
pub const MAX_LINE_LENGTH: usize = 255;

#[derive(Debug, Error)]
pub enum DimacsParseError {
    #[error("can't open instance file {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read instance file")]
    Io(#[from] io::Error),

    #[error("missing \"p cnf <nbvar> <nbclauses>\" line")]
    MissingHeader,

    #[error("'{0}' is not a valid \"p cnf <nbvar> <nbclauses>\" line")]
    InvalidHeader(String),

    #[error("there is more than one \"p cnf <nbvar> <nbclauses>\" line")]
    DuplicateHeader,

    #[error("there is a clause line before the \"p cnf <nbvar> <nbclauses>\" line")]
    ClauseBeforeHeader,

    #[error("'{token}' in clause line {clause} is not a valid DIMACS literal")]
    InvalidLiteral { token: String, clause: usize },

    #[error("the variable {literal} in clause line {clause} is out of range of {num_vars}")]
    LiteralOutOfRange {
        literal: i32,
        clause: usize,
        num_vars: usize,
    },

    #[error(
        "clause line {clause} reaches the maximum line length of {max} without the end marker \"0\""
    )]
    LineTooLong { clause: usize, max: usize },

    #[error("expected to parse {expected} clauses, but parsed {parsed}")]
    IncorrectClauseCount { expected: usize, parsed: usize },

    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

/// Parses DIMACS formatted data from a `BufRead` source into a [`Formula`].
///
/// Tables are only allocated once a well-formed problem line has been read, so
/// a malformed header fails before any allocation happens.
///
/// # Errors
///
/// Any I/O failure or violation of the format, see [`DimacsParseError`].
pub fn parse_dimacs<R: BufRead>(reader: R) -> Result<Formula, DimacsParseError> {
    let mut problem: Option<(FormulaBuilder, usize)> = None;
    let mut clause = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let content = line.trim_start();

        match content.chars().next() {
            None | Some('c') => {}
            Some('%') => break,
            Some('p') => {
                if problem.is_some() {
                    return Err(DimacsParseError::DuplicateHeader);
                }
                let (num_vars, num_clauses) = parse_header(content)?;
                problem = Some((FormulaBuilder::new(num_vars, num_clauses)?, num_clauses));
            }
            Some(_) => {
                let Some((builder, _)) = problem.as_mut() else {
                    return Err(DimacsParseError::ClauseBeforeHeader);
                };
                let clause_number = builder.num_clauses() + 1;
                parse_clause_line(&line, builder.num_vars(), clause_number, &mut clause)?;
                builder.add_clause(&clause)?;
            }
        }
    }

    let (builder, expected) = problem.ok_or(DimacsParseError::MissingHeader)?;
    if builder.num_clauses() != expected {
        return Err(DimacsParseError::IncorrectClauseCount {
            expected,
            parsed: builder.num_clauses(),
        });
    }

    Ok(builder.build()?)
}

/// Parses a DIMACS CNF file specified by its path.
///
/// # Errors
///
/// If the file cannot be opened or its content is not valid DIMACS.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Formula, DimacsParseError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DimacsParseError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_dimacs(BufReader::new(file))
}

fn parse_header(line: &str) -> Result<(usize, usize), DimacsParseError> {
    let invalid = || DimacsParseError::InvalidHeader(line.trim_end().to_owned());
    let mut parts = line.split_whitespace();

    if parts.next() != Some("p") || parts.next() != Some("cnf") {
        return Err(invalid());
    }

    let mut count = || -> Result<usize, DimacsParseError> {
        parts
            .next()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(invalid)
    };
    let num_vars = count()?;
    let num_clauses = count()?;

    // Variables must be expressible as DIMACS literals, clauses as 32-bit counts.
    if parts.next().is_some()
        || i32::try_from(num_vars).is_err()
        || u32::try_from(num_clauses).is_err()
    {
        return Err(invalid());
    }

    Ok((num_vars, num_clauses))
}

/// Reads the literals of one clause line into `out`.
///
/// Tokens after the terminating `0` are ignored. A line that ends without a
/// `0` is accepted as long as it stays within [`MAX_LINE_LENGTH`].
fn parse_clause_line(
    line: &str,
    num_vars: usize,
    clause: usize,
    out: &mut Vec<Literal>,
) -> Result<(), DimacsParseError> {
    out.clear();
    let mut offset = 0;
    let mut terminated = false;

    for token in line.split(|c: char| c.is_ascii_whitespace()) {
        let end = offset + token.len();
        offset = end + 1;

        if token.is_empty() {
            continue;
        }
        if end > MAX_LINE_LENGTH {
            return Err(DimacsParseError::LineTooLong {
                clause,
                max: MAX_LINE_LENGTH,
            });
        }

        let value = token
            .parse::<i32>()
            .map_err(|_| DimacsParseError::InvalidLiteral {
                token: token.to_owned(),
                clause,
            })?;

        if value == 0 {
            terminated = true;
            break;
        }

        if value.unsigned_abs() as usize > num_vars {
            return Err(DimacsParseError::LiteralOutOfRange {
                literal: value,
                clause,
                num_vars,
            });
        }

        out.push(Literal::from_i32(value));
    }

    if !terminated && line.len() > MAX_LINE_LENGTH {
        return Err(DimacsParseError::LineTooLong {
            clause,
            max: MAX_LINE_LENGTH,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::clause::Occurrence;
    use std::io::Cursor;

    fn parse(content: &str) -> Result<Formula, DimacsParseError> {
        parse_dimacs(Cursor::new(content))
    }

    fn clause_values(formula: &Formula, id: usize) -> Vec<i32> {
        formula.clause(id).iter().map(|l| l.to_i32()).collect()
    }

    #[test]
    fn test_parse_simple_dimacs() {
        let dimacs_content = "c This is a comment\n\
                              p cnf 3 2\n\
                              1 -2 0\n\
                              2 3 0\n";
        let formula = parse(dimacs_content).unwrap();

        assert_eq!(formula.num_clauses(), 2, "Should parse 2 clauses");
        assert_eq!(formula.num_vars(), 3, "Number of variables mismatch");
        assert_eq!(clause_values(&formula, 0), vec![1, -2]);
        assert_eq!(clause_values(&formula, 1), vec![2, 3]);
    }

    #[test]
    fn test_parse_dimacs_with_empty_lines_and_end_marker() {
        let dimacs_content = "p cnf 2 2\n\
                              \n\
                              1 0\n\
                              \n\
                              -2 0\n\
                              %\n\
                              0\n";
        let formula = parse(dimacs_content).unwrap();

        assert_eq!(formula.num_clauses(), 2);
        assert_eq!(clause_values(&formula, 0), vec![1]);
        assert_eq!(clause_values(&formula, 1), vec![-2]);
    }

    #[test]
    fn test_trivial_instance() {
        let formula = parse("p cnf 1 1\n1 0\n").unwrap();
        assert_eq!(formula.num_vars(), 1);
        assert_eq!(
            formula.occurrences(1),
            &[Occurrence {
                clause: 0,
                polarity: true
            }]
        );
    }

    #[test]
    fn test_header_missing_clause_count() {
        let err = parse("p cnf 2\n1 2 0\n").unwrap_err();
        assert!(matches!(err, DimacsParseError::InvalidHeader(ref h) if h == "p cnf 2"));
    }

    #[test]
    fn test_header_wrong_format() {
        assert!(matches!(
            parse("p dnf 2 1\n1 0\n"),
            Err(DimacsParseError::InvalidHeader(_))
        ));
        assert!(matches!(
            parse("p cnf 2 1 7\n1 0\n"),
            Err(DimacsParseError::InvalidHeader(_))
        ));
        assert!(matches!(
            parse("p cnf -2 1\n1 0\n"),
            Err(DimacsParseError::InvalidHeader(_))
        ));
        assert!(matches!(
            parse("p cnf 4294967296 1\n1 0\n"),
            Err(DimacsParseError::InvalidHeader(_))
        ));
        assert!(matches!(
            parse("p cnf 1 18446744073709551615\n1 0\n"),
            Err(DimacsParseError::InvalidHeader(_))
        ));
        assert!(matches!(
            parse("p cnf 1 4294967296\n1 0\n"),
            Err(DimacsParseError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_duplicate_header() {
        let err = parse("p cnf 1 1\np cnf 1 1\n1 0\n").unwrap_err();
        assert!(matches!(err, DimacsParseError::DuplicateHeader));
    }

    #[test]
    fn test_clause_before_header() {
        let err = parse("1 0\np cnf 1 1\n").unwrap_err();
        assert!(matches!(err, DimacsParseError::ClauseBeforeHeader));
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            parse("c nothing here\n"),
            Err(DimacsParseError::MissingHeader)
        ));
    }

    #[test]
    fn test_literal_out_of_range() {
        let err = parse("p cnf 2 1\n3 0\n").unwrap_err();
        assert!(matches!(
            err,
            DimacsParseError::LiteralOutOfRange {
                literal: 3,
                clause: 1,
                num_vars: 2
            }
        ));

        let err = parse("p cnf 2 2\n1 0\n-5 2 0\n").unwrap_err();
        assert!(matches!(
            err,
            DimacsParseError::LiteralOutOfRange {
                literal: -5,
                clause: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_literal() {
        let err = parse("p cnf 2 1\n1 abc 0\n").unwrap_err();
        assert!(matches!(
            err,
            DimacsParseError::InvalidLiteral { ref token, clause: 1 } if token == "abc"
        ));
    }

    #[test]
    fn test_clause_count_mismatch() {
        assert!(matches!(
            parse("p cnf 2 3\n1 0\n2 0\n"),
            Err(DimacsParseError::IncorrectClauseCount {
                expected: 3,
                parsed: 2
            })
        ));
        assert!(matches!(
            parse("p cnf 2 1\n1 0\n2 0\n"),
            Err(DimacsParseError::IncorrectClauseCount {
                expected: 1,
                parsed: 2
            })
        ));
    }

    #[test]
    fn test_line_too_long() {
        let mut line = "1 ".repeat(MAX_LINE_LENGTH / 2 + 1);
        line.push_str("0\n");
        let content = format!("p cnf 1 1\n{line}");
        assert!(matches!(
            parse(&content),
            Err(DimacsParseError::LineTooLong { clause: 1, .. })
        ));

        let unterminated = format!("p cnf 1 1\n{}\n", "1 ".repeat(MAX_LINE_LENGTH));
        assert!(matches!(
            parse(&unterminated),
            Err(DimacsParseError::LineTooLong { clause: 1, .. })
        ));
    }

    #[test]
    fn test_terminator_within_limit_ignores_the_rest() {
        let mut line = String::from("1 -2 0 ");
        line.push_str(&"x".repeat(2 * MAX_LINE_LENGTH));
        let formula = parse(&format!("p cnf 2 1\n{line}\n")).unwrap();
        assert_eq!(clause_values(&formula, 0), vec![1, -2]);
    }

    #[test]
    fn test_short_line_without_terminator_is_accepted() {
        let formula = parse("p cnf 3 1\n1 2 3\n").unwrap();
        assert_eq!(clause_values(&formula, 0), vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_clause() {
        let formula = parse("p cnf 1 1\n0\n").unwrap();
        assert_eq!(formula.num_clauses(), 1);
        assert!(formula.clause(0).is_empty());
    }

    #[test]
    fn test_parse_no_clauses() {
        let formula = parse("p cnf 0 0\n").unwrap();
        assert!(formula.is_empty());
        assert_eq!(formula.num_vars(), 0);
    }

    #[test]
    fn test_missing_file() {
        let err = parse_file("/definitely/not/here.cnf").unwrap_err();
        assert!(matches!(err, DimacsParseError::Open { .. }));
    }

    /// Renders random formulas, parses them back and checks that the clause
    /// table and occurrence index hold exactly the literals of the text.
    #[test]
    fn test_generated_instances_parse_back() {
        let mut rng = fastrand::Rng::with_seed(0xD1AC5);

        for _ in 0..50 {
            let num_vars = rng.usize(1..20);
            let num_clauses = rng.usize(0..40);
            let clauses: Vec<Vec<i32>> = (0..num_clauses)
                .map(|_| {
                    (0..rng.usize(1..5))
                        .map(|_| {
                            let var = i32::try_from(rng.usize(1..=num_vars)).unwrap();
                            if rng.bool() { var } else { -var }
                        })
                        .collect()
                })
                .collect();

            let mut text = format!("c generated\np cnf {num_vars} {num_clauses}\n");
            for clause in &clauses {
                for lit in clause {
                    text.push_str(&format!("{lit} "));
                }
                text.push_str("0\n");
            }

            let formula = parse(&text).unwrap();
            assert_eq!(formula.num_clauses(), num_clauses);
            for (id, clause) in clauses.iter().enumerate() {
                assert_eq!(&clause_values(&formula, id), clause);
            }

            let mut from_index: Vec<(usize, i32)> = formula
                .variables()
                .flat_map(|var| {
                    formula.occurrences(var).iter().map(move |occ| {
                        let var = i32::try_from(var).unwrap();
                        (occ.clause, if occ.polarity { var } else { -var })
                    })
                })
                .collect();
            let mut from_text: Vec<(usize, i32)> = clauses
                .iter()
                .enumerate()
                .flat_map(|(id, clause)| clause.iter().map(move |&lit| (id, lit)))
                .collect();
            from_index.sort_unstable();
            from_text.sort_unstable();
            assert_eq!(from_index, from_text);
        }
    }
}
