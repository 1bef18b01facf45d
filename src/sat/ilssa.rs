#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Iterated Local Search with a Simulated Annealing acceptance step (ILS/SA).
//!
//! Every iteration after the first starts with a perturbation: a uniformly
//! chosen variable is flipped straight into the search state. The scores are
//! *not* rebuilt for it, so the following scan reads the scores of the
//! previous iteration against the updated unsatisfied count.
//!
//! When the scan then picks a move, the decision lists the perturbed variable
//! before the chosen one, so applying it undoes the perturbation and the net
//! step is the chosen flip alone. The perturbation only persists when no move
//! is found or a restart is requested.
//!
//! The temperature decays as `temperature_max * exp(-iteration / num_vars)`;
//! once it falls below `temperature_min` the attempt is abandoned.
//!
//! The scan collects the variables of best quality (the perturbed one
//! excluded). A strictly better variable always resets the candidates; a tie
//! with the current best goes through the Metropolis gate
//! `p = 1 / (1 + exp(-(unsatisfied - quality) / temperature))` and is admitted
//! when a uniform draw in `[0, 1)` exceeds `p`.

use crate::sat::cnf::{AllocationError, Formula, try_with_capacity};
use crate::sat::configs::SolverConfig;
use crate::sat::literal::Variable;
use crate::sat::state::SearchState;
use crate::sat::strategy::{Decision, SearchStrategy};
use log::trace;
use smallvec::smallvec;

#[derive(Debug, Clone, PartialEq)]
pub struct IteratedLocalSearch {
    num_vars: usize,
    temperature_max: f64,
    temperature_min: f64,
    candidates: Vec<Variable>,
}

impl IteratedLocalSearch {
    /// # Errors
    ///
    /// If the candidate buffer cannot be allocated.
    pub fn new(num_vars: usize, config: &SolverConfig) -> Result<Self, AllocationError> {
        Ok(Self {
            num_vars,
            temperature_max: config.temperature_max,
            temperature_min: config.temperature_min,
            candidates: try_with_capacity(num_vars, "annealing candidate")?,
        })
    }

    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn temperature(&self, iteration: usize) -> f64 {
        self.temperature_max * (-(iteration as f64) / self.num_vars as f64).exp()
    }

    /// Probability of the Metropolis criterion for a move improving the
    /// unsatisfied count by `improvement`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn acceptance(improvement: i64, temperature: f64) -> f64 {
        1.0 / (1.0 + (-(improvement as f64) / temperature).exp())
    }
}

impl SearchStrategy for IteratedLocalSearch {
    fn initialise(&mut self, _restart: usize) {
        self.candidates.clear();
    }

    fn decide(
        &mut self,
        iteration: usize,
        formula: &Formula,
        state: &mut SearchState,
        rng: &mut fastrand::Rng,
    ) -> Decision {
        let n = self.num_vars;
        if n == 0 {
            return Decision::NoMove;
        }

        let perturbed = if iteration > 0 {
            let var = rng.usize(1..=n);
            state.flip(formula, &[var]);
            Some(var)
        } else {
            None
        };

        let temperature = self.temperature(iteration);
        if temperature < self.temperature_min {
            trace!("iteration {iteration}: temperature {temperature:.4} exhausted");
            return Decision::RestartNeeded;
        }

        let current = state.unsatisfied_i64();
        let mut best = current;
        self.candidates.clear();

        for var in 1..=n {
            if perturbed == Some(var) {
                continue;
            }

            let quality = state.quality(var);
            if quality < best {
                best = quality;
                self.candidates.clear();
                self.candidates.push(var);
            } else if quality == best
                && rng.f64() > Self::acceptance(current - quality, temperature)
            {
                self.candidates.push(var);
            }
        }

        if self.candidates.is_empty() {
            return Decision::NoMove;
        }

        let chosen = self.candidates[rng.usize(..self.candidates.len())];
        match perturbed {
            Some(var) => Decision::Flip(smallvec![var, chosen]),
            None => Decision::flip(chosen),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::assignment::Assignment;
    use crate::sat::dimacs::parse_dimacs;
    use std::io::Cursor;

    fn formula(content: &str) -> Formula {
        parse_dimacs(Cursor::new(content)).unwrap()
    }

    fn state_with(formula: &Formula, values: &[bool]) -> SearchState {
        let mut assignment = Assignment::new(formula.num_vars());
        for (i, &v) in values.iter().enumerate() {
            assignment.set(i + 1, v);
        }
        let mut state = SearchState::new(formula).unwrap();
        state.load(formula, assignment);
        state
    }

    fn ilssa(formula: &Formula, config: &SolverConfig) -> IteratedLocalSearch {
        IteratedLocalSearch::new(formula.num_vars(), config).unwrap()
    }

    #[test]
    fn test_temperature_decay() {
        let f = formula("p cnf 4 1\n1 0\n");
        let s = ilssa(&f, &SolverConfig::default());

        assert!((s.temperature(0) - 0.3).abs() < 1e-12);
        assert!((s.temperature(4) - 0.3 * (-1.0_f64).exp()).abs() < 1e-12);
        assert!(s.temperature(13) > 0.01);
        assert!(s.temperature(14) < 0.01);
    }

    #[test]
    fn test_acceptance() {
        assert!((IteratedLocalSearch::acceptance(0, 0.3) - 0.5).abs() < 1e-12);
        assert!(IteratedLocalSearch::acceptance(1, 0.3) > 0.9);
        assert!(IteratedLocalSearch::acceptance(-1, 0.3) < 0.1);
    }

    #[test]
    fn test_cold_restart_keeps_perturbation() {
        let f = formula("p cnf 3 4\n1 2 0\n-1 3 0\n-2 -3 0\n2 3 0\n");
        let mut s = ilssa(&f, &SolverConfig::default());

        for seed in 0..16 {
            let mut state = state_with(&f, &[true, false, true]);
            let before = state.clone();

            let mut rng = fastrand::Rng::with_seed(seed);
            let mut replay = rng.clone();
            let perturbed = replay.usize(1..=3);

            // exp(-100 / 3) * 0.3 is far below the floor.
            let decision = s.decide(100, &f, &mut state, &mut rng);
            assert_eq!(decision, Decision::RestartNeeded);

            let changed: Vec<_> = f
                .variables()
                .filter(|&v| state.assignment().value(v) != before.assignment().value(v))
                .collect();
            assert_eq!(changed, vec![perturbed]);
            assert_eq!(state.unsatisfied(), f.count_unsatisfied(state.assignment()));
            assert_eq!(state.scores(), before.scores());
        }
    }

    #[test]
    fn test_no_perturbation_on_first_iteration() {
        let f = formula("p cnf 3 1\n1 2 3 0\n");
        let config = SolverConfig {
            temperature_min: 1.0,
            ..SolverConfig::default()
        };
        let mut s = ilssa(&f, &config);
        let mut state = state_with(&f, &[false, true, false]);
        let before = state.clone();

        let mut rng = fastrand::Rng::with_seed(4);
        assert_eq!(
            s.decide(0, &f, &mut state, &mut rng),
            Decision::RestartNeeded
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_ties_pass_inverted_metropolis_gate() {
        // With everything false: 1 scores -1, 2 and 3 score 0, one clause unsatisfied.
        let f = formula("p cnf 3 3\n3 0\n-3 1 0\n-1 2 0\n");
        let mut s = ilssa(&f, &SolverConfig::default());

        for seed in 0..64 {
            let mut state = state_with(&f, &[false, false, false]);
            assert_eq!(state.unsatisfied(), 1);
            assert_eq!(state.score(1), -1);
            assert_eq!(state.score(2), 0);
            assert_eq!(state.score(3), 0);

            let mut rng = fastrand::Rng::with_seed(seed);
            let mut replay = rng.clone();
            let candidates: Vec<Variable> = [2, 3]
                .into_iter()
                .filter(|_| replay.f64() > 0.5)
                .collect();
            let expected = if candidates.is_empty() {
                Decision::NoMove
            } else {
                Decision::flip(candidates[replay.usize(..candidates.len())])
            };

            assert_eq!(s.decide(0, &f, &mut state, &mut rng), expected);
        }
    }

    #[test]
    fn test_strict_improvement_resets_candidates() {
        // Both variables repair one of two unit clauses.
        let f = formula("p cnf 2 2\n1 0\n2 0\n");
        let mut s = ilssa(&f, &SolverConfig::default());
        let threshold = IteratedLocalSearch::acceptance(1, 0.3);

        for seed in 0..64 {
            let mut state = state_with(&f, &[false, false]);
            let mut rng = fastrand::Rng::with_seed(seed);
            let mut replay = rng.clone();

            let mut candidates = vec![1];
            if replay.f64() > threshold {
                candidates.push(2);
            }
            let expected = Decision::flip(candidates[replay.usize(..candidates.len())]);

            assert_eq!(s.decide(0, &f, &mut state, &mut rng), expected);
        }
    }

    #[test]
    fn test_perturbed_variable_is_excluded() {
        let f = formula("p cnf 4 4\n1 0\n2 0\n3 0\n4 0\n");
        let mut s = ilssa(&f, &SolverConfig::default());

        for seed in 0..64 {
            let mut state = state_with(&f, &[false, false, false, false]);
            let mut rng = fastrand::Rng::with_seed(seed);
            let mut replay = rng.clone();
            let perturbed = replay.usize(1..=4);

            let decision = s.decide(1, &f, &mut state, &mut rng);
            assert!(state.assignment().value(perturbed));
            assert_eq!(state.unsatisfied(), 3);
            if let Decision::Flip(vars) = decision {
                assert_eq!(vars[0], perturbed);
                assert!(!vars[1..].contains(&perturbed));
            }
        }
    }

    #[test]
    fn test_chosen_move_undoes_perturbation() {
        let f = formula("p cnf 4 4\n1 0\n2 0\n3 0\n4 0\n");
        let mut s = ilssa(&f, &SolverConfig::default());

        for seed in 0..64 {
            let mut state = state_with(&f, &[false, false, false, false]);
            let before = state.assignment().clone();
            let mut rng = fastrand::Rng::with_seed(seed);

            let Decision::Flip(vars) = s.decide(1, &f, &mut state, &mut rng) else {
                panic!("expected a flip");
            };
            assert_eq!(vars.len(), 2);
            state.flip(&f, &vars);

            let changed: Vec<_> = f
                .variables()
                .filter(|&v| state.assignment().value(v) != before.value(v))
                .collect();
            assert_eq!(changed, vec![vars[1]]);
            assert_eq!(state.unsatisfied(), 3);
            assert_eq!(state.unsatisfied(), f.count_unsatisfied(state.assignment()));
        }
    }
}
