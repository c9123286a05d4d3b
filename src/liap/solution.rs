//! Accepted equilibria and run results.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::liap::error::LiapError;
use crate::liap::profile::BehaviorProfile;

/// Which method produced a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// Liapunov function minimization.
    Liapunov,
}

/// A profile accepted as an approximate equilibrium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSolution {
    /// The equilibrium profile.
    pub profile: BehaviorProfile,
    /// Tolerance the solution was accepted under.
    pub epsilon: f64,
    /// Producing method.
    pub algorithm: Algorithm,
    /// Liapunov value at acceptance.
    pub liap_value: f64,
}

impl BehaviorSolution {
    /// Tag `profile` as a Liapunov solution.
    pub fn new(profile: BehaviorProfile, epsilon: f64, liap_value: f64) -> Self {
        Self {
            profile,
            epsilon,
            algorithm: Algorithm::Liapunov,
            liap_value,
        }
    }

    /// Whether `other` is the same solution up to `epsilon` in every
    /// probability.
    pub fn equals(&self, other: &BehaviorProfile) -> bool {
        self.profile.max_abs_diff(other) <= self.epsilon
    }
}

/// Everything a search run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiapOutcome {
    /// Distinct accepted solutions in acceptance order.
    pub solutions: Vec<BehaviorSolution>,
    /// Objective evaluations over all tries.
    pub evaluations: u64,
    /// Outer minimizer passes over all tries.
    pub iterations: u64,
    /// Restart tries started.
    pub tries: usize,
    /// False when the run was interrupted.
    pub complete: bool,
}

impl LiapOutcome {
    /// Empty, complete outcome.
    pub fn new() -> Self {
        Self {
            complete: true,
            ..Default::default()
        }
    }

    /// Whether at least one solution was found.
    pub fn found(&self) -> bool {
        !self.solutions.is_empty()
    }

    /// Fold another run's counters into this one.
    pub fn absorb_counters(&mut self, other: &LiapOutcome) {
        self.evaluations += other.evaluations;
        self.iterations += other.iterations;
        self.tries += other.tries;
        self.complete &= other.complete;
    }

    /// Save to JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), LiapError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Support;
    use crate::games::matrix::decision;

    #[test]
    fn test_equals_within_epsilon() {
        let tree = decision(&[1.0, 0.0]).unwrap();
        let support = Support::full(&tree);
        let base = BehaviorProfile::from_probs(&support, vec![0.3, 0.7]).unwrap();
        let solution = BehaviorSolution::new(base, 1e-5, 0.0);

        let near = BehaviorProfile::from_probs(&support, vec![0.300001, 0.699999]).unwrap();
        let far = BehaviorProfile::from_probs(&support, vec![0.31, 0.69]).unwrap();
        assert!(solution.equals(&near));
        assert!(!solution.equals(&far));
        assert_eq!(solution.algorithm, Algorithm::Liapunov);
    }

    #[test]
    fn test_outcome_counters() {
        let mut total = LiapOutcome::new();
        assert!(total.complete);
        assert!(!total.found());

        let part = LiapOutcome {
            evaluations: 12,
            iterations: 3,
            tries: 2,
            complete: false,
            ..LiapOutcome::new()
        };
        total.absorb_counters(&part);
        total.absorb_counters(&part);
        assert_eq!(total.evaluations, 24);
        assert_eq!(total.iterations, 6);
        assert_eq!(total.tries, 4);
        assert!(!total.complete);
    }

    #[test]
    fn test_save_json() {
        let tree = decision(&[1.0, 0.0]).unwrap();
        let profile = BehaviorProfile::centroid(&Support::full(&tree));
        let outcome = LiapOutcome {
            solutions: vec![BehaviorSolution::new(profile, 1e-5, 0.25)],
            ..LiapOutcome::new()
        };

        let path = std::env::temp_dir().join(format!("liap_outcome_{}.json", std::process::id()));
        outcome.save_json(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let loaded: LiapOutcome = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded.solutions.len(), 1);
        assert!(loaded.solutions[0].profile.approx_eq(&outcome.solutions[0].profile, 1e-15));
        assert!((loaded.solutions[0].liap_value - 0.25).abs() < 1e-15);
        assert!(text.contains("\"Liapunov\""));
    }
}
