//! Scalar objectives for the direction-set minimizer.

use crate::game::GameTree;
use crate::liap::profile::BehaviorProfile;

/// A scalar function of a flat vector that counts its own evaluations.
pub trait Objective {
    /// Value at `x`.
    fn evaluate(&mut self, x: &[f64]) -> f64;

    /// Number of calls to [`evaluate`](Objective::evaluate) so far.
    fn evaluations(&self) -> u64;
}

/// Liapunov value of a profile, parametrized by its free vector.
///
/// Every evaluation writes `x` into the bound profile first, so the profile
/// always satisfies the simplex constraint when it is scored.
pub struct LiapObjective<'a> {
    tree: &'a GameTree,
    profile: BehaviorProfile,
    evaluations: u64,
}

impl<'a> LiapObjective<'a> {
    /// Bind `profile` to `tree`.
    pub fn new(tree: &'a GameTree, profile: BehaviorProfile) -> Self {
        Self {
            tree,
            profile,
            evaluations: 0,
        }
    }

    /// Profile at the most recently evaluated point.
    pub fn profile(&self) -> &BehaviorProfile {
        &self.profile
    }

    /// Release the bound profile.
    pub fn into_profile(self) -> BehaviorProfile {
        self.profile
    }
}

impl Objective for LiapObjective<'_> {
    fn evaluate(&mut self, x: &[f64]) -> f64 {
        self.evaluations += 1;
        self.profile.set_free_vector(x);
        self.profile.liap_value(self.tree)
    }

    fn evaluations(&self) -> u64 {
        self.evaluations
    }
}

/// Any closure as an [`Objective`].
pub struct FnObjective<F> {
    f: F,
    evaluations: u64,
}

impl<F: FnMut(&[f64]) -> f64> FnObjective<F> {
    /// Wrap `f`.
    pub fn new(f: F) -> Self {
        Self { f, evaluations: 0 }
    }
}

impl<F: FnMut(&[f64]) -> f64> Objective for FnObjective<F> {
    fn evaluate(&mut self, x: &[f64]) -> f64 {
        self.evaluations += 1;
        (self.f)(x)
    }

    fn evaluations(&self) -> u64 {
        self.evaluations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Support;
    use crate::games::matrix::decision;

    #[test]
    fn test_liap_objective_counts_and_writes_back() {
        let tree = decision(&[1.0, 0.0, 0.0]).unwrap();
        let profile = BehaviorProfile::centroid(&Support::full(&tree));
        let mut objective = LiapObjective::new(&tree, profile);
        assert_eq!(objective.evaluations(), 0);

        let value = objective.evaluate(&[1.0, 0.0]);
        assert!(value.abs() < 1e-15);
        assert_eq!(objective.evaluations(), 1);
        assert_eq!(objective.profile().as_slice(), &[1.0, 0.0, 0.0]);

        // Unnormalized input is folded back onto the simplex.
        objective.evaluate(&[0.8, 0.7]);
        let sum: f64 = objective.profile().as_slice().iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert_eq!(objective.evaluations(), 2);
    }

    #[test]
    fn test_fn_objective() {
        let mut objective = FnObjective::new(|x: &[f64]| x.iter().map(|v| v * v).sum());
        assert_eq!(objective.evaluate(&[3.0, 4.0]), 25.0);
        assert_eq!(objective.evaluate(&[0.0]), 0.0);
        assert_eq!(objective.evaluations(), 2);
    }
}
