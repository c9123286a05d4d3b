//! Behavior strategy profiles.
//!
//! A [`BehaviorProfile`] stores one probability per live action, laid out
//! player-major then infoset-major, so each infoset owns one contiguous block.
//! The optimizer does not see those blocks directly: it works on the *free
//! vector*, which drops the last live action of every infoset. That action is
//! implied by the simplex constraint and recomputed whenever the free vector
//! is written back. [`BehaviorProfile::free_vector`] and
//! [`BehaviorProfile::set_free_vector`] are the only place this mapping lives.

use std::fmt;
use std::ops::{Index, IndexMut};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::{GameTree, Support};
use crate::liap::error::LiapError;
use crate::liap::value;

/// A behavior strategy profile restricted to a support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorProfile {
    support: Support,
    /// Start of each infoset's block: `[player][infoset]`.
    offsets: Vec<Vec<usize>>,
    /// Block lengths in flat order.
    lengths: Vec<usize>,
    probs: Vec<f64>,
}

impl BehaviorProfile {
    /// Uniform profile over the live actions of every infoset.
    pub fn centroid(support: &Support) -> Self {
        let mut offsets = Vec::with_capacity(support.num_players());
        let mut probs = Vec::with_capacity(support.total_actions());
        for player in 0..support.num_players() {
            let mut row = Vec::with_capacity(support.num_infosets(player));
            for infoset in 0..support.num_infosets(player) {
                row.push(probs.len());
                let n = support.num_actions(player, infoset);
                probs.extend(std::iter::repeat(1.0 / n as f64).take(n));
            }
            offsets.push(row);
        }

        Self {
            support: support.clone(),
            offsets,
            lengths: support.block_lengths(),
            probs,
        }
    }

    /// Profile from explicit live-action probabilities in flat order.
    ///
    /// The simplex constraint is not checked here.
    pub fn from_probs(support: &Support, probs: Vec<f64>) -> Result<Self, LiapError> {
        let mut profile = Self::centroid(support);
        if probs.len() != profile.probs.len() {
            return Err(LiapError::DimensionMismatch {
                expected: profile.probs.len(),
                actual: probs.len(),
            });
        }
        profile.probs = probs;
        Ok(profile)
    }

    /// Support the profile is defined on.
    pub fn support(&self) -> &Support {
        &self.support
    }

    /// Number of stored probabilities (live actions).
    pub fn len(&self) -> usize {
        self.probs.len()
    }

    /// Whether the profile has no live actions at all.
    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// All probabilities in flat order.
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }

    /// Live action counts per infoset, in flat order.
    pub fn block_lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Probability of the `action`-th live action at an infoset.
    pub fn get(&self, player: usize, infoset: usize, action: usize) -> f64 {
        self[(player, infoset, action)]
    }

    /// Set the probability of the `action`-th live action at an infoset.
    pub fn set(&mut self, player: usize, infoset: usize, action: usize, prob: f64) {
        self[(player, infoset, action)] = prob;
    }

    /// Probabilities of one infoset's live actions.
    pub fn infoset(&self, player: usize, infoset: usize) -> &[f64] {
        let start = self.offsets[player][infoset];
        &self.probs[start..start + self.support.num_actions(player, infoset)]
    }

    /// Mutable probabilities of one infoset's live actions.
    pub fn infoset_mut(&mut self, player: usize, infoset: usize) -> &mut [f64] {
        let start = self.offsets[player][infoset];
        let n = self.support.num_actions(player, infoset);
        &mut self.probs[start..start + n]
    }

    pub(crate) fn offset(&self, player: usize, infoset: usize) -> usize {
        self.offsets[player][infoset]
    }

    /// Number of free coordinates.
    pub fn free_len(&self) -> usize {
        self.probs.len() - self.lengths.len()
    }

    /// The free vector: every probability except the last live one per infoset.
    pub fn free_vector(&self) -> Vec<f64> {
        let mut x = Vec::with_capacity(self.free_len());
        let mut start = 0;
        for &n in &self.lengths {
            x.extend_from_slice(&self.probs[start..start + n - 1]);
            start += n;
        }
        x
    }

    /// Overwrite the free coordinates and re-impose the simplex constraint.
    ///
    /// The last live action of each infoset becomes one minus the sum of the
    /// others, so every block sums to one whatever `x` holds.
    ///
    /// # Panics
    /// Panics if `x.len()` differs from [`free_len`](Self::free_len).
    pub fn set_free_vector(&mut self, x: &[f64]) {
        assert_eq!(
            x.len(),
            self.free_len(),
            "free vector length does not match the profile"
        );
        let mut k = 0;
        let mut start = 0;
        for &n in &self.lengths {
            let block = &mut self.probs[start..start + n];
            let free = &x[k..k + n - 1];
            block[..n - 1].copy_from_slice(free);
            block[n - 1] = 1.0 - free.iter().sum::<f64>();
            k += n - 1;
            start += n;
        }
    }

    /// Whether every probability exceeds `alpha`.
    pub fn is_interior(&self, alpha: f64) -> bool {
        self.probs.iter().all(|&p| p > alpha)
    }

    /// Pull the profile toward the centroid: `p = alpha * c + (1 - alpha) * p`.
    pub fn blend_toward_centroid(&mut self, alpha: f64) {
        let centroid = Self::centroid(&self.support);
        for (p, c) in self.probs.iter_mut().zip(&centroid.probs) {
            *p = c * alpha + *p * (1.0 - alpha);
        }
    }

    /// Replace the profile with a random point of the simplex product.
    ///
    /// Each action but the last draws a uniform share, redrawn until the
    /// running sum stays within one; the last action takes the remainder.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut start = 0;
        for &n in &self.lengths {
            let block = &mut self.probs[start..start + n];
            let mut sum = 0.0;
            for slot in block[..n - 1].iter_mut() {
                let share = loop {
                    let draw: f64 = rng.gen();
                    if draw + sum <= 1.0 {
                        break draw;
                    }
                };
                *slot = share;
                sum += share;
            }
            block[n - 1] = 1.0 - sum;
            start += n;
        }
    }

    /// Largest absolute probability difference, infinite if the supports differ.
    pub fn max_abs_diff(&self, other: &BehaviorProfile) -> f64 {
        if self.support != other.support {
            return f64::INFINITY;
        }
        self.probs
            .iter()
            .zip(&other.probs)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    /// Whether every probability is within `tol` of `other`'s.
    pub fn approx_eq(&self, other: &BehaviorProfile, tol: f64) -> bool {
        self.max_abs_diff(other) <= tol
    }

    /// Probabilities over all actions of an infoset, zero outside the support.
    pub fn full_action_probs(&self, tree: &GameTree, player: usize, infoset: usize) -> Vec<f64> {
        let mut full = vec![0.0; tree.infoset(player, infoset).num_actions()];
        for (&action, &p) in self
            .support
            .actions(player, infoset)
            .iter()
            .zip(self.infoset(player, infoset))
        {
            full[action] = p;
        }
        full
    }

    /// Liapunov value of the profile on `tree`.
    pub fn liap_value(&self, tree: &GameTree) -> f64 {
        value::liap_value(tree, self)
    }
}

impl Index<(usize, usize, usize)> for BehaviorProfile {
    type Output = f64;

    fn index(&self, (player, infoset, action): (usize, usize, usize)) -> &f64 {
        debug_assert!(action < self.support.num_actions(player, infoset));
        &self.probs[self.offsets[player][infoset] + action]
    }
}

impl IndexMut<(usize, usize, usize)> for BehaviorProfile {
    fn index_mut(&mut self, (player, infoset, action): (usize, usize, usize)) -> &mut f64 {
        debug_assert!(action < self.support.num_actions(player, infoset));
        &mut self.probs[self.offsets[player][infoset] + action]
    }
}

impl fmt::Display for BehaviorProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut start = 0;
        for (i, &n) in self.lengths.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "(")?;
            for (k, p) in self.probs[start..start + n].iter().enumerate() {
                if k > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:.6}", p)?;
            }
            write!(f, ")")?;
            start += n;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::TreeBuilder;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// One-player tree with one infoset per entry of `sizes`, reached by chance.
    fn support_for(sizes: &[usize]) -> Support {
        let mut b = TreeBuilder::new(1);
        let mut branches = Vec::new();
        for (i, &n) in sizes.iter().enumerate() {
            let iset = b
                .add_infoset(0, format!("i{}", i), (0..n).map(|a| format!("a{}", a)))
                .unwrap();
            let kids = (0..n).map(|_| b.terminal(vec![0.0]).unwrap()).collect();
            let node = b.decision(iset, kids).unwrap();
            branches.push((1.0 / sizes.len() as f64, node));
        }
        let root = b.chance(branches).unwrap();
        Support::full(&b.build(root).unwrap())
    }

    #[test]
    fn test_centroid_layout() {
        let support = support_for(&[2, 3, 1]);
        let p = BehaviorProfile::centroid(&support);
        assert_eq!(p.len(), 6);
        assert_eq!(p.free_len(), 3);
        assert_eq!(p.infoset(0, 0), &[0.5, 0.5]);
        assert!((p.get(0, 1, 2) - 1.0 / 3.0).abs() < 1e-15);
        assert_eq!(p.infoset(0, 2), &[1.0]);
    }

    #[test]
    fn test_free_vector_skips_last_action_per_infoset() {
        let support = support_for(&[3, 2]);
        let p = BehaviorProfile::from_probs(&support, vec![0.2, 0.3, 0.5, 0.9, 0.1]).unwrap();
        assert_eq!(p.free_vector(), vec![0.2, 0.3, 0.9]);
    }

    #[test]
    fn test_set_free_vector_reimposes_simplex() {
        let support = support_for(&[3, 2, 1]);
        let mut p = BehaviorProfile::centroid(&support);
        p.set_free_vector(&[0.7, 0.6, 0.25]);
        assert_eq!(&p.infoset(0, 0)[..2], &[0.7, 0.6]);
        assert!((p.get(0, 0, 2) + 0.3).abs() < 1e-12);
        assert_eq!(p.infoset(0, 1), &[0.25, 0.75]);
        assert_eq!(p.infoset(0, 2), &[1.0]);
    }

    #[test]
    #[should_panic(expected = "free vector length")]
    fn test_set_free_vector_rejects_wrong_length() {
        let support = support_for(&[2, 2]);
        let mut p = BehaviorProfile::centroid(&support);
        p.set_free_vector(&[0.5]);
    }

    #[test]
    fn test_from_probs_dimension_mismatch() {
        let support = support_for(&[2]);
        let err = BehaviorProfile::from_probs(&support, vec![1.0]).unwrap_err();
        assert!(matches!(err, LiapError::DimensionMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_blend_toward_centroid_makes_interior() {
        let support = support_for(&[2, 3]);
        let mut p =
            BehaviorProfile::from_probs(&support, vec![1.0, 0.0, 0.0, 0.0, 1.0]).unwrap();
        assert!(!p.is_interior(1e-8));
        p.blend_toward_centroid(1e-6);
        assert!(p.is_interior(1e-8));
        assert!(p.approx_eq(
            &BehaviorProfile::from_probs(&support, vec![1.0, 0.0, 0.0, 0.0, 1.0]).unwrap(),
            1e-6
        ));
        let sums: Vec<f64> = [(0, 0), (0, 1)]
            .iter()
            .map(|&(pl, i)| p.infoset(pl, i).iter().sum())
            .collect();
        assert!(sums.iter().all(|s| (s - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_full_action_probs_zero_outside_support() {
        let mut b = TreeBuilder::new(1);
        let iset = b.add_infoset(0, "x", ["a", "b", "c"]).unwrap();
        let kids = (0..3).map(|_| b.terminal(vec![0.0]).unwrap()).collect();
        let root = b.decision(iset, kids).unwrap();
        let tree = b.build(root).unwrap();
        let support = Support::from_actions(&tree, vec![vec![vec![0, 2]]]).unwrap();
        let p = BehaviorProfile::from_probs(&support, vec![0.25, 0.75]).unwrap();
        assert_eq!(p.full_action_probs(&tree, 0, 0), vec![0.25, 0.0, 0.75]);
    }

    #[test]
    fn test_display() {
        let support = support_for(&[2, 1]);
        let p = BehaviorProfile::centroid(&support);
        assert_eq!(p.to_string(), "(0.500000, 0.500000) (1.000000)");
    }

    proptest! {
        #[test]
        fn prop_free_vector_round_trip(
            sizes in prop::collection::vec(1usize..5, 1..5),
            seed in any::<u64>(),
        ) {
            let support = support_for(&sizes);
            let mut p = BehaviorProfile::centroid(&support);
            p.randomize(&mut StdRng::seed_from_u64(seed));

            let mut q = BehaviorProfile::centroid(&support);
            q.set_free_vector(&p.free_vector());
            prop_assert!(q.approx_eq(&p, 1e-12));
        }

        #[test]
        fn prop_random_profiles_on_simplex(
            sizes in prop::collection::vec(1usize..6, 1..5),
            seed in any::<u64>(),
        ) {
            let support = support_for(&sizes);
            let mut p = BehaviorProfile::centroid(&support);
            let mut rng = StdRng::seed_from_u64(seed);
            for _ in 0..5 {
                p.randomize(&mut rng);
                prop_assert!(p.as_slice().iter().all(|&x| x >= 0.0));
                for i in 0..sizes.len() {
                    let sum: f64 = p.infoset(0, i).iter().sum();
                    prop_assert!((sum - 1.0).abs() < 1e-12);
                }
            }
        }

        #[test]
        fn prop_unnormalized_free_vector_still_sums_to_one(
            x in prop::collection::vec(-2.0f64..2.0, 4),
        ) {
            let support = support_for(&[3, 2, 2]);
            let mut p = BehaviorProfile::centroid(&support);
            p.set_free_vector(&x);
            for i in 0..3 {
                let sum: f64 = p.infoset(0, i).iter().sum();
                prop_assert!((sum - 1.0).abs() < 1e-12);
            }
        }
    }
}
