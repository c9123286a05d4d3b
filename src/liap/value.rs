//! Liapunov value of a behavior profile.
//!
//! For every infoset `I` of player `i` the counterfactual action value is
//!
//! ```text
//! v(I, a) = Σ_{h ∈ I} π₋ᵢ(h) · uᵢ(h·a)
//! ```
//!
//! where `π₋ᵢ(h)` is the probability chance and the other players contribute
//! to reaching `h`, and `uᵢ` is the expected payoff when play continues with
//! the profile. With `v(I) = Σ_a p(a) · v(I, a)` the Liapunov value is
//!
//! ```text
//! L(p) = Σ_I [ Σ_a max(0, v(I, a) − v(I))²
//!            + BIG1 · Σ_a min(0, p(a))²
//!            + BIG2 · (Σ_a p(a) − 1)² ]
//! ```
//!
//! It is zero exactly when no player gains by switching to any single action
//! at any infoset, and positive otherwise. Only live actions take part.

use crate::game::{GameTree, NodeId, NodeKind};
use crate::liap::profile::BehaviorProfile;

/// Weight on negative probabilities.
const BIG1: f64 = 10_000.0;
/// Weight on infoset probability mass differing from one.
const BIG2: f64 = 100.0;

/// Liapunov value of `profile` on `tree`.
pub fn liap_value(tree: &GameTree, profile: &BehaviorProfile) -> f64 {
    let values = counterfactual_values(tree, profile);

    let mut result = 0.0;
    let mut start = 0;
    for &n in profile.block_lengths() {
        let probs = &profile.as_slice()[start..start + n];
        let action_values = &values[start..start + n];

        let mut avg = 0.0;
        let mut sum = 0.0;
        for (&p, &v) in probs.iter().zip(action_values) {
            avg += p * v;
            sum += p;
            if p < 0.0 {
                result += BIG1 * p * p;
            }
        }
        for &v in action_values {
            let gain = v - avg;
            if gain > 0.0 {
                result += gain * gain;
            }
        }
        result += BIG2 * (sum - 1.0) * (sum - 1.0);

        start += n;
    }
    result
}

/// Expected payoff of every player at the root under `profile`.
pub fn expected_payoffs(tree: &GameTree, profile: &BehaviorProfile) -> Vec<f64> {
    let mut walk = Walk::new(tree, profile);
    let reach = vec![1.0; tree.num_players()];
    walk.visit(tree.root(), &reach)
}

/// Counterfactual value of every live action, aligned with the profile's
/// flat probability layout.
pub fn counterfactual_values(tree: &GameTree, profile: &BehaviorProfile) -> Vec<f64> {
    let mut walk = Walk::new(tree, profile);
    let reach = vec![1.0; tree.num_players()];
    walk.visit(tree.root(), &reach);
    walk.action_values
}

struct Walk<'a> {
    tree: &'a GameTree,
    profile: &'a BehaviorProfile,
    action_values: Vec<f64>,
}

impl<'a> Walk<'a> {
    fn new(tree: &'a GameTree, profile: &'a BehaviorProfile) -> Self {
        Self {
            tree,
            profile,
            action_values: vec![0.0; profile.len()],
        }
    }

    /// Returns the payoff vector at `id`; `reach[i]` is the counterfactual
    /// reach probability of `id` for player `i`.
    fn visit(&mut self, id: NodeId, reach: &[f64]) -> Vec<f64> {
        let node = self.tree.node(id);
        match node.kind() {
            NodeKind::Terminal { payoffs } => payoffs.clone(),
            NodeKind::Chance { probs } => {
                let mut value = vec![0.0; reach.len()];
                for (&child, &prob) in node.children().iter().zip(probs) {
                    let next: Vec<f64> = reach.iter().map(|r| r * prob).collect();
                    let child_value = self.visit(child, &next);
                    for (v, c) in value.iter_mut().zip(&child_value) {
                        *v += prob * c;
                    }
                }
                value
            }
            NodeKind::Decision { infoset } => {
                let player = infoset.player;
                let support = self.profile.support();
                let offset = self.profile.offset(player, infoset.index);
                let live = support.actions(player, infoset.index);

                let mut value = vec![0.0; reach.len()];
                for (k, &action) in live.iter().enumerate() {
                    let prob = self.profile.as_slice()[offset + k];
                    let next: Vec<f64> = reach
                        .iter()
                        .enumerate()
                        .map(|(i, r)| if i == player { *r } else { r * prob })
                        .collect();
                    let child_value = self.visit(node.children()[action], &next);

                    self.action_values[offset + k] += reach[player] * child_value[player];
                    for (v, c) in value.iter_mut().zip(&child_value) {
                        *v += prob * c;
                    }
                }
                value
            }
        }
    }
}
