//! Solving a game subgame by subgame.
//!
//! Marked subgame roots are processed children first. Each subgame is cut out
//! of the tree with its already solved descendants replaced by terminals
//! carrying their equilibrium payoffs, solved with the restart search, and the
//! pieces are stitched back into full profiles, one per combination of
//! subgame solutions.
//!
//! Infosets of a subgame are matched to the full game's by position: the
//! `k`-th infoset of player `p` in the subgame is the `k`-th infoset of `p`
//! owned by that subgame in the full game. The match is checked (infoset
//! counts and live action counts) before any probabilities are copied.

use std::io::Write;

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::FxHashMap;

use crate::game::{GameTree, NodeId, Support};
use crate::liap::config::LiapParams;
use crate::liap::error::LiapError;
use crate::liap::profile::BehaviorProfile;
use crate::liap::solution::{BehaviorSolution, LiapOutcome};
use crate::liap::solver::search;
use crate::liap::status::Status;
use crate::liap::trace::Trace;
use crate::liap::value;

/// Subgame decomposition driver for one game and one starting profile.
pub struct SubgameLiapSolver<'a> {
    tree: &'a GameTree,
    params: LiapParams,
    start: BehaviorProfile,
    rng: StdRng,
    trace: Trace<'a>,
    /// Marked roots, children before parents.
    roots: Vec<NodeId>,
    /// `[player][infoset]` → index into `roots` of the owning subgame.
    owner: Vec<Vec<usize>>,
    /// Index into `roots` of the nearest enclosing subgame, `None` for the
    /// tree root.
    parents: Vec<Option<usize>>,
    /// Subgames solved so far.
    subgame: usize,
    evaluations: u64,
    iterations: u64,
}

impl<'a> SubgameLiapSolver<'a> {
    /// Prepare to solve `tree` from `start`.
    ///
    /// Each infoset is owned by the subgame rooted at the nearest marked
    /// ancestor of its first member.
    pub fn new(
        tree: &'a GameTree,
        params: LiapParams,
        start: BehaviorProfile,
    ) -> Result<Self, LiapError> {
        params.validate()?;
        if !start.support().fits(tree) {
            return Err(LiapError::SupportMismatch);
        }

        let roots = tree.marked_subgame_roots();
        let mut owner = Vec::with_capacity(tree.num_players());
        for player in 0..tree.num_players() {
            let mut row = Vec::with_capacity(tree.num_infosets(player));
            for (index, infoset) in tree.infosets(player).iter().enumerate() {
                let member = infoset.members()[0];
                let root = tree.subgame_root(member);
                let position = roots.iter().position(|&r| r == root).ok_or_else(|| {
                    LiapError::SubgameMismatch {
                        subgame: 0,
                        reason: format!(
                            "infoset {} of player {} has no marked subgame root",
                            index, player
                        ),
                    }
                })?;
                row.push(position);
            }
            owner.push(row);
        }

        let parents = roots
            .iter()
            .map(|&root| {
                let above = tree.subgame_root(tree.parent(root)?);
                roots.iter().position(|&r| r == above)
            })
            .collect();

        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            tree,
            params,
            start,
            rng,
            trace: Trace::off(),
            roots,
            owner,
            parents,
            subgame: 0,
            evaluations: 0,
            iterations: 0,
        })
    }

    /// Write trace output to `sink` at the level set in the parameters.
    pub fn with_trace(mut self, sink: &'a mut dyn Write) -> Self {
        self.trace = Trace::new(Some(sink), self.params.trace);
        self
    }

    /// Marked subgame roots in solving order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Objective evaluations summed over all subgames solved so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Minimizer passes summed over all subgames solved so far.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Full-game infosets of `player` owned by subgame `subgame` (0-based).
    fn owned(&self, player: usize, subgame: usize) -> Vec<usize> {
        self.owner[player]
            .iter()
            .enumerate()
            .filter(|&(_, &o)| o == subgame)
            .map(|(index, _)| index)
            .collect()
    }

    /// Check the positional correspondence for subgame `subgame` and return
    /// the owned infosets per player.
    fn positional_map(
        &self,
        subtree: &GameTree,
        support: &Support,
        subgame: usize,
    ) -> Result<Vec<Vec<usize>>, LiapError> {
        let mismatch = |reason: String| LiapError::SubgameMismatch {
            subgame: subgame + 1,
            reason,
        };
        if subgame >= self.roots.len() {
            return Err(mismatch(format!("only {} subgames are marked", self.roots.len())));
        }
        if !support.fits(subtree) || subtree.num_players() != self.tree.num_players() {
            return Err(mismatch("support does not fit the subgame".to_string()));
        }

        let mut map = Vec::with_capacity(self.tree.num_players());
        for player in 0..self.tree.num_players() {
            let owned = self.owned(player, subgame);
            if owned.len() != subtree.num_infosets(player) {
                return Err(mismatch(format!(
                    "player {} has {} infosets in the subgame but owns {} in the game",
                    player,
                    subtree.num_infosets(player),
                    owned.len()
                )));
            }
            for (local, &global) in owned.iter().enumerate() {
                let here = support.num_actions(player, local);
                let there = self.start.support().num_actions(player, global);
                if here != there {
                    return Err(mismatch(format!(
                        "infoset {} of player {} has {} live actions, expected {}",
                        local, player, here, there
                    )));
                }
            }
            map.push(owned);
        }
        Ok(map)
    }

    /// Solve the next subgame.
    ///
    /// `subtree` must be the next marked subgame in [`roots`](Self::roots)
    /// order, restricted to `support`. Its starting profile is copied from
    /// the full starting profile by position. Accepted solutions are
    /// appended to `solutions`; returns the subgame's own outcome counters.
    pub fn solve_subgame(
        &mut self,
        subtree: &GameTree,
        support: &Support,
        solutions: &mut Vec<BehaviorSolution>,
        status: &mut dyn Status,
    ) -> Result<LiapOutcome, LiapError> {
        let outcome = self.solve_at(self.subgame, subtree, support, solutions, status)?;
        self.subgame += 1;
        Ok(outcome)
    }

    /// Solve subgame `k` once, against whatever its `subtree` has collapsed.
    fn solve_at(
        &mut self,
        k: usize,
        subtree: &GameTree,
        support: &Support,
        solutions: &mut Vec<BehaviorSolution>,
        status: &mut dyn Status,
    ) -> Result<LiapOutcome, LiapError> {
        let map = self.positional_map(subtree, support, k)?;

        let mut start = BehaviorProfile::centroid(support);
        for (player, owned) in map.iter().enumerate() {
            for (local, &global) in owned.iter().enumerate() {
                start
                    .infoset_mut(player, local)
                    .copy_from_slice(self.start.infoset(player, global));
            }
        }

        debug!(
            "subgame {} of {}: {} free coordinates",
            k + 1,
            self.roots.len(),
            start.free_len()
        );
        self.trace.line(1, format_args!("subgame #{}", k + 1));

        let mut outcome = search(subtree, &self.params, &start, &mut self.rng, status, &mut self.trace)?;
        self.evaluations += outcome.evaluations;
        self.iterations += outcome.iterations;
        solutions.append(&mut outcome.solutions);
        Ok(outcome)
    }

    /// The start support cut down to the infosets of subgame `k`.
    fn restricted_support(&self, subtree: &GameTree, k: usize) -> Result<Support, LiapError> {
        let lists = (0..self.tree.num_players())
            .map(|player| {
                self.owned(player, k)
                    .into_iter()
                    .map(|global| self.start.support().actions(player, global).to_vec())
                    .collect()
            })
            .collect();
        Support::from_actions(subtree, lists).map_err(|e| LiapError::SubgameMismatch {
            subgame: k + 1,
            reason: e.to_string(),
        })
    }

    /// Solve every marked subgame and merge the pieces into full-game
    /// solutions.
    ///
    /// A subgame is solved once for every combination of solutions of the
    /// subgames directly below it, with those collapsed to their payoffs.
    /// Each of its solutions extends the combination it was solved against,
    /// so every solution of the tree root yields one merged profile. With
    /// `stop_after > 0` each subgame keeps at most that many.
    ///
    /// The outcome is empty if some subgame yields no solution, and marked
    /// incomplete if the search was interrupted. Counters restart on every
    /// call.
    pub fn solve(&mut self, status: &mut dyn Status) -> Result<LiapOutcome, LiapError> {
        self.subgame = 0;
        self.evaluations = 0;
        self.iterations = 0;

        let limit = self.params.stop_after;
        let mut outcome = LiapOutcome::new();
        let mut found: Vec<Vec<Partial>> = Vec::with_capacity(self.roots.len());

        for k in 0..self.roots.len() {
            let root = self.roots[k];
            let children: Vec<usize> = (0..k).filter(|&j| self.parents[j] == Some(k)).collect();
            let lists: Vec<&[Partial]> = children.iter().map(|&j| found[j].as_slice()).collect();

            let mut partials = Vec::new();
            'combos: for combo in combinations(&lists) {
                let solved: FxHashMap<NodeId, Vec<f64>> = children
                    .iter()
                    .zip(&combo)
                    .map(|(&j, part)| (self.roots[j], part.payoffs.clone()))
                    .collect();
                let subtree = self.tree.subgame(root, &solved)?;
                let support = self.restricted_support(&subtree, k)?;

                let mut solutions = Vec::new();
                let part = self.solve_at(k, &subtree, &support, &mut solutions, status)?;
                outcome.absorb_counters(&part);
                if !part.complete {
                    debug!("subgame {} interrupted", k + 1);
                    return Ok(outcome);
                }

                for solution in solutions {
                    let mut pieces: Vec<(usize, BehaviorProfile)> =
                        combo.iter().flat_map(|p| p.pieces.iter().cloned()).collect();
                    let epsilon = combo.iter().fold(solution.epsilon, |e, p| e.max(p.epsilon));
                    let payoffs = value::expected_payoffs(&subtree, &solution.profile);
                    pieces.push((k, solution.profile));
                    partials.push(Partial { pieces, epsilon, payoffs });
                    if limit > 0 && partials.len() >= limit {
                        break 'combos;
                    }
                }
            }

            if partials.is_empty() {
                debug!("subgame {} has no solution", k + 1);
                return Ok(outcome);
            }
            debug!("subgame {}: {} partial solutions", k + 1, partials.len());
            found.push(partials);
        }

        // The tree root comes last and sits above every other subgame.
        let top = found.pop().unwrap_or_default();
        for partial in top {
            let mut profile = BehaviorProfile::centroid(self.start.support());
            for (k, local) in &partial.pieces {
                for player in 0..self.tree.num_players() {
                    for (index, global) in self.owned(player, *k).into_iter().enumerate() {
                        profile
                            .infoset_mut(player, global)
                            .copy_from_slice(local.infoset(player, index));
                    }
                }
            }
            let liap_value = profile.liap_value(self.tree);
            debug!("merged {} subgames, liap value {:.3e}", partial.pieces.len(), liap_value);
            outcome
                .solutions
                .push(BehaviorSolution::new(profile, partial.epsilon, liap_value));
        }
        Ok(outcome)
    }
}

/// A solution of one subgame with the solutions below it that it was
/// solved against.
#[derive(Debug, Clone)]
struct Partial {
    /// `(subgame, local profile)` for this subgame and every one below it.
    pieces: Vec<(usize, BehaviorProfile)>,
    epsilon: f64,
    /// Expected payoffs at the subgame root.
    payoffs: Vec<f64>,
}

/// Every way of picking one entry from each list, in odometer order.
fn combinations<'p>(lists: &[&'p [Partial]]) -> Vec<Vec<&'p Partial>> {
    let mut combos: Vec<Vec<&'p Partial>> = vec![Vec::new()];
    for &list in lists {
        combos = combos
            .into_iter()
            .flat_map(|combo| {
                list.iter().map(move |part| {
                    let mut next = combo.clone();
                    next.push(part);
                    next
                })
            })
            .collect();
    }
    combos
}
