//! Action supports: which actions are live at each information set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::tree::GameTree;

/// Errors raised when a support does not fit its tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SupportError {
    /// Player or infoset count differs from the tree.
    #[error("support shape does not match the game tree")]
    ShapeMismatch,

    /// An infoset has no live action.
    #[error("infoset {infoset} of player {player} has an empty support")]
    Empty {
        /// Owning player.
        player: usize,
        /// Infoset index.
        infoset: usize,
    },

    /// Action indices out of range, unsorted, or repeated.
    #[error("infoset {infoset} of player {player} has invalid action indices")]
    BadAction {
        /// Owning player.
        player: usize,
        /// Infoset index.
        infoset: usize,
    },
}

/// Per-(player, infoset) list of live action indices.
///
/// The support fixes the dimension of every profile built on it: one
/// probability per live action, and one free coordinate fewer per infoset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Support {
    actions: Vec<Vec<Vec<usize>>>,
}

impl Support {
    /// Every action of every infoset is live.
    pub fn full(tree: &GameTree) -> Self {
        let actions = (0..tree.num_players())
            .map(|pl| {
                tree.infosets(pl)
                    .iter()
                    .map(|iset| (0..iset.num_actions()).collect())
                    .collect()
            })
            .collect();
        Self { actions }
    }

    /// Build a support from explicit `[player][infoset] -> actions` lists.
    ///
    /// Each list must be non-empty, strictly ascending, and index into the
    /// infoset's actions.
    pub fn from_actions(
        tree: &GameTree,
        actions: Vec<Vec<Vec<usize>>>,
    ) -> Result<Self, SupportError> {
        if actions.len() != tree.num_players() {
            return Err(SupportError::ShapeMismatch);
        }
        for (player, isets) in actions.iter().enumerate() {
            if isets.len() != tree.num_infosets(player) {
                return Err(SupportError::ShapeMismatch);
            }
            for (infoset, live) in isets.iter().enumerate() {
                if live.is_empty() {
                    return Err(SupportError::Empty { player, infoset });
                }
                let n = tree.infoset(player, infoset).num_actions();
                let ascending = live.windows(2).all(|w| w[0] < w[1]);
                if !ascending || live.iter().any(|&a| a >= n) {
                    return Err(SupportError::BadAction { player, infoset });
                }
            }
        }
        Ok(Self { actions })
    }

    /// Number of players.
    pub fn num_players(&self) -> usize {
        self.actions.len()
    }

    /// Number of infosets of `player`.
    pub fn num_infosets(&self, player: usize) -> usize {
        self.actions[player].len()
    }

    /// Number of live actions at an infoset.
    pub fn num_actions(&self, player: usize, infoset: usize) -> usize {
        self.actions[player][infoset].len()
    }

    /// Live action indices at an infoset (indices into the infoset's actions).
    pub fn actions(&self, player: usize, infoset: usize) -> &[usize] {
        &self.actions[player][infoset]
    }

    /// Live action counts, player-major then infoset-major.
    pub fn block_lengths(&self) -> Vec<usize> {
        self.actions.iter().flatten().map(Vec::len).collect()
    }

    /// Total number of live actions.
    pub fn total_actions(&self) -> usize {
        self.actions.iter().flatten().map(Vec::len).sum()
    }

    /// Number of free coordinates (one fewer than live actions per infoset).
    pub fn free_dimension(&self) -> usize {
        self.actions.iter().flatten().map(|a| a.len() - 1).sum()
    }

    /// Whether the support has the same shape as `tree`.
    pub fn fits(&self, tree: &GameTree) -> bool {
        self.num_players() == tree.num_players()
            && (0..self.num_players()).all(|pl| {
                self.num_infosets(pl) == tree.num_infosets(pl)
                    && self.actions[pl]
                        .iter()
                        .zip(tree.infosets(pl))
                        .all(|(live, iset)| live.iter().all(|&a| a < iset.num_actions()))
            })
    }
}
