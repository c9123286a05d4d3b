//! Error type of the equilibrium search.

use thiserror::Error;

use crate::game::{SupportError, TreeError};
use crate::liap::config::ConfigError;

/// Errors surfaced by the equilibrium search.
///
/// Non-convergence and user cancellation are not errors: the first simply
/// yields no solution for a try, the second marks the outcome incomplete.
#[derive(Debug, Error)]
pub enum LiapError {
    /// Profile length does not match its support.
    #[error("profile has {actual} probabilities, support requires {expected}")]
    DimensionMismatch {
        /// Live actions in the support.
        expected: usize,
        /// Probabilities supplied.
        actual: usize,
    },

    /// Start profile was built on a support of a different game.
    #[error("start profile support does not match the game tree")]
    SupportMismatch,

    /// Positional infoset mapping between a game and one of its subgames failed.
    #[error("subgame {subgame}: {reason}")]
    SubgameMismatch {
        /// 1-based subgame number.
        subgame: usize,
        /// What did not line up.
        reason: String,
    },

    /// Game tree construction or extraction failed.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Support does not fit the tree.
    #[error(transparent)]
    Support(#[from] SupportError),

    /// Invalid run parameters.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Writing results failed.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing results failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}
