//! Game representation consumed by the equilibrium search.
//!
//! - [`traits`]: state-transition `Game` description (rules-level).
//! - [`tree`]: explicit arena tree with infosets and subgame marks.
//! - [`support`]: live actions per infoset.
//!
//! The search never mutates a [`GameTree`]; it only queries structure and
//! payoffs.

pub mod support;
pub mod traits;
pub mod tree;

pub use support::{Support, SupportError};
pub use traits::{Action, Game, GameState, InfoState};
pub use tree::{GameTree, Infoset, InfosetId, Node, NodeId, NodeKind, TreeBuilder, TreeError};
