//! State-transition description of a game.
//!
//! A game described through the `Game` trait is expanded once into an explicit
//! [`GameTree`](super::GameTree), which is what the equilibrium search reads.
//! This keeps game rules (cards, betting, matrices) apart from the numerical core.

use std::fmt::Debug;
use std::hash::Hash;

/// Trait for actions that can be taken in a game.
pub trait Action: Clone + Eq + Hash + Debug {
    /// Convert action to a string representation for display/labels.
    fn to_string(&self) -> String;
}

/// Trait for information states (what a player knows at a decision point).
///
/// Two game states that look identical to the acting player must produce the
/// same key; the tree expansion groups decision nodes into infosets by it.
pub trait InfoState: Clone + Eq + Hash + Debug {
    /// Generate a unique string key for this information state.
    fn key(&self) -> String;
}

/// Trait for game states.
pub trait GameState: Clone + Debug {}

/// The main Game trait that defines the interface for any game.
///
/// # Example
/// ```ignore
/// struct MyGame;
///
/// impl Game for MyGame {
///     type State = MyGameState;
///     type Action = MyAction;
///     type InfoState = MyInfoState;
///
///     // ... implement required methods
/// }
/// ```
pub trait Game {
    /// The type representing a complete game state.
    type State: GameState;

    /// The type representing an action a player can take.
    type Action: Action;

    /// The type representing what a player knows at a decision point.
    type InfoState: InfoState;

    /// Create the initial game state.
    fn initial_state(&self) -> Self::State;

    /// Check if the given state is terminal (game over).
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Get the payoff for a player at a terminal state.
    ///
    /// # Panics
    /// May panic if called on a non-terminal state.
    fn get_payoff(&self, state: &Self::State, player: usize) -> f64;

    /// Get the index of the player who should act at the current state.
    ///
    /// # Returns
    /// - `Some(player_index)` if a player should act
    /// - `None` if the state is terminal or a chance node
    fn current_player(&self, state: &Self::State) -> Option<usize>;

    /// Get the total number of players in the game.
    fn num_players(&self) -> usize;

    /// Get the list of available actions at the current state.
    ///
    /// The order is significant: it fixes the action indices of the infoset.
    fn available_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Apply an action to a state and return the resulting new state.
    fn apply_action(&self, state: &Self::State, action: &Self::Action) -> Self::State;

    /// Get the information state for the player acting at `state`.
    fn info_state(&self, state: &Self::State) -> Self::InfoState;

    /// Check if the current state is a chance node.
    fn is_chance(&self, _state: &Self::State) -> bool {
        false
    }

    /// Enumerate every outcome of a chance node with its probability.
    ///
    /// Probabilities must be non-negative and sum to 1. Games without chance
    /// nodes keep the default.
    fn chance_outcomes(&self, _state: &Self::State) -> Vec<(Self::State, f64)> {
        Vec::new()
    }

    /// Get a human-readable name for an action.
    fn action_name(&self, action: &Self::Action) -> String {
        action.to_string()
    }

    /// Get a human-readable description of a state.
    fn state_description(&self, state: &Self::State) -> String {
        format!("{:?}", state)
    }
}

/// Macro to simplify implementing the Action trait for simple enums.
#[macro_export]
macro_rules! impl_action {
    ($type:ty) => {
        impl $crate::game::traits::Action for $type {
            fn to_string(&self) -> String {
                format!("{:?}", self)
            }
        }
    };
}

/// Macro to simplify implementing the GameState trait.
#[macro_export]
macro_rules! impl_game_state {
    ($type:ty) => {
        impl $crate::game::traits::GameState for $type {}
    };
}
