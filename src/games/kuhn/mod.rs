//! Kuhn Poker.
//!
//! Three cards (Jack, Queen, King), two players, one chip ante each. Player 1
//! passes or bets one chip; player 2 answers; after pass-bet player 1 gets a
//! last chance to call. Higher card wins at showdown.
//!
//! ```text
//! P1
//! ├── Pass
//! │   └── P2
//! │       ├── Pass → Showdown (pot = 2)
//! │       └── Bet
//! │           └── P1
//! │               ├── Pass → P2 wins (pot = 3)
//! │               └── Bet → Showdown (pot = 4)
//! └── Bet
//!     └── P2
//!         ├── Pass → P1 wins (pot = 3)
//!         └── Bet → Showdown (pot = 4)
//! ```
//!
//! The deal is a chance node with six equally likely outcomes, so the
//! expanded tree has 55 nodes and six infosets per player. The equilibrium
//! family is known in closed form (player 1 bluffs a Jack with probability
//! α ∈ [0, 1/3]), which makes the game a handy check for the Liapunov value.

use std::fmt;

use crate::game::traits::{Action, Game, InfoState};

/// Actions in Kuhn Poker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KuhnAction {
    /// Pass (check if no bet, fold if facing bet)
    Pass,
    /// Bet (or call if facing bet)
    Bet,
}

impl Action for KuhnAction {
    fn to_string(&self) -> String {
        match self {
            KuhnAction::Pass => "p".to_string(),
            KuhnAction::Bet => "b".to_string(),
        }
    }
}

impl fmt::Display for KuhnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KuhnAction::Pass => write!(f, "Pass"),
            KuhnAction::Bet => write!(f, "Bet"),
        }
    }
}

/// What the acting player knows: their card and the betting history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KuhnInfoState {
    /// Player's card (0=Jack, 1=Queen, 2=King)
    pub card: u8,
    /// Action history (e.g., "pb" = pass then bet)
    pub history: String,
}

impl InfoState for KuhnInfoState {
    fn key(&self) -> String {
        format!("{}:{}", self.card, self.history)
    }
}

/// Complete game state in Kuhn Poker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KuhnState {
    /// Cards dealt to each player (0=Jack, 1=Queen, 2=King)
    pub cards: [u8; 2],
    /// Action history
    pub history: String,
    /// Amount each player has put in the pot
    pub pot: [i32; 2],
    /// Whether cards have been dealt
    pub dealt: bool,
}

crate::impl_game_state!(KuhnState);

impl Default for KuhnState {
    fn default() -> Self {
        Self {
            cards: [0, 0],
            history: String::new(),
            pot: [1, 1],
            dealt: false,
        }
    }
}

/// Kuhn Poker game.
#[derive(Debug, Clone, Default)]
pub struct KuhnPoker;

impl KuhnPoker {
    /// Create a new Kuhn Poker game.
    pub fn new() -> Self {
        Self
    }

    /// Get card name for display.
    pub fn card_name(card: u8) -> &'static str {
        match card {
            0 => "Jack",
            1 => "Queen",
            2 => "King",
            _ => "Unknown",
        }
    }
}

impl Game for KuhnPoker {
    type State = KuhnState;
    type Action = KuhnAction;
    type InfoState = KuhnInfoState;

    fn initial_state(&self) -> Self::State {
        KuhnState::default()
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        matches!(state.history.as_str(), "pp" | "pbp" | "pbb" | "bp" | "bb")
    }

    fn get_payoff(&self, state: &Self::State, player: usize) -> f64 {
        debug_assert!(self.is_terminal(state), "get_payoff called on non-terminal state");

        let p0_wins = state.cards[0] > state.cards[1];
        let p0_payoff: f64 = match state.history.as_str() {
            "pp" if p0_wins => 1.0,
            "pp" => -1.0,
            "bp" => 1.0,
            "pbp" => -1.0,
            "bb" | "pbb" if p0_wins => 2.0,
            "bb" | "pbb" => -2.0,
            _ => 0.0,
        };

        if player == 0 {
            p0_payoff
        } else {
            -p0_payoff
        }
    }

    fn current_player(&self, state: &Self::State) -> Option<usize> {
        if self.is_terminal(state) || self.is_chance(state) {
            return None;
        }

        match state.history.as_str() {
            "" | "pb" => Some(0),
            "p" | "b" => Some(1),
            _ => None,
        }
    }

    fn num_players(&self) -> usize {
        2
    }

    fn available_actions(&self, state: &Self::State) -> Vec<Self::Action> {
        if self.is_terminal(state) || self.is_chance(state) {
            return vec![];
        }
        vec![KuhnAction::Pass, KuhnAction::Bet]
    }

    fn apply_action(&self, state: &Self::State, action: &Self::Action) -> Self::State {
        let mut next = state.clone();
        match action {
            KuhnAction::Pass => next.history.push('p'),
            KuhnAction::Bet => {
                if let Some(player) = self.current_player(state) {
                    next.pot[player] += 1;
                }
                next.history.push('b');
            }
        }
        next
    }

    fn info_state(&self, state: &Self::State) -> Self::InfoState {
        let player = self.current_player(state).unwrap_or(0);
        KuhnInfoState {
            card: state.cards[player],
            history: state.history.clone(),
        }
    }

    fn is_chance(&self, state: &Self::State) -> bool {
        !state.dealt
    }

    fn chance_outcomes(&self, state: &Self::State) -> Vec<(Self::State, f64)> {
        debug_assert!(self.is_chance(state), "chance_outcomes called on non-chance state");

        let mut deals = Vec::with_capacity(6);
        for first in 0..3u8 {
            for second in (0..3u8).filter(|&c| c != first) {
                let dealt = KuhnState {
                    cards: [first, second],
                    history: String::new(),
                    pot: [1, 1],
                    dealt: true,
                };
                deals.push((dealt, 1.0 / 6.0));
            }
        }
        deals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameTree, Support};
    use crate::liap::{value, BehaviorProfile};

    /// Assign `[pass, bet]` probabilities to the infoset with `key`.
    fn play(tree: &GameTree, p: &mut BehaviorProfile, player: usize, key: &str, bet: f64) {
        let iset = tree.find_infoset(player, key).unwrap();
        p.set(player, iset, 0, 1.0 - bet);
        p.set(player, iset, 1, bet);
    }

    /// Equilibrium with bluffing frequency α = 1/3.
    fn equilibrium(tree: &GameTree) -> BehaviorProfile {
        let mut p = BehaviorProfile::centroid(&Support::full(tree));
        let third = 1.0 / 3.0;
        for (key, bet) in [("0:", third), ("1:", 0.0), ("2:", 1.0)] {
            play(tree, &mut p, 0, key, bet);
        }
        for (key, bet) in [("0:pb", 0.0), ("1:pb", 2.0 * third), ("2:pb", 1.0)] {
            play(tree, &mut p, 0, key, bet);
        }
        for (key, bet) in [("0:b", 0.0), ("1:b", third), ("2:b", 1.0)] {
            play(tree, &mut p, 1, key, bet);
        }
        for (key, bet) in [("0:p", third), ("1:p", 0.0), ("2:p", 1.0)] {
            play(tree, &mut p, 1, key, bet);
        }
        p
    }

    #[test]
    fn test_kuhn_chance_outcomes() {
        let game = KuhnPoker::new();
        let state = game.initial_state();
        assert!(game.is_chance(&state));

        let deals = game.chance_outcomes(&state);
        assert_eq!(deals.len(), 6);
        assert!((deals.iter().map(|(_, p)| p).sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(deals.iter().all(|(s, _)| s.dealt && s.cards[0] != s.cards[1]));
    }

    #[test]
    fn test_kuhn_terminal_payoffs() {
        let game = KuhnPoker::new();

        let pp_state = KuhnState {
            cards: [2, 0],
            history: "pp".to_string(),
            pot: [1, 1],
            dealt: true,
        };
        assert!(game.is_terminal(&pp_state));
        assert_eq!(game.get_payoff(&pp_state, 0), 1.0);
        assert_eq!(game.get_payoff(&pp_state, 1), -1.0);

        let bp_state = KuhnState {
            cards: [0, 2],
            history: "bp".to_string(),
            pot: [2, 1],
            dealt: true,
        };
        assert_eq!(game.get_payoff(&bp_state, 0), 1.0);

        let pbb_state = KuhnState {
            cards: [0, 2],
            history: "pbb".to_string(),
            pot: [2, 2],
            dealt: true,
        };
        assert_eq!(game.get_payoff(&pbb_state, 0), -2.0);
        assert_eq!(game.get_payoff(&pbb_state, 1), 2.0);
    }

    #[test]
    fn test_kuhn_info_states() {
        let game = KuhnPoker::new();
        let state = KuhnState {
            cards: [1, 2],
            history: "p".to_string(),
            pot: [1, 1],
            dealt: true,
        };
        assert_eq!(game.current_player(&state), Some(1));
        assert_eq!(game.info_state(&state).key(), "2:p");
    }

    #[test]
    fn test_kuhn_tree_expansion() {
        let tree = GameTree::from_game(&KuhnPoker::new()).unwrap();
        assert_eq!(tree.num_players(), 2);
        assert_eq!(tree.num_nodes(), 55);
        assert_eq!(tree.num_infosets(0), 6);
        assert_eq!(tree.num_infosets(1), 6);
        // Each infoset groups the two deals the player cannot tell apart.
        assert!(tree.infosets(0).iter().all(|i| i.members().len() == 2));
        assert_eq!(tree.infoset(0, 0).label(), "0:");
        assert_eq!(tree.infoset(0, 0).actions(), &["p".to_string(), "b".to_string()]);
        // Cards are hidden, so no proper subgames exist.
        let mut marked = tree.clone();
        marked.mark_all_subgames();
        assert_eq!(marked.marked_subgame_roots(), vec![tree.root()]);
    }

    #[test]
    fn test_kuhn_equilibrium_has_zero_liap_value() {
        let tree = GameTree::from_game(&KuhnPoker::new()).unwrap();
        let eq = equilibrium(&tree);
        assert!(value::liap_value(&tree, &eq) < 1e-12);

        // Player 1 loses 1/18 per hand at equilibrium.
        let payoffs = value::expected_payoffs(&tree, &eq);
        assert!((payoffs[0] + 1.0 / 18.0).abs() < 1e-12);

        let uniform = BehaviorProfile::centroid(&Support::full(&tree));
        assert!(value::liap_value(&tree, &uniform) > 1e-3);
    }
}
