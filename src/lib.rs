//! # Liap Solver
//!
//! Nash equilibrium search for extensive-form games by minimizing a
//! Liapunov function: a non-negative value of a behavior profile that is
//! zero exactly when no player can gain by deviating at any infoset.
//!
//! ## Features
//!
//! - **Game trees**: expand any state-transition `Game` into an explicit tree,
//!   or build one directly with `TreeBuilder`
//! - **Powell minimizer**: derivative-free direction-set search that stays
//!   inside the strategy simplex
//! - **Random restarts**: multi-start search with near-duplicate filtering
//! - **Subgame decomposition**: solve marked subgames bottom-up and merge
//! - **Cancellation**: cooperative polling with progress bars
//!
//! ## Quick Start
//!
//! ```
//! use liap_solver::game::{GameTree, Support};
//! use liap_solver::games::matrix::bimatrix;
//! use liap_solver::liap::{find_equilibria, BehaviorProfile, LiapParams, NullStatus};
//!
//! // 1. Build or expand a game tree
//! let tree = bimatrix(&[[1.0, -1.0], [-1.0, 1.0]], &[[-1.0, 1.0], [1.0, -1.0]]).unwrap();
//!
//! // 2. Pick a starting profile
//! let start = BehaviorProfile::centroid(&Support::full(&tree));
//!
//! // 3. Search
//! let outcome = find_equilibria(&tree, &LiapParams::default(), &start, &mut NullStatus).unwrap();
//!
//! // 4. Matching pennies: both players mix evenly
//! assert!((outcome.solutions[0].profile.get(0, 0, 0) - 0.5).abs() < 1e-6);
//! ```
//!
//! ## Modules
//!
//! - [`game`]: game trees, infosets and supports
//! - [`liap`]: Liapunov value, minimizer and search drivers
//! - [`games`]: bundled games (Kuhn Poker, matrix games)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  SubgameLiapSolver (optional)                   │
//! │  - marked roots, children first   - merge partial profiles      │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │ per subgame
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                LiapSolver (random restarts)                     │
//! │  - start / random profiles        - duplicate filtering         │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │ per try
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │           Powell minimizer  ◄──►  LiapObjective                 │
//! │  - line searches in the simplex   - free vector → profile       │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │ reads
//!                               ▼
//!                     ┌───────────────────┐
//!                     │     GameTree      │
//!                     └───────────────────┘
//! ```

#![warn(missing_docs)]

/// Game representation: trees, infosets, supports.
pub mod game;

/// Game implementations module.
///
/// Contains Kuhn Poker and matrix games for testing and validation.
pub mod games;

/// Liapunov equilibrium search.
pub mod liap;

// Re-export commonly used types at crate root for convenience
pub use game::{Game, GameTree, Support, TreeBuilder};
pub use liap::{
    find_equilibria, BehaviorProfile, BehaviorSolution, LiapOutcome, LiapParams, LiapSolver,
    SubgameLiapSolver,
};
