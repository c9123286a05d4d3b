//! Liapunov-function equilibrium search.
//!
//! The search minimizes the Liapunov value of a behavior profile, a
//! non-negative function that vanishes exactly at Nash equilibria.
//!
//! - [`profile`]: behavior profiles and the free-vector parametrization
//! - [`value`]: the Liapunov value and expected payoffs
//! - [`objective`]: the minimizer's view of a scalar function
//! - [`powell`]: Powell's direction-set minimizer
//! - [`solver`]: random-restart search with duplicate filtering
//! - [`subgame`]: solving marked subgames bottom-up and merging the pieces
//! - [`config`]: run parameters
//! - [`status`]: progress and cancellation hooks
//!
//! # Example
//! ```
//! use liap_solver::game::{GameTree, Support};
//! use liap_solver::games::kuhn::KuhnPoker;
//! use liap_solver::liap::{find_equilibria, BehaviorProfile, LiapParams, NullStatus};
//!
//! let tree = GameTree::from_game(&KuhnPoker::new()).unwrap();
//! let start = BehaviorProfile::centroid(&Support::full(&tree));
//! let params = LiapParams::default().with_tries(1).with_seed(5);
//! let outcome = find_equilibria(&tree, &params, &start, &mut NullStatus).unwrap();
//! assert_eq!(outcome.tries, 1);
//! for solution in &outcome.solutions {
//!     assert!(solution.profile.liap_value(&tree) <= params.tol_n);
//! }
//! ```

pub mod config;
pub mod error;
mod line;
pub mod objective;
pub mod powell;
pub mod profile;
pub mod solution;
pub mod solver;
pub mod status;
pub mod subgame;
pub mod trace;
pub mod value;

pub use config::{ConfigError, LiapParams};
pub use error::LiapError;
pub use objective::{FnObjective, LiapObjective, Objective};
pub use powell::{minimize, DirectionSet, Minimum, PowellConfig, Termination};
pub use profile::BehaviorProfile;
pub use solution::{Algorithm, BehaviorSolution, LiapOutcome};
pub use solver::{find_equilibria, LiapSolver};
pub use status::{CancelFlag, Interrupted, NullStatus, PollFn, ProgressStatus, Status};
pub use subgame::SubgameLiapSolver;
pub use trace::Trace;
