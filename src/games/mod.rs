//! Games bundled with the solver.
//!
//! These serve as:
//!
//! 1. **Validation**: games with known equilibria check that the Liapunov
//!    value and the search behave.
//!
//! 2. **Examples**: [`kuhn`] shows how to implement the `Game` trait;
//!    [`matrix`] shows how to build a tree directly with `TreeBuilder`.
//!
//! 3. **Benchmarks**: standard inputs for performance testing.
//!
//! ## Available Games
//!
//! - [`kuhn`]: Kuhn Poker, three cards and one betting round
//! - [`matrix`]: one-shot decisions and two-player matrix games

pub mod kuhn;
pub mod matrix;
