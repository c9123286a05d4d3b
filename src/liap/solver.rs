//! Multi-start Liapunov equilibrium search.
//!
//! The first try starts from the caller's profile (nudged into the interior
//! if needed), every later try from a random profile. Each try resets the
//! direction set and runs [`minimize`]; a try that converges to a Liapunov
//! value within `tol_n` and differs from every accepted solution by more
//! than `sqrt(tol_n)` is accepted. Failing to converge is not an error, it
//! just yields nothing for that try.

use std::io::Write;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::game::GameTree;
use crate::liap::config::LiapParams;
use crate::liap::error::LiapError;
use crate::liap::objective::{LiapObjective, Objective};
use crate::liap::powell::{minimize, DirectionSet, Termination};
use crate::liap::profile::BehaviorProfile;
use crate::liap::solution::{BehaviorSolution, LiapOutcome};
use crate::liap::status::Status;
use crate::liap::trace::Trace;

/// Profiles with a probability at or below this are pulled toward the
/// centroid by the same factor before the first try.
const ALPHA: f64 = 1.0e-8;

/// Random-restart Liapunov solver for one game tree.
///
/// # Example
/// ```
/// use liap_solver::game::Support;
/// use liap_solver::games::matrix::bimatrix;
/// use liap_solver::liap::{BehaviorProfile, LiapParams, LiapSolver, NullStatus};
///
/// // Prisoner's dilemma: defecting is dominant.
/// let tree = bimatrix(&[[3.0, 0.0], [5.0, 1.0]], &[[3.0, 5.0], [0.0, 1.0]]).unwrap();
/// let start = BehaviorProfile::centroid(&Support::full(&tree));
/// let mut solver = LiapSolver::new(&tree, LiapParams::default().with_seed(1)).unwrap();
/// let outcome = solver.solve(&start, &mut NullStatus).unwrap();
/// assert!(outcome.found());
/// assert!(outcome.solutions[0].profile.get(0, 0, 1) > 0.999);
/// ```
pub struct LiapSolver<'a> {
    tree: &'a GameTree,
    params: LiapParams,
    rng: StdRng,
    trace: Trace<'a>,
}

impl<'a> LiapSolver<'a> {
    /// Create a solver; fails if `params` are invalid.
    pub fn new(tree: &'a GameTree, params: LiapParams) -> Result<Self, LiapError> {
        params.validate()?;
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            tree,
            params,
            rng,
            trace: Trace::off(),
        })
    }

    /// Write trace output to `sink` at the level set in the parameters.
    pub fn with_trace(mut self, sink: &'a mut dyn Write) -> Self {
        self.trace = Trace::new(Some(sink), self.params.trace);
        self
    }

    /// Parameters in use.
    pub fn params(&self) -> &LiapParams {
        &self.params
    }

    /// Run the search from `start`.
    pub fn solve(
        &mut self,
        start: &BehaviorProfile,
        status: &mut dyn Status,
    ) -> Result<LiapOutcome, LiapError> {
        search(self.tree, &self.params, start, &mut self.rng, status, &mut self.trace)
    }
}

/// One-shot search: build a [`LiapSolver`] and run it.
pub fn find_equilibria(
    tree: &GameTree,
    params: &LiapParams,
    start: &BehaviorProfile,
    status: &mut dyn Status,
) -> Result<LiapOutcome, LiapError> {
    LiapSolver::new(tree, params.clone())?.solve(start, status)
}

/// The restart loop shared by [`LiapSolver`] and the subgame driver.
pub(crate) fn search(
    tree: &GameTree,
    params: &LiapParams,
    start: &BehaviorProfile,
    rng: &mut StdRng,
    status: &mut dyn Status,
    trace: &mut Trace<'_>,
) -> Result<LiapOutcome, LiapError> {
    if !start.support().fits(tree) {
        return Err(LiapError::SupportMismatch);
    }
    if params.n_tries == 0 && params.stop_after == 0 {
        warn!("liap search has neither a try limit nor a solution limit; it runs until interrupted");
    }

    let config = params.powell(true);
    let epsilon = params.epsilon();
    let mut profile = start.clone();
    if !profile.is_interior(ALPHA) {
        profile.blend_toward_centroid(ALPHA);
    }
    let mut directions = DirectionSet::simplex(profile.block_lengths());
    let mut outcome = LiapOutcome::new();

    loop {
        if params.n_tries > 0 && outcome.tries >= params.n_tries {
            break;
        }
        if params.stop_after > 0 && outcome.solutions.len() >= params.stop_after {
            break;
        }
        if status.poll().is_err() {
            debug!("liap search interrupted before try {}", outcome.tries + 1);
            outcome.complete = false;
            break;
        }

        outcome.tries += 1;
        let try_index = outcome.tries;
        status.start_try(try_index);
        if try_index > 1 {
            profile.randomize(rng);
        }
        directions.reset();
        debug!("liap try {}", try_index);
        trace.line(1, format_args!("try #{} start: {}", try_index, profile));

        let mut point = profile.free_vector();
        let mut objective = LiapObjective::new(tree, profile.clone());
        let minimum = minimize(&mut point, &mut directions, &mut objective, &config, trace, status);
        outcome.evaluations += objective.evaluations();
        outcome.iterations += minimum.iterations as u64;

        if minimum.termination == Termination::Interrupted {
            debug!("liap try {} interrupted", try_index);
            outcome.complete = false;
            break;
        }

        profile.set_free_vector(&point);
        if !minimum.converged() || minimum.value > params.tol_n {
            debug!(
                "liap try {}: no solution ({:?}, value {:.3e})",
                try_index, minimum.termination, minimum.value
            );
            continue;
        }
        if outcome.solutions.iter().any(|s| s.equals(&profile)) {
            debug!("liap try {}: duplicate solution", try_index);
            continue;
        }

        outcome
            .solutions
            .push(BehaviorSolution::new(profile.clone(), epsilon, minimum.value));
        status.found(outcome.solutions.len());
        debug!(
            "liap try {}: solution #{} (value {:.3e})",
            try_index,
            outcome.solutions.len(),
            minimum.value
        );
        trace.line(1, format_args!("solution #{}: {}", outcome.solutions.len(), profile));
    }

    Ok(outcome)
}
