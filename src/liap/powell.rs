//! Powell's direction-set minimization.
//!
//! Each outer pass line-minimizes along every direction of a [`DirectionSet`]
//! in turn, then tries to swap in the net displacement of the pass as a new
//! conjugate direction. No derivatives are needed.
//!
//! In interior mode the search point is a free vector of a behavior profile
//! (see [`BehaviorProfile::free_vector`](crate::liap::BehaviorProfile::free_vector)):
//! line searches are confined to steps that keep every probability
//! non-negative, and an extrapolation that leaves the simplex is never taken.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::liap::line::{self, Line};
use crate::liap::objective::Objective;
use crate::liap::status::Status;
use crate::liap::trace::Trace;

/// Absolute slack in the relative-improvement stopping test.
const TINY: f64 = 1.0e-25;
/// Share of the feasible step range kept off the simplex boundary.
const EDGE: f64 = 1.0e-12;

/// Square basis of unit search directions.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionSet {
    rows: Vec<Vec<f64>>,
    /// Live-action counts per infoset when the basis was built for a simplex.
    blocks: Option<Vec<usize>>,
}

impl DirectionSet {
    /// Unit vectors of `R^n`.
    pub fn identity(n: usize) -> Self {
        Self {
            rows: identity_rows(n),
            blocks: None,
        }
    }

    /// Basis for a product of simplices, in free coordinates.
    ///
    /// `blocks` gives the number of live actions of each infoset. Every unit
    /// vector `e_k` of an infoset's action space is projected onto the
    /// sum-zero plane along the last live action, giving `e_k - e_last`.
    /// Dropped to free coordinates (the last one is implied) these rows are
    /// exactly the unit vectors, one per free coordinate, so every search
    /// direction trades probability between one action and the last.
    pub fn simplex(blocks: &[usize]) -> Self {
        let dim = blocks.iter().map(|n| n - 1).sum();
        Self {
            rows: identity_rows(dim),
            blocks: Some(blocks.to_vec()),
        }
    }

    /// Restore the initial basis.
    pub fn reset(&mut self) {
        self.rows = identity_rows(self.rows.len());
    }

    /// Number of directions (the dimension of the search space).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the space is zero-dimensional.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The `i`-th direction.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.rows[i]
    }

    /// Simplex block structure, if any.
    pub fn blocks(&self) -> Option<&[usize]> {
        self.blocks.as_deref()
    }

    /// Drop direction `index` and append `direction` (normalized).
    ///
    /// The last direction moves into the vacated slot.
    pub fn replace(&mut self, index: usize, mut direction: Vec<f64>) {
        assert_eq!(direction.len(), self.rows.len(), "direction has wrong dimension");
        normalize(&mut direction);
        self.rows.swap_remove(index);
        self.rows.push(direction);
    }
}

fn identity_rows(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| {
            let mut row = vec![0.0; n];
            row[i] = 1.0;
            row
        })
        .collect()
}

fn normalize(v: &mut [f64]) {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Budgets and tolerances for one minimization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowellConfig {
    /// Maximum outer passes.
    pub maxits_n: usize,
    /// Outer tolerance on the objective.
    pub tol_n: f64,
    /// Maximum iterations per line search.
    pub maxits_1: usize,
    /// Relative tolerance of each line search.
    pub tol_1: f64,
    /// Keep the point inside the simplex.
    pub interior: bool,
}

impl Default for PowellConfig {
    fn default() -> Self {
        Self {
            maxits_n: 20,
            tol_n: 1.0e-10,
            maxits_1: 100,
            tol_1: 2.0e-10,
            interior: true,
        }
    }
}

/// Why a minimization stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The outer tolerance was met.
    Converged,
    /// The pass budget ran out first.
    MaxIterations,
    /// The status hook asked to stop.
    Interrupted,
}

/// Result of [`minimize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    /// Objective value at the returned point.
    pub value: f64,
    /// Outer passes actually executed.
    pub iterations: usize,
    /// Stop reason.
    pub termination: Termination,
    /// Value after each completed pass; never increases.
    pub history: Vec<f64>,
}

impl Minimum {
    /// Whether the outer tolerance was met.
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

/// Minimize `objective` starting from `point`, which is overwritten with the
/// best point found.
///
/// `status` is polled at the top of every pass; a failed poll returns the
/// current value with [`Termination::Interrupted`]. With
/// `config.interior`, `directions` must carry simplex blocks for the bounds
/// to apply; otherwise the line searches are unconstrained.
pub fn minimize<O: Objective + ?Sized>(
    point: &mut [f64],
    directions: &mut DirectionSet,
    objective: &mut O,
    config: &PowellConfig,
    trace_out: &mut Trace<'_>,
    status: &mut dyn Status,
) -> Minimum {
    assert_eq!(point.len(), directions.len(), "point and direction set differ in dimension");

    let n = point.len();
    let blocks = if config.interior {
        directions.blocks().map(<[usize]>::to_vec)
    } else {
        None
    };

    let mut fret = objective.evaluate(point);
    let mut pass_start = point.to_vec();
    let mut history = Vec::with_capacity(config.maxits_n);
    let mut iterations = 0;
    let mut termination = Termination::MaxIterations;

    for iter in 1..=config.maxits_n {
        if status.poll().is_err() {
            termination = Termination::Interrupted;
            break;
        }

        let fp = fret;
        let mut biggest = 0;
        let mut biggest_drop = 0.0;
        for i in 0..n {
            let direction = directions.row(i).to_vec();
            let before = fret;
            fret = line_minimize(point, &direction, fret, objective, config, blocks.as_deref());
            if before - fret > biggest_drop {
                biggest_drop = before - fret;
                biggest = i;
            }
        }

        iterations = iter;
        history.push(fret);
        trace!("powell pass {}: {:.3e} -> {:.3e}", iter, fp, fret);
        trace_out.line(2, format_args!("  pass {} value {:e}", iter, fret));

        if fret <= config.tol_n || 2.0 * (fp - fret) <= config.tol_n * (fp.abs() + fret.abs()) + TINY {
            termination = Termination::Converged;
            break;
        }

        let displacement: Vec<f64> = point.iter().zip(&pass_start).map(|(x, s)| x - s).collect();
        let extrapolated: Vec<f64> = point.iter().zip(&pass_start).map(|(x, s)| 2.0 * x - s).collect();
        pass_start.copy_from_slice(point);

        if displacement.iter().all(|d| d.abs() < f64::EPSILON) {
            continue;
        }
        if let Some(blocks) = &blocks {
            if !line::on_simplex(&extrapolated, blocks) {
                continue;
            }
        }
        let fe = objective.evaluate(&extrapolated);
        if !fe.is_finite() || fe >= fp {
            continue;
        }

        let t = 2.0 * (fp - 2.0 * fret + fe) * (fp - fret - biggest_drop).powi(2)
            - biggest_drop * (fp - fe).powi(2);
        if t < 0.0 {
            fret = line_minimize(point, &displacement, fret, objective, config, blocks.as_deref());
            directions.replace(biggest, displacement);
        }
    }

    Minimum {
        value: fret,
        iterations,
        termination,
        history,
    }
}

/// Move `point` to the minimum along `direction`; returns the new value.
fn line_minimize<O: Objective + ?Sized>(
    point: &mut [f64],
    direction: &[f64],
    f0: f64,
    objective: &mut O,
    config: &PowellConfig,
    blocks: Option<&[usize]>,
) -> f64 {
    if direction.iter().all(|&d| d == 0.0) {
        return f0;
    }

    let (t, f) = {
        let mut line = Line::new(&mut *objective, point, direction);
        match blocks {
            Some(blocks) => {
                let (lo, hi) = line::step_bounds(point, direction, blocks);
                let (lo, hi) = (lo * (1.0 - EDGE), hi * (1.0 - EDGE));
                if hi - lo <= 0.0 {
                    return f0;
                }
                line::brent(&mut line, lo, hi, 0.0, f0, config.tol_1, config.maxits_1)
            }
            None => {
                let br = line::bracket(&mut line, f0, config.maxits_1);
                line::brent(&mut line, br.a, br.c, br.b, br.fb, config.tol_1, config.maxits_1)
            }
        }
    };

    if f > f0 || !f.is_finite() {
        return f0;
    }
    for (x, d) in point.iter_mut().zip(direction) {
        *x += t * d;
    }
    f
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Support;
    use crate::games::matrix::{bimatrix, decision};
    use crate::liap::objective::{FnObjective, LiapObjective};
    use crate::liap::profile::BehaviorProfile;
    use crate::liap::status::{NullStatus, PollFn};

    fn unconstrained() -> PowellConfig {
        PowellConfig {
            interior: false,
            ..PowellConfig::default()
        }
    }

    #[test]
    fn test_simplex_basis_has_one_row_per_free_coordinate() {
        let set = DirectionSet::simplex(&[3, 1, 2]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.blocks(), Some(&[3, 1, 2][..]));
        assert_eq!(set.row(0), &[1.0, 0.0, 0.0]);
        assert_eq!(set.row(2), &[0.0, 0.0, 1.0]);
        assert!(DirectionSet::simplex(&[1, 1]).is_empty());
        assert_eq!(DirectionSet::identity(3).blocks(), None);
    }

    #[test]
    fn test_simplex_directions_keep_infoset_sums() {
        let tree = decision(&[0.0, 1.0, 2.0]).unwrap();
        let mut profile = BehaviorProfile::centroid(&Support::full(&tree));
        let set = DirectionSet::simplex(profile.block_lengths());
        for i in 0..set.len() {
            let x: Vec<f64> = profile
                .free_vector()
                .iter()
                .zip(set.row(i))
                .map(|(x, d)| x + 0.1 * d)
                .collect();
            profile.set_free_vector(&x);
            let sum: f64 = profile.as_slice().iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
        // Each step moved mass from the last action onto action i.
        assert!((profile.get(0, 0, 2) -(1.0 / 3.0 - 0.2)).abs() < 1e-12);
    }

    #[test]
    fn test_replace_and_reset() {
        let mut set = DirectionSet::simplex(&[2, 2, 2]);
        let original = set.clone();
        set.replace(0, vec![3.0, 4.0, 0.0]);
        assert_eq!(set.row(0), &[0.0, 0.0, 1.0]);
        assert_eq!(set.row(2), &[0.6, 0.8, 0.0]);
        set.reset();
        assert_eq!(set, original);

        let mut id = DirectionSet::identity(2);
        id.replace(1, vec![1.0, 1.0]);
        id.reset();
        assert_eq!(id, DirectionSet::identity(2));
    }

    #[test]
    fn test_quadratic_bowl() {
        let mut objective = FnObjective::new(|x: &[f64]| {
            let (a, b) = (x[0] - 1.0, x[1] + 2.0);
            a * a + 10.0 * b * b + a * b
        });
        let mut point = vec![0.0, 0.0];
        let mut directions = DirectionSet::identity(2);
        let min = minimize(
            &mut point,
            &mut directions,
            &mut objective,
            &unconstrained(),
            &mut Trace::off(),
            &mut NullStatus,
        );

        assert!(min.converged());
        assert!(min.value < 1e-9);
        assert!((point[0] - 1.0).abs() < 1e-4);
        assert!((point[1] + 2.0).abs() < 1e-4);
        assert_eq!(min.history.len(), min.iterations);
    }

    #[test]
    fn test_rosenbrock_descent_is_monotone() {
        let mut objective = FnObjective::new(|x: &[f64]| {
            (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)
        });
        let mut point = vec![-1.2, 1.0];
        let start = 24.2;
        let mut directions = DirectionSet::identity(2);
        let min = minimize(
            &mut point,
            &mut directions,
            &mut objective,
            &unconstrained(),
            &mut Trace::off(),
            &mut NullStatus,
        );

        assert!(min.value < start);
        assert!(min.history.windows(2).all(|w| w[1] <= w[0]));
        assert!(objective.evaluations() > 0);
    }

    #[test]
    fn test_interior_search_stays_on_simplex() {
        let tree = decision(&[0.0, 1.0, 0.5]).unwrap();
        let profile = BehaviorProfile::centroid(&Support::full(&tree));
        let mut point = profile.free_vector();
        let mut directions = DirectionSet::simplex(profile.block_lengths());
        let mut objective = LiapObjective::new(&tree, profile);

        let min = minimize(
            &mut point,
            &mut directions,
            &mut objective,
            &PowellConfig::default(),
            &mut Trace::off(),
            &mut NullStatus,
        );

        assert!(min.converged());
        assert!(min.value <= 1e-10);
        let mut result = objective.into_profile();
        result.set_free_vector(&point);
        assert!(result.as_slice().iter().all(|&p| p >= 0.0));
        assert!(result.get(0, 0, 1) > 1.0 - 1e-4);
    }

    #[test]
    fn test_interior_descent_is_monotone_on_matrix_game() {
        // Battle of the sexes, started off-equilibrium.
        let tree = bimatrix(&[[2.0, 0.0], [0.0, 1.0]], &[[1.0, 0.0], [0.0, 2.0]]).unwrap();
        let support = Support::full(&tree);
        let profile = BehaviorProfile::from_probs(&support, vec![0.9, 0.1, 0.2, 0.8]).unwrap();
        let mut point = profile.free_vector();
        let mut directions = DirectionSet::simplex(profile.block_lengths());
        let start = profile.liap_value(&tree);
        let mut objective = LiapObjective::new(&tree, profile);

        let min = minimize(
            &mut point,
            &mut directions,
            &mut objective,
            &PowellConfig::default(),
            &mut Trace::off(),
            &mut NullStatus,
        );
        assert!(min.value <= start);
        assert!(min.history.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_interrupt_on_first_poll() {
        let mut objective = FnObjective::new(|x: &[f64]| x[0] * x[0]);
        let mut point = vec![1.0];
        let mut directions = DirectionSet::identity(1);
        let min = minimize(
            &mut point,
            &mut directions,
            &mut objective,
            &unconstrained(),
            &mut Trace::off(),
            &mut PollFn(|| false),
        );
        assert_eq!(min.termination, Termination::Interrupted);
        assert_eq!(min.iterations, 0);
        assert_eq!(min.value, 1.0);
        assert_eq!(point, vec![1.0]);
    }

    #[test]
    fn test_zero_dimensional_space_converges_immediately() {
        let mut objective = FnObjective::new(|_: &[f64]| 0.0);
        let mut point: Vec<f64> = Vec::new();
        let mut directions = DirectionSet::simplex(&[1, 1]);
        let min = minimize(
            &mut point,
            &mut directions,
            &mut objective,
            &PowellConfig::default(),
            &mut Trace::off(),
            &mut NullStatus,
        );
        assert!(min.converged());
        assert_eq!(min.iterations, 1);
    }

    #[test]
    fn test_pass_values_are_traced() {
        let mut buf: Vec<u8> = Vec::new();
        {
            let mut trace = Trace::new(Some(&mut buf), 2);
            let mut objective = FnObjective::new(|x: &[f64]| (x[0] - 2.0).powi(2));
            let mut point = vec![0.0];
            minimize(
                &mut point,
                &mut DirectionSet::identity(1),
                &mut objective,
                &unconstrained(),
                &mut trace,
                &mut NullStatus,
            );
        }
        assert!(String::from_utf8(buf).unwrap().starts_with("  pass 1 value"));
    }
}
