//! One-dimensional minimization along a search direction.
//!
//! [`Line`] restricts an [`Objective`] to `t ↦ f(origin + t · direction)`.
//! [`bracket`] and [`brent`] follow the usual golden-section/parabolic
//! scheme. [`step_bounds`] gives the range of `t` that keeps every
//! probability of a simplex-parametrized point non-negative.

use crate::liap::objective::Objective;

const GOLD: f64 = 1.618_034;
const GLIMIT: f64 = 100.0;
const TINY: f64 = 1.0e-20;
const CGOLD: f64 = 0.381_966_0;
const ZEPS: f64 = 1.0e-10;

/// An objective restricted to a line.
pub(crate) struct Line<'a, O: ?Sized> {
    objective: &'a mut O,
    origin: &'a [f64],
    direction: &'a [f64],
    scratch: Vec<f64>,
}

impl<'a, O: Objective + ?Sized> Line<'a, O> {
    pub(crate) fn new(objective: &'a mut O, origin: &'a [f64], direction: &'a [f64]) -> Self {
        Self {
            objective,
            origin,
            direction,
            scratch: vec![0.0; origin.len()],
        }
    }

    pub(crate) fn value(&mut self, t: f64) -> f64 {
        for ((s, x), d) in self.scratch.iter_mut().zip(self.origin).zip(self.direction) {
            *s = x + t * d;
        }
        self.objective.evaluate(&self.scratch)
    }
}

/// Three abscissas with `fb <= fa` and `fb <= fc`, `b` between `a` and `c`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Bracket {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub fb: f64,
}

/// Expand downhill from `t = 0` (value `f0`) until a minimum is bracketed.
///
/// Gives up after `max_steps` expansions and returns the best triple found.
pub(crate) fn bracket<O: Objective + ?Sized>(
    line: &mut Line<'_, O>,
    f0: f64,
    max_steps: usize,
) -> Bracket {
    let (mut ax, mut bx) = (0.0, 1.0);
    let mut fa = f0;
    let mut fb = line.value(bx);
    if fb > fa {
        std::mem::swap(&mut ax, &mut bx);
        std::mem::swap(&mut fa, &mut fb);
    }
    let mut cx = bx + GOLD * (bx - ax);
    let mut fc = line.value(cx);

    let mut steps = 0;
    while fb > fc && steps < max_steps {
        steps += 1;
        let r = (bx - ax) * (fb - fc);
        let q = (bx - cx) * (fb - fa);
        let denom = 2.0 * (q - r).abs().max(TINY).copysign(q - r);
        let mut u = bx - ((bx - cx) * q - (bx - ax) * r) / denom;
        let ulim = bx + GLIMIT * (cx - bx);
        let mut fu;

        if (bx - u) * (u - cx) > 0.0 {
            fu = line.value(u);
            if fu < fc {
                return Bracket {
                    a: bx,
                    b: u,
                    c: cx,
                    fb: fu,
                };
            } else if fu > fb {
                return Bracket {
                    a: ax,
                    b: bx,
                    c: u,
                    fb,
                };
            }
            u = cx + GOLD * (cx - bx);
            fu = line.value(u);
        } else if (cx - u) * (u - ulim) > 0.0 {
            fu = line.value(u);
            if fu < fc {
                bx = cx;
                cx = u;
                u = cx + GOLD * (cx - bx);
                fb = fc;
                fc = fu;
                fu = line.value(u);
            }
        } else if (u - ulim) * (ulim - cx) >= 0.0 {
            u = ulim;
            fu = line.value(u);
        } else {
            u = cx + GOLD * (cx - bx);
            fu = line.value(u);
        }

        ax = bx;
        bx = cx;
        cx = u;
        fa = fb;
        fb = fc;
        fc = fu;
    }

    if fc < fb {
        // Expansion budget ran out while still descending.
        return Bracket {
            a: bx,
            b: cx,
            c: cx,
            fb: fc,
        };
    }
    Bracket {
        a: ax,
        b: bx,
        c: cx,
        fb,
    }
}

/// Brent's method on `[a, b]` starting from `x0` with known value `fx0`.
///
/// Returns `(t, f(t))`. The start point is the incumbent, so the returned
/// value never exceeds `fx0`.
pub(crate) fn brent<O: Objective + ?Sized>(
    line: &mut Line<'_, O>,
    a: f64,
    b: f64,
    x0: f64,
    fx0: f64,
    tol: f64,
    max_iter: usize,
) -> (f64, f64) {
    let (mut a, mut b) = (a.min(b), a.max(b));
    let (mut x, mut w, mut v) = (x0, x0, x0);
    let (mut fx, mut fw, mut fv) = (fx0, fx0, fx0);
    let mut d: f64 = 0.0;
    let mut e: f64 = 0.0;

    for _ in 0..max_iter {
        let xm = 0.5 * (a + b);
        let tol1 = tol * x.abs() + ZEPS;
        let tol2 = 2.0 * tol1;
        if (x - xm).abs() <= tol2 - 0.5 * (b - a) {
            break;
        }

        if e.abs() > tol1 {
            let r = (x - w) * (fx - fv);
            let mut q = (x - v) * (fx - fw);
            let mut p = (x - v) * q - (x - w) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            let etemp = e;
            e = d;
            if p.abs() >= (0.5 * q * etemp).abs() || p <= q * (a - x) || p >= q * (b - x) {
                e = if x >= xm { a - x } else { b - x };
                d = CGOLD * e;
            } else {
                d = p / q;
                let u = x + d;
                if u - a < tol2 || b - u < tol2 {
                    d = tol1.copysign(xm - x);
                }
            }
        } else {
            e = if x >= xm { a - x } else { b - x };
            d = CGOLD * e;
        }

        let u = if d.abs() >= tol1 {
            x + d
        } else {
            x + tol1.copysign(d)
        };
        let fu = line.value(u);

        if fu <= fx {
            if u >= x {
                a = x;
            } else {
                b = x;
            }
            v = w;
            w = x;
            x = u;
            fv = fw;
            fw = fx;
            fx = fu;
        } else {
            if u < x {
                a = u;
            } else {
                b = u;
            }
            if fu <= fw || w == x {
                v = w;
                w = u;
                fv = fw;
                fw = fu;
            } else if fu <= fv || v == x || v == w {
                v = u;
                fv = fu;
            }
        }
    }

    (x, fx)
}

/// Range `[lo, hi]` of steps along `direction` keeping every probability of
/// the free-vector point `x` non-negative.
///
/// `blocks` holds live-action counts per infoset; each block of `n` live
/// actions owns `n - 1` consecutive free coordinates, its last probability
/// being one minus their sum. The range always contains zero.
pub(crate) fn step_bounds(x: &[f64], direction: &[f64], blocks: &[usize]) -> (f64, f64) {
    let mut lo = f64::NEG_INFINITY;
    let mut hi = f64::INFINITY;
    let mut limit = |value: f64, slope: f64| {
        if slope > 0.0 {
            lo = lo.max(-value / slope);
        } else if slope < 0.0 {
            hi = hi.min(-value / slope);
        }
    };

    let mut start = 0;
    for &n in blocks {
        let free = n - 1;
        let xs = &x[start..start + free];
        let ds = &direction[start..start + free];
        for (&xi, &di) in xs.iter().zip(ds) {
            limit(xi, di);
        }
        limit(1.0 - xs.iter().sum::<f64>(), -ds.iter().sum::<f64>());
        start += free;
    }

    (lo.min(0.0), hi.max(0.0))
}

/// Whether every probability of the free-vector point `x` is non-negative.
pub(crate) fn on_simplex(x: &[f64], blocks: &[usize]) -> bool {
    let mut start = 0;
    for &n in blocks {
        let xs = &x[start..start + n - 1];
        if xs.iter().any(|&p| p < 0.0) || xs.iter().sum::<f64>() > 1.0 {
            return false;
        }
        start += n - 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liap::objective::FnObjective;

    #[test]
    fn test_step_bounds_two_action_block() {
        // p = 0.25 free, implied 0.75; direction +1 on the free coordinate.
        let (lo, hi) = step_bounds(&[0.25], &[1.0], &[2]);
        assert!((lo + 0.25).abs() < 1e-15);
        assert!((hi - 0.75).abs() < 1e-15);
    }

    #[test]
    fn test_step_bounds_single_action_blocks_are_ignored() {
        let (lo, hi) = step_bounds(&[0.5, 0.2], &[0.0, -1.0], &[1, 2, 1, 2]);
        assert!((lo + 0.8).abs() < 1e-15);
        assert!((hi - 0.2).abs() < 1e-15);
    }

    #[test]
    fn test_on_simplex() {
        assert!(on_simplex(&[0.2, 0.3], &[3]));
        assert!(!on_simplex(&[0.7, 0.4], &[3]));
        assert!(!on_simplex(&[-0.1], &[2]));
    }

    #[test]
    fn test_bracket_then_brent_finds_parabola_minimum() {
        let mut objective = FnObjective::new(|x: &[f64]| (x[0] - 3.0).powi(2) + 1.0);
        let origin = [0.0];
        let direction = [1.0];
        let mut line = Line::new(&mut objective, &origin, &direction);

        let br = bracket(&mut line, 10.0, 50);
        assert!(br.a.min(br.c) <= 3.0 && 3.0 <= br.a.max(br.c));

        let (t, f) = brent(&mut line, br.a, br.c, br.b, br.fb, 2e-10, 100);
        assert!((t - 3.0).abs() < 1e-6);
        assert!((f - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_brent_never_worse_than_start() {
        // Minimum at the lower boundary of the interval.
        let mut objective = FnObjective::new(|x: &[f64]| x[0]);
        let origin = [0.5];
        let direction = [1.0];
        let mut line = Line::new(&mut objective, &origin, &direction);
        let (t, f) = brent(&mut line, -0.5, 0.5, 0.0, 0.5, 2e-10, 100);
        assert!(f <= 0.5);
        assert!(t >= -0.5 && t < -0.49);
    }
}
