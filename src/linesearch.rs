//! Backtracking line search along the negative gradient direction

use ndarray::Array2;

use crate::norm::Norm;
use crate::objective::objective;

/// Finds a step length along `(W, Z)` by backtracking.
///
/// Starts at `initial_step` (negative by convention) and halves toward zero until the
/// sufficient-decrease condition `f(t) - f(0) <= 0.5 * t * (||W||^2 + ||Z||^2)` holds. If no
/// halving within the budget satisfies it, the smallest-magnitude step tried is returned anyway
/// and the caller applies it as-is.
#[allow(clippy::too_many_arguments)]
pub(crate) fn line_search(
    x: &Array2<f64>,
    w: &Array2<f64>,
    y: &Array2<f64>,
    z: &Array2<f64>,
    s: &Array2<f64>,
    m: &Array2<f64>,
    e: &Array2<f64>,
    m0: f64,
    rho: f64,
    initial_step: f64,
    max_halvings: usize,
) -> f64 {
    let norm_sq = w.norm_l2_sq() + z.norm_l2_sq();
    let f0 = objective(x, y, s, m, e, m0, rho);

    let mut t = initial_step;
    for _ in 0..max_halvings {
        let xt = x + &(t * w);
        let yt = y + &(t * z);
        let ft = objective(&xt, &yt, s, m, e, m0, rho);
        if ft - f0 <= 0.5 * t * norm_sq {
            return t;
        }
        t /= 2.0;
    }
    t
}
