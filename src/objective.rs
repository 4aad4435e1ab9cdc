//! Regularized reconstruction cost for a candidate factor pair

use ndarray::Array2;

use crate::norm::Norm;
use crate::penalty::penalty;

/// Reconstruction error `(X * S * Yt - M)` restricted to the observed entries.
pub(crate) fn masked_residual(
    x: &Array2<f64>,
    y: &Array2<f64>,
    s: &Array2<f64>,
    m: &Array2<f64>,
    e: &Array2<f64>,
) -> Array2<f64> {
    let mut resid = x.dot(s).dot(&y.t());
    resid -= m;
    resid * e
}

/// Half the squared Frobenius norm of the masked residual plus the incoherence penalties on both
/// factors weighted by `rho`. Pure; evaluated repeatedly by the line search with perturbed
/// factors.
pub(crate) fn objective(
    x: &Array2<f64>,
    y: &Array2<f64>,
    s: &Array2<f64>,
    m: &Array2<f64>,
    e: &Array2<f64>,
    m0: f64,
    rho: f64,
) -> f64 {
    let r = x.ncols();
    let fit = 0.5 * masked_residual(x, y, s, m, e).norm_l2_sq();
    fit + rho * penalty(y, m0, r) + rho * penalty(x, m0, r)
}
