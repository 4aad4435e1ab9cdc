//! Incoherence penalty keeping factor rows inside a norm radius

use ndarray::{Array2, ArrayBase, Data, Ix2};

/// Penalty on rows whose squared norm exceeds `2 * m0 * r`.
///
/// Rows inside the radius contribute exactly zero; outside it the contribution grows as
/// `exp((z - 1)^2) - 1` in the normalized squared norm `z`. An overflowed exponential counts as
/// zero: a row that far out is already past any useful radius and must not blow up the objective.
pub(crate) fn penalty<S: Data<Elem = f64>>(x: &ArrayBase<S, Ix2>, m0: f64, r: usize) -> f64 {
    let radius = 2.0 * m0 * r as f64;
    x.rows()
        .into_iter()
        .map(|row| {
            let z = row.dot(&row) / radius;
            if z < 1.0 {
                return 0.0;
            }
            let y = ((z - 1.0) * (z - 1.0)).exp() - 1.0;
            if y.is_finite() {
                y
            } else {
                0.0
            }
        })
        .sum()
}

/// Row-wise gradient of [`penalty`] with respect to `x`.
///
/// Each row is scaled by `2 * exp((z - 1)^2) * (z - 1) / (m0 * r)`, clipped to nonnegative so
/// rows inside the radius contribute a zero row rather than a reward.
pub(crate) fn penalty_grad<S: Data<Elem = f64>>(
    x: &ArrayBase<S, Ix2>,
    m0: f64,
    r: usize,
) -> Array2<f64> {
    let radius = 2.0 * m0 * r as f64;
    let mut out = x.to_owned();
    for mut row in out.rows_mut() {
        let z = row.dot(&row) / radius;
        let scale = 2.0 * ((z - 1.0) * (z - 1.0)).exp() * (z - 1.0);
        let scale = scale.max(0.0) / (m0 * r as f64);
        row.mapv_inplace(|v| v * scale);
    }
    out
}
