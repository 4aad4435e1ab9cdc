//! Gradient of the regularized reconstruction cost

use ndarray::Array2;

use crate::objective::masked_residual;
use crate::penalty::penalty_grad;

/// Gradient of the objective with respect to both factors.
///
/// The correction terms `X * Qx` and `Y * Qy` project out the part of the raw gradient lying in
/// the span of the current factors scaled through `S`, so steps do not drift along directions
/// that merely rescale the factorization without improving the fit.
pub(crate) fn gradient(
    x: &Array2<f64>,
    y: &Array2<f64>,
    s: &Array2<f64>,
    m: &Array2<f64>,
    e: &Array2<f64>,
    m0: f64,
    rho: f64,
) -> (Array2<f64>, Array2<f64>) {
    let r = x.ncols();
    let n = x.nrows() as f64;
    let d = y.nrows() as f64;

    let xs = x.dot(s);
    let ys = y.dot(&s.t());
    // (X * S * Yt - M) masked to the observed entries
    let resid = masked_residual(x, y, s, m, e);

    let qx = x.t().dot(&resid).dot(&ys) / -n;
    let qy = y.t().dot(&resid.t()).dot(&xs) / -d;

    let w = resid.dot(&ys) + x.dot(&qx) + rho * penalty_grad(x, m0, r);
    let z = resid.t().dot(&xs) + y.dot(&qy) + rho * penalty_grad(y, m0, r);
    (w, z)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    use super::*;
    use crate::objective::objective;

    #[test]
    fn shapes_follow_factors() {
        let x = array![[1.0f64, 0.], [0., 1.], [1., 1.]];
        let y = array![[1.0f64, 2.], [3., 4.]];
        let s = array![[1.0f64, 0.], [0., 1.]];
        let m = Array2::ones((3, 2));
        let e = Array2::ones((3, 2));

        let (w, z) = gradient(&x, &y, &s, &m, &e, 10000.0, 0.1);
        assert_eq!(w.dim(), (3, 2));
        assert_eq!(z.dim(), (2, 2));
    }

    #[test]
    fn vanishes_at_exact_fit() {
        // At a perfect reconstruction the residual term and its correction both vanish, and the
        // tiny factors stay inside the penalty radius.
        let x = array![[1.0f64], [2.]];
        let y = array![[1.0f64], [-1.]];
        let s = array![[3.0f64]];
        let m = x.dot(&s).dot(&y.t());
        let e = Array2::ones((2, 2));

        let (w, z) = gradient(&x, &y, &s, &m, &e, 10000.0, 0.1);
        assert_abs_diff_eq!(w, Array2::zeros((2, 1)));
        assert_abs_diff_eq!(z, Array2::zeros((2, 1)));
    }

    #[test]
    fn matches_finite_differences() {
        let x = array![[0.8f64, -0.3], [0.1, 0.5], [-0.7, 0.2]];
        let y = array![[0.4f64, 0.9], [-0.2, 0.3]];
        let s = array![[1.1f64, 0.2], [-0.4, 0.8]];
        let m = array![[0.3f64, -0.1], [0.2, 0.4], [-0.5, 0.6]];
        let e = array![[1.0f64, 0.], [1., 1.], [0., 1.]];
        let (m0, rho) = (10000.0, 0.3);

        let (w, z) = gradient(&x, &y, &s, &m, &e, m0, rho);

        // The correction terms make W and Z differ from the plain objective gradient by
        // components in the factor spans, so compare against finite differences of the objective
        // with the correction removed.
        let xs = x.dot(&s);
        let ys = y.dot(&s.t());
        let resid = masked_residual(&x, &y, &s, &m, &e);
        let qx = x.t().dot(&resid).dot(&ys) / -(x.nrows() as f64);
        let qy = y.t().dot(&resid.t()).dot(&xs) / -(y.nrows() as f64);
        let w_plain = &w - &x.dot(&qx);
        let z_plain = &z - &y.dot(&qy);

        let h = 1e-6;
        for i in 0..x.nrows() {
            for j in 0..x.ncols() {
                let mut xp = x.clone();
                xp[(i, j)] += h;
                let mut xm = x.clone();
                xm[(i, j)] -= h;
                let fd = (objective(&xp, &y, &s, &m, &e, m0, rho)
                    - objective(&xm, &y, &s, &m, &e, m0, rho))
                    / (2.0 * h);
                assert_abs_diff_eq!(w_plain[(i, j)], fd, epsilon = 1e-4);
            }
        }
        for i in 0..y.nrows() {
            for j in 0..y.ncols() {
                let mut yp = y.clone();
                yp[(i, j)] += h;
                let mut ym = y.clone();
                ym[(i, j)] -= h;
                let fd = (objective(&x, &yp, &s, &m, &e, m0, rho)
                    - objective(&x, &ym, &s, &m, &e, m0, rho))
                    / (2.0 * h);
                assert_abs_diff_eq!(z_plain[(i, j)], fd, epsilon = 1e-4);
            }
        }
    }
}
