//! Log-ratio coordinates for compositional data
//!
//! Compositional rows (relative abundances, proportions) live on a simplex where ordinary
//! euclidean operations are meaningless. The isometric log-ratio transform maps each d-part
//! composition to an unconstrained real vector of length d - 1 through an orthonormal basis in
//! centered log-ratio space, and its inverse maps solver output back onto the simplex. All
//! transforms operate row-wise and are independent of the completion rank.

use ndarray::{Array2, ArrayBase, Axis, Data, Ix2};

/// Replaces NaN entries with the running mean of the preceding entries in the same row.
///
/// Earlier imputed values take part in later means. The first column is assumed observed;
/// applied in log space this fills gaps with the running geometric mean of the raw data.
pub fn impute_running_mean<S: Data<Elem = f64>>(mat: &ArrayBase<S, Ix2>) -> Array2<f64> {
    let mut out = mat.to_owned();
    for mut row in out.rows_mut() {
        for i in 1..row.len() {
            if row[i].is_nan() {
                let mean = row.slice(ndarray::s![..i]).mean().unwrap();
                row[i] = mean;
            }
        }
    }
    out
}

/// The (d-1)×d orthonormal ilr basis in clr space obtained by Gram-Schmidt.
///
/// Row j contrasts the first j + 1 parts against part j + 2.
pub fn gram_schmidt_basis(d: usize) -> Array2<f64> {
    let mut basis = Array2::zeros((d - 1, d));
    for j in 0..d - 1 {
        let i = (j + 1) as f64;
        let norm = (i / (i + 1.0)).sqrt();
        for k in 0..j + 1 {
            basis[(j, k)] = norm / i;
        }
        basis[(j, j + 1)] = -norm;
    }
    basis
}

/// Row-wise centered log-ratio transform: `ln x_i - mean(ln x)`.
///
/// Rows must be strictly positive. Invariant under row rescaling, so rows need not be closed
/// beforehand.
pub fn clr<S: Data<Elem = f64>>(mat: &ArrayBase<S, Ix2>) -> Array2<f64> {
    let mut out = mat.mapv(f64::ln);
    for mut row in out.rows_mut() {
        let mean = row.mean().unwrap();
        row -= mean;
    }
    out
}

/// Inverse of [`clr`]: row-wise exponentials closed to sum to one.
pub fn clr_inv<S: Data<Elem = f64>>(mat: &ArrayBase<S, Ix2>) -> Array2<f64> {
    let mut out = mat.mapv(f64::exp);
    for mut row in out.rows_mut() {
        let total = row.sum();
        row /= total;
    }
    out
}

/// Isometric log-ratio transform of compositions against an orthonormal clr-space basis.
///
/// Input is n×d with strictly positive entries, `basis` is (d-1)×d, output is n×(d-1).
pub fn ilr<S: Data<Elem = f64>, Sb: Data<Elem = f64>>(
    mat: &ArrayBase<S, Ix2>,
    basis: &ArrayBase<Sb, Ix2>,
) -> Array2<f64> {
    clr(mat).dot(&basis.t())
}

/// Inverse of [`ilr`]: maps n×(d-1) coordinates back to n×d compositions summing to one.
pub fn ilr_inv<S: Data<Elem = f64>, Sb: Data<Elem = f64>>(
    coords: &ArrayBase<S, Ix2>,
    basis: &ArrayBase<Sb, Ix2>,
) -> Array2<f64> {
    clr_inv(&coords.dot(basis))
}

/// Closes each row to sum to one.
pub fn closure<S: Data<Elem = f64>>(mat: &ArrayBase<S, Ix2>) -> Array2<f64> {
    let mut out = mat.to_owned();
    for mut row in out.rows_mut() {
        let total = row.sum();
        row /= total;
    }
    out
}

/// Reverses the rows of a basis, matching the ordering convention the compositional completion
/// pipeline pairs with its observation mask.
pub(crate) fn reversed<S: Data<Elem = f64>>(basis: &ArrayBase<S, Ix2>) -> Array2<f64> {
    let mut rev = basis.to_owned();
    rev.invert_axis(Axis(0));
    rev
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    use super::*;

    #[test]
    fn running_mean_fills_gaps() {
        let m = array![[2.0f64, f64::NAN, 4., f64::NAN], [1., 2., 3., 4.]];
        let out = impute_running_mean(&m);
        // First gap: mean(2) = 2; second gap: mean(2, 2, 4) = 8/3.
        assert_abs_diff_eq!(out.row(0), array![2.0, 2., 4., 8.0 / 3.0].view());
        // Fully observed rows pass through untouched.
        assert_abs_diff_eq!(out.row(1), m.row(1));
    }

    #[test]
    fn basis_is_orthonormal() {
        let b = gram_schmidt_basis(5);
        assert_eq!(b.dim(), (4, 5));
        assert_abs_diff_eq!(b.dot(&b.t()), Array2::eye(4), epsilon = 1e-12);
        // Every contrast is orthogonal to the all-ones direction, as clr coordinates are.
        for row in b.rows() {
            assert_abs_diff_eq!(row.sum(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn clr_round_trip() {
        let comp = array![[0.2f64, 0.3, 0.5], [0.1, 0.6, 0.3]];
        assert_abs_diff_eq!(clr_inv(&clr(&comp)), comp, epsilon = 1e-12);
    }

    #[test]
    fn ilr_round_trip() {
        let comp = array![[0.2f64, 0.3, 0.5], [0.25, 0.25, 0.5], [0.7, 0.1, 0.2]];
        let basis = gram_schmidt_basis(3);
        let coords = ilr(&comp, &basis);
        assert_eq!(coords.dim(), (3, 2));
        assert_abs_diff_eq!(ilr_inv(&coords, &basis), comp, epsilon = 1e-12);
    }

    #[test]
    fn ilr_ignores_row_scale() {
        let comp = array![[0.2f64, 0.3, 0.5]];
        let scaled = comp.mapv(|v| v * 40.0);
        let basis = gram_schmidt_basis(3);
        assert_abs_diff_eq!(ilr(&comp, &basis), ilr(&scaled, &basis), epsilon = 1e-12);
        // The inverse lands on the closed representative.
        assert_abs_diff_eq!(
            ilr_inv(&ilr(&scaled, &basis), &basis),
            closure(&scaled),
            epsilon = 1e-12
        );
    }
}
