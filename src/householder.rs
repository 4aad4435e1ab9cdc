use ndarray::{s, Array2, ArrayBase, Data, DataMut, Ix1, Ix2};

use crate::reflection::Reflection;

/// Performs Householder reflection on a single column
///
/// Returns what would be the first component of column after reflection if a reflection was
/// actually performed.
pub fn reflection_axis_mut<S: DataMut<Elem = f64>>(col: &mut ArrayBase<S, Ix1>) -> Option<f64> {
    let reflection_norm_sq = col.dot(col);
    let reflection_norm = reflection_norm_sq.sqrt();

    let first = col[0];
    let signed_norm = first.signum() * reflection_norm;
    col[0] += signed_norm;
    // Believe it or not, this is equal to `norm(col)^2`
    let new_norm_sq = (reflection_norm_sq + first.abs() * reflection_norm) * 2.0;

    if new_norm_sq != 0.0 {
        *col /= new_norm_sq.sqrt();
        Some(-signed_norm)
    } else {
        None
    }
}

/// Uses an householder reflection to zero out the `icol`-th column, starting with the `shift + 1`-th
/// subdiagonal element.
///
/// Returns the signed norm of the column.
pub fn clear_column<S: DataMut<Elem = f64>>(
    matrix: &mut ArrayBase<S, Ix2>,
    icol: usize,
    shift: usize,
) -> f64 {
    let (mut left, mut right) = matrix.multi_slice_mut((s![.., icol], s![.., icol + 1..]));
    let mut axis = left.slice_mut(s![icol + shift..]);
    let refl_norm = reflection_axis_mut(&mut axis);

    if let Some(refl_norm) = refl_norm {
        let refl = Reflection::new(axis, 0.0);
        let sign = refl_norm.signum();
        let mut refl_rows = right.slice_mut(s![icol + shift.., ..]);
        refl.reflect_cols(&mut refl_rows);
        refl_rows *= sign;
    }
    refl_norm.unwrap_or(0.0)
}

/// Uses an householder reflection to zero out the `irow`-th row, ending before the `shift + 1`-th
/// superdiagonal element.
///
/// Returns the signed norm of the column.
pub fn clear_row<S: DataMut<Elem = f64>>(
    matrix: &mut ArrayBase<S, Ix2>,
    irow: usize,
    shift: usize,
) -> f64 {
    clear_column(&mut matrix.view_mut().reversed_axes(), irow, shift)
}

/// Used to assemble `U` and `Vt` for bidiagonal decompositions.
///
/// Panics if `shift` exceeds either dimension of `matrix`.
pub fn assemble_q<S: Data<Elem = f64>>(
    matrix: &ArrayBase<S, Ix2>,
    shift: usize,
    sign_fn: impl Fn(usize) -> f64,
) -> Array2<f64> {
    let (nrows, ncols) = matrix.dim();
    let dim = nrows.min(ncols);
    let mut res = if nrows == ncols {
        Array2::eye(nrows)
    } else {
        let mut a = Array2::zeros((nrows, dim));
        a.diag_mut().fill(1.0);
        a
    };

    for i in (0..dim - shift).rev() {
        let axis = matrix.slice(s![i + shift.., i]);
        let refl = Reflection::new(axis, 0.0);

        let mut res_rows = res.slice_mut(s![i + shift.., i..]);
        refl.reflect_cols(&mut res_rows);
        // Absorb the sign of the stored pivot; signum(0) is 1 so empty reflections are no-ops.
        res_rows *= sign_fn(i).signum();
    }

    res
}
