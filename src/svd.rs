//! Singular value decomposition of dense matrices

use ndarray::{array, s, Array1, Array2, ArrayBase, Axis, Data, DataMut, Ix2};

use crate::{
    bidiagonal::Bidiagonal, givens::GivensRotation, norm::Norm, OptSpaceError, Result,
};

/// Singular value decomposition, consuming the input
pub trait SVDInto {
    /// Compute the singular value decomposition `U * diag(sigma) * Vt`, reusing the input's
    /// storage. The singular values are nonnegative but in no particular order; use
    /// [`svd_truncated`] for the sorted rank-r form.
    fn svd_into(
        self,
        compute_u: bool,
        compute_v: bool,
    ) -> Result<(Option<Array2<f64>>, Array1<f64>, Option<Array2<f64>>)>;
}

impl<S: DataMut<Elem = f64>> SVDInto for ArrayBase<S, Ix2> {
    fn svd_into(
        self,
        compute_u: bool,
        compute_v: bool,
    ) -> Result<(Option<Array2<f64>>, Array1<f64>, Option<Array2<f64>>)> {
        svd(self, compute_u, compute_v, f64::EPSILON)
    }
}

/// Singular value decomposition of a borrowed matrix
pub trait SVD {
    /// Compute the singular value decomposition `U * diag(sigma) * Vt`.
    fn svd(
        &self,
        compute_u: bool,
        compute_v: bool,
    ) -> Result<(Option<Array2<f64>>, Array1<f64>, Option<Array2<f64>>)>;
}

impl<S: Data<Elem = f64>> SVD for ArrayBase<S, Ix2> {
    fn svd(
        &self,
        compute_u: bool,
        compute_v: bool,
    ) -> Result<(Option<Array2<f64>>, Array1<f64>, Option<Array2<f64>>)> {
        self.to_owned().svd_into(compute_u, compute_v)
    }
}

/// Rank-r truncated singular value decomposition.
///
/// Returns `(U, sigma, Vt)` restricted to the `rank` largest singular values, in descending
/// order. `U` is n×rank, `sigma` has length rank and `Vt` is rank×m.
pub fn svd_truncated<S: Data<Elem = f64>>(
    matrix: &ArrayBase<S, Ix2>,
    rank: usize,
) -> Result<(Array2<f64>, Array1<f64>, Array2<f64>)> {
    let (nrows, ncols) = matrix.dim();
    if rank == 0 || rank > nrows.min(ncols) {
        return Err(OptSpaceError::RankOutOfBounds {
            rows: nrows,
            cols: ncols,
            rank,
        });
    }

    let (u, sigma, vt) = matrix.svd(true, true)?;
    let (u, vt) = (u.unwrap(), vt.unwrap());

    let mut order: Vec<usize> = (0..sigma.len()).collect();
    order.sort_by(|&a, &b| sigma[b].total_cmp(&sigma[a]));
    order.truncate(rank);

    Ok((
        u.select(Axis(1), &order),
        sigma.select(Axis(0), &order),
        vt.select(Axis(0), &order),
    ))
}

fn svd<S: DataMut<Elem = f64>>(
    mut matrix: ArrayBase<S, Ix2>,
    compute_u: bool,
    compute_v: bool,
    eps: f64,
) -> Result<(Option<Array2<f64>>, Array1<f64>, Option<Array2<f64>>)> {
    if matrix.is_empty() {
        return Err(OptSpaceError::EmptyMatrix);
    }
    let (nrows, ncols) = matrix.dim();
    let dim = nrows.min(ncols);

    let amax = matrix.norm_max();
    if amax != 0.0 {
        matrix /= amax;
    }

    let bidiag = matrix.bidiagonal()?;
    let is_upper_diag = bidiag.is_upper_diag();
    let mut u = if compute_u {
        Some(bidiag.generate_u())
    } else {
        None
    };
    let mut vt = if compute_v {
        Some(bidiag.generate_vt())
    } else {
        None
    };
    let (mut diag, mut off_diag) = bidiag.into_diagonals();

    let (mut start, mut end) = delimit_subproblem(
        &mut diag,
        &mut off_diag,
        &mut u,
        &mut vt,
        is_upper_diag,
        dim - 1,
        eps,
    );

    #[allow(clippy::comparison_chain)]
    while end != start {
        let subdim = end - start + 1;

        if subdim > 2 {
            let m = end - 1;
            let n = end;

            let mut vec = {
                let dm = diag[m];
                let dn = diag[n];
                let fm = off_diag[m];
                let fm1 = off_diag[m - 1];

                let tmm = dm * dm + fm1 * fm1;
                let tmn = dm * fm;
                let tnn = dn * dn + fm * fm;
                let shift = wilkinson_shift(tmm, tnn, tmn);

                let ds = diag[start];
                (ds * ds - shift, ds * off_diag[start])
            };

            for k in start..n {
                let m12 = if k == n - 1 { 0.0 } else { off_diag[k + 1] };
                let mut subm = array![[diag[k], off_diag[k], 0.0], [0.0, diag[k + 1], m12]];

                if let Some((rot1, norm1)) = GivensRotation::cancel_y(vec.0, vec.1) {
                    rot1.inverse().rotate_rows(&mut subm.slice_mut(s![.., 0..=1]));

                    if k > start {
                        off_diag[k - 1] = norm1;
                    }

                    let (v1, v2) = (subm[(0, 0)], subm[(1, 0)]);
                    let (rot2, norm2) = if let Some((rot, norm)) = GivensRotation::cancel_y(v1, v2)
                    {
                        rot.rotate_cols(&mut subm.slice_mut(s![.., 1..=2]));
                        (Some(rot), norm)
                    } else {
                        (None, v1)
                    };
                    subm[(0, 0)] = norm2;

                    if let Some(ref mut vt) = vt {
                        if is_upper_diag {
                            rot1.rotate_cols(&mut vt.slice_mut(s![k..k + 2, ..]));
                        } else if let Some(rot2) = &rot2 {
                            rot2.rotate_cols(&mut vt.slice_mut(s![k..k + 2, ..]));
                        }
                    }

                    if let Some(ref mut u) = u {
                        if !is_upper_diag {
                            rot1.inverse().rotate_rows(&mut u.slice_mut(s![.., k..k + 2]));
                        } else if let Some(rot2) = &rot2 {
                            rot2.inverse().rotate_rows(&mut u.slice_mut(s![.., k..k + 2]));
                        }
                    }

                    diag[k] = subm[(0, 0)];
                    diag[k + 1] = subm[(1, 1)];
                    off_diag[k] = subm[(0, 1)];
                    if k != n - 1 {
                        off_diag[k + 1] = subm[(1, 2)];
                    }
                    vec.0 = subm[(0, 1)];
                    vec.1 = subm[(0, 2)];
                } else {
                    break;
                }
            }
        } else if subdim == 2 {
            // Solve 2x2 subproblem
            let (rot_u, rot_v) = {
                let (s1, s2, u2, v2) = compute_2x2_uptrig_svd(
                    diag[start],
                    off_diag[start],
                    diag[start + 1],
                    compute_u && is_upper_diag || compute_v && !is_upper_diag,
                    compute_v && is_upper_diag || compute_u && !is_upper_diag,
                );
                diag[start] = s1;
                diag[start + 1] = s2;
                off_diag[start] = 0.0;

                if is_upper_diag {
                    (u2, v2)
                } else {
                    (v2, u2)
                }
            };

            if let Some(ref mut u) = u {
                rot_u
                    .unwrap()
                    .rotate_rows(&mut u.slice_mut(s![.., start..start + 2]));
            }

            if let Some(ref mut vt) = vt {
                rot_v
                    .unwrap()
                    .inverse()
                    .rotate_cols(&mut vt.slice_mut(s![start..start + 2, ..]));
            }

            end -= 1;
        }

        // Re-delimit the subproblem in case some decoupling occurred.
        let sub = delimit_subproblem(
            &mut diag,
            &mut off_diag,
            &mut u,
            &mut vt,
            is_upper_diag,
            end,
            eps,
        );
        start = sub.0;
        end = sub.1;
    }

    diag *= amax;

    // Ensure singular values are positive
    for i in 0..dim {
        let val = diag[i];
        if val.is_sign_negative() {
            diag[i] = -val;
            if let Some(u) = &mut u {
                u.column_mut(i).mapv_inplace(|x| -x);
            }
        }
    }

    Ok((u, diag, vt))
}

fn delimit_subproblem(
    diag: &mut Array1<f64>,
    off_diag: &mut Array1<f64>,
    u: &mut Option<Array2<f64>>,
    v_t: &mut Option<Array2<f64>>,
    is_upper_diag: bool,
    end: usize,
    eps: f64,
) -> (usize, usize) {
    let mut n = end;
    while n > 0 {
        let m = n - 1;

        if off_diag[m].abs() <= eps * (diag[n].abs() + diag[m].abs()) {
            off_diag[m] = 0.0;
        } else if diag[m].abs() <= eps {
            diag[m] = 0.0;
            cancel_horizontal_off_diagonal_elt(diag, off_diag, u, v_t, is_upper_diag, m, m + 1);
            if m != 0 {
                cancel_vertical_off_diagonal_elt(diag, off_diag, u, v_t, is_upper_diag, m - 1);
            }
        } else if diag[n].abs() <= eps {
            diag[n] = 0.0;
            cancel_vertical_off_diagonal_elt(diag, off_diag, u, v_t, is_upper_diag, m);
        } else {
            break;
        }

        n -= 1;
    }

    if n == 0 {
        return (0, 0);
    }

    let mut new_start = n - 1;
    while new_start > 0 {
        let m = new_start - 1;

        if off_diag[m].abs() <= eps * (diag[new_start].abs() + diag[m].abs()) {
            off_diag[m] = 0.0;
            break;
        }

        if diag[m].abs() <= eps {
            diag[m] = 0.0;
            cancel_horizontal_off_diagonal_elt(diag, off_diag, u, v_t, is_upper_diag, m, n);
            if m != 0 {
                cancel_vertical_off_diagonal_elt(diag, off_diag, u, v_t, is_upper_diag, m - 1);
            }
            break;
        }
        new_start -= 1;
    }

    (new_start, n)
}

fn cancel_horizontal_off_diagonal_elt(
    diag: &mut Array1<f64>,
    off_diag: &mut Array1<f64>,
    u: &mut Option<Array2<f64>>,
    v_t: &mut Option<Array2<f64>>,
    is_upper_diag: bool,
    i: usize,
    end: usize,
) {
    let mut v = (off_diag[i], diag[i + 1]);
    off_diag[i] = 0.0;

    for k in i..end {
        if let Some((rot, norm)) = GivensRotation::cancel_x(v.0, v.1) {
            diag[k + 1] = norm;

            if is_upper_diag {
                if let Some(u) = u {
                    rot.inverse()
                        .rotate_rows(&mut u.slice_mut(s![.., i..=k + 1;k + 1 - i]));
                }
            } else if let Some(v_t) = v_t {
                rot.rotate_cols(&mut v_t.slice_mut(s![i..=k + 1;k + 1 - i, ..]));
            }

            if k + 1 != end {
                v.0 = -rot.s() * off_diag[k + 1];
                v.1 = diag[k + 2];
                off_diag[k + 1] *= rot.c();
            }
        } else {
            break;
        }
    }
}

fn cancel_vertical_off_diagonal_elt(
    diag: &mut Array1<f64>,
    off_diag: &mut Array1<f64>,
    u: &mut Option<Array2<f64>>,
    v_t: &mut Option<Array2<f64>>,
    is_upper_diag: bool,
    i: usize,
) {
    let mut v = (diag[i], off_diag[i]);
    off_diag[i] = 0.0;

    for k in (0..i + 1).rev() {
        if let Some((rot, norm)) = GivensRotation::cancel_y(v.0, v.1) {
            diag[k] = norm;

            if is_upper_diag {
                if let Some(v_t) = v_t {
                    rot.rotate_cols(&mut v_t.slice_mut(s![k..=i + 1;i + 1 - k, ..]));
                }
            } else if let Some(u) = u {
                rot.inverse()
                    .rotate_rows(&mut u.slice_mut(s![.., k..=i + 1;i + 1 - k]));
            }

            if k > 0 {
                v.0 = diag[k - 1];
                v.1 = rot.s() * off_diag[k - 1];
                off_diag[k - 1] *= rot.c();
            }
        } else {
            break;
        }
    }
}

/// Computes the wilkinson shift, i.e., the 2x2 symmetric matrix eigenvalue closest to its tailing
/// component `tnn`.
///
/// The inputs are interpreted as the 2x2 matrix:
///     tmm  tmn
///     tmn  tnn
fn wilkinson_shift(tmm: f64, tnn: f64, tmn: f64) -> f64 {
    let tmn_sq = tmn * tmn;
    if tmn_sq != 0.0 {
        let d = (tmm - tnn) * 0.5;
        tnn - tmn_sq / (d + d.signum() * d.hypot(tmn))
    } else {
        tnn
    }
}

// Explicit formulae inspired from the paper "Computing the Singular Values of 2-by-2 Complex
// Matrices", Sanzheng Qiao and Xiaohong Wang.
// http://www.cas.mcmaster.ca/sqrl/papers/sqrl5.pdf
fn compute_2x2_uptrig_svd(
    m11: f64,
    m12: f64,
    m22: f64,
    compute_u: bool,
    compute_v: bool,
) -> (f64, f64, Option<GivensRotation>, Option<GivensRotation>) {
    let denom = (m11 + m22).hypot(m12) + (m11 - m22).hypot(m12);

    // NOTE: v1 is the singular value that is the closest to m22.
    // This prevents cancellation issues when constructing the vector `csv` below. If we chose
    // otherwise, we would have v1 ~= m11 when m12 is small. This would cause catastrophic
    // cancellation on `v1 * v1 - m11 * m11` below.
    let mut v1 = m11 * m22 * 2.0 / denom;
    let mut v2 = denom / 2.0;

    let mut u = None;
    let mut v_t = None;

    if compute_v || compute_u {
        let cv = m11 * m12;
        let sv = v1 * v1 - m11 * m11;
        let (csv, sgn_v) = GivensRotation::normalize(cv, sv);
        v1 *= sgn_v;
        v2 *= sgn_v;
        if compute_v {
            v_t = Some(csv.clone());
        }

        if compute_u {
            let cu = (m11 * csv.c() + m12 * csv.s()) / v1;
            let su = (m22 * csv.s()) / v1;
            let (csu, sgn_u) = GivensRotation::normalize(cu, su);
            v1 *= sgn_u;
            v2 *= sgn_u;
            u = Some(csu);
        }
    }

    (v1, v2, u, v_t)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;

    fn reconstruct(
        u: &Array2<f64>,
        sigma: &Array1<f64>,
        vt: &Array2<f64>,
    ) -> Array2<f64> {
        u.dot(&Array2::from_diag(sigma)).dot(vt)
    }

    #[test]
    fn svd_2x2() {
        let arr = array![[3.0f64, 4.], [0., 5.]];
        let (u, sigma, vt) = arr.svd(true, true).unwrap();
        let (u, vt) = (u.unwrap(), vt.unwrap());

        let mut vals = sigma.to_vec();
        vals.sort_by(f64::total_cmp);
        assert_abs_diff_eq!(vals[0], 5.0f64.sqrt(), epsilon = 1e-9);
        assert_abs_diff_eq!(vals[1], 45.0f64.sqrt(), epsilon = 1e-9);
        assert_abs_diff_eq!(reconstruct(&u, &sigma, &vt), arr, epsilon = 1e-9);
    }

    #[test]
    fn svd_negative_determinant() {
        let arr = array![[1.0f64, 1.], [0., -1.]];
        let (u, sigma, vt) = arr.svd(true, true).unwrap();
        let (u, vt) = (u.unwrap(), vt.unwrap());

        assert!(sigma.iter().copied().all(f64::is_sign_positive));
        assert_abs_diff_eq!(reconstruct(&u, &sigma, &vt), arr, epsilon = 1e-9);
    }

    #[test]
    fn svd_rectangular() {
        let arr = array![
            [4.0f64, 0., 2., 2.],
            [-2., 6., 3., -2.],
            [2., 7., -3.2, -1.]
        ];
        let (u, sigma, vt) = arr.svd(true, true).unwrap();
        let (u, vt) = (u.unwrap(), vt.unwrap());

        assert_eq!(u.dim(), (3, 3));
        assert_eq!(sigma.len(), 3);
        assert_eq!(vt.dim(), (3, 4));
        assert_abs_diff_eq!(u.dot(&u.t()), Array2::eye(3), epsilon = 1e-9);
        assert_abs_diff_eq!(vt.dot(&vt.t()), Array2::eye(3), epsilon = 1e-9);
        assert_abs_diff_eq!(reconstruct(&u, &sigma, &vt), arr, epsilon = 1e-9);
    }

    #[test]
    fn svd_diagonal() {
        let arr = Array2::from_diag(&array![1.0f64, 2., 3., 4., 5.]);
        let (_, sigma, _) = arr.svd(false, false).unwrap();
        let mut vals = sigma.to_vec();
        vals.sort_by(f64::total_cmp);
        assert_abs_diff_eq!(
            Array1::from(vals),
            array![1.0, 2., 3., 4., 5.],
            epsilon = 1e-9
        );
    }

    #[test]
    fn truncated() {
        let arr = array![[3.0f64, 2., 2.], [2., 3., -2.]];
        let (u, sigma, vt) = svd_truncated(&arr, 2).unwrap();

        assert_eq!(u.dim(), (2, 2));
        assert_eq!(vt.dim(), (2, 3));
        assert_abs_diff_eq!(sigma, array![5.0, 3.0], epsilon = 1e-9);
        assert_abs_diff_eq!(reconstruct(&u, &sigma, &vt), arr, epsilon = 1e-9);
    }

    #[test]
    fn truncated_drops_small_values() {
        let arr = Array2::from_diag(&array![1.0f64, 4., 2., 8.]);
        let (u, sigma, vt) = svd_truncated(&arr, 2).unwrap();

        assert_abs_diff_eq!(sigma, array![8.0, 4.0], epsilon = 1e-9);
        let approx = reconstruct(&u, &sigma, &vt);
        assert_abs_diff_eq!(approx[(3, 3)], 8.0, epsilon = 1e-9);
        assert_abs_diff_eq!(approx[(1, 1)], 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(approx[(0, 0)], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn truncated_rank_out_of_bounds() {
        let arr = Array2::<f64>::zeros((3, 4));
        assert!(matches!(
            svd_truncated(&arr, 4),
            Err(OptSpaceError::RankOutOfBounds { .. })
        ));
        assert!(matches!(
            svd_truncated(&arr, 0),
            Err(OptSpaceError::RankOutOfBounds { .. })
        ));
    }

    #[test]
    fn svd_empty() {
        assert!(matches!(
            Array2::<f64>::zeros((0, 3)).svd(true, true),
            Err(OptSpaceError::EmptyMatrix)
        ));
    }
}
