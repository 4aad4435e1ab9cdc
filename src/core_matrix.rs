//! Closed-form solve for the optimal core matrix at fixed factors

use ndarray::{Array1, Array2, Axis};

use crate::lstsq::LeastSquares;
use crate::Result;

/// Relative singular-value cutoff for the normal-equations solve. The r²×r² system turns
/// rank-deficient when columns of X or Y are nearly collinear, so a truncated least-squares solve
/// stands in for direct inversion.
const RCOND: f64 = 1e-12;

/// Least-squares optimal `S` minimizing the masked residual for fixed `X`, `Y`.
///
/// Column `j*r + i` of the normal-equations matrix holds the masked outer product of X's i-th and
/// Y's j-th columns projected back through X and Y; the right-hand side is `vec(Xt * M * Y)`.
pub(crate) fn optimal_core(
    x: &Array2<f64>,
    y: &Array2<f64>,
    m: &Array2<f64>,
    e: &Array2<f64>,
) -> Result<Array2<f64>> {
    let r = x.ncols();

    let rhs: Array1<f64> = x.t().dot(m).dot(y).iter().cloned().collect();

    let mut a = Array2::zeros((r * r, r * r));
    for i in 0..r {
        for j in 0..r {
            let ind = j * r + i;
            // (x_i ⊗ y_j) masked, then projected through the factors again
            let outer = x
                .column(i)
                .insert_axis(Axis(1))
                .dot(&y.column(j).insert_axis(Axis(0)));
            let masked = outer * e;
            let projected = x.t().dot(&masked).dot(y);
            let flat: Array1<f64> = projected.iter().cloned().collect();
            a.column_mut(ind).assign(&flat);
        }
    }

    let flat = a.least_squares(&rhs, RCOND)?;
    // The flat solution is keyed by (column, row); transpose back to (row, column).
    Ok(Array2::from_shape_vec((r, r), flat.to_vec())
        .unwrap()
        .reversed_axes())
}
