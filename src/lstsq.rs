//! Least-squares solutions of linear systems

use ndarray::{Array1, ArrayBase, Data, Ix1, Ix2};

use crate::{svd::SVD, OptSpaceError, Result};

/// Minimum-norm least-squares solve through the singular value decomposition
pub trait LeastSquares {
    /// Solves `min ||self * x - b||` for `x`.
    ///
    /// Singular values smaller than `rcond` times the largest singular value are treated as zero,
    /// which keeps rank-deficient systems solvable at the cost of projecting `b` onto the
    /// numerical range of `self`.
    fn least_squares<Si: Data<Elem = f64>>(
        &self,
        b: &ArrayBase<Si, Ix1>,
        rcond: f64,
    ) -> Result<Array1<f64>>;
}

impl<S: Data<Elem = f64>> LeastSquares for ArrayBase<S, Ix2> {
    fn least_squares<Si: Data<Elem = f64>>(
        &self,
        b: &ArrayBase<Si, Ix1>,
        rcond: f64,
    ) -> Result<Array1<f64>> {
        if self.nrows() != b.len() {
            return Err(OptSpaceError::WrongRows {
                expected: self.nrows(),
                actual: b.len(),
            });
        }

        let (u, sigma, vt) = self.svd(true, true)?;
        let (u, vt) = (u.unwrap(), vt.unwrap());

        let cutoff = rcond * sigma.iter().cloned().fold(0.0, f64::max);

        // x = V * pinv(Sigma) * U^t * b, truncating singular values below the cutoff
        let mut projected = u.t().dot(b);
        for (p, &s) in projected.iter_mut().zip(sigma.iter()) {
            if s > cutoff {
                *p /= s;
            } else {
                *p = 0.0;
            }
        }
        Ok(vt.t().dot(&projected))
    }
}
