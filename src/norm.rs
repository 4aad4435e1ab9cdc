//! Norms of vectors and matrices

use ndarray::{prelude::*, Data};

/// Norms treating the whole array as one big vector.
pub trait Norm {
    /// L-2 norm
    fn norm_l2(&self) -> f64;
    /// Squared L-2 norm, without the sqrt/square round trip
    fn norm_l2_sq(&self) -> f64;
    /// Maximum norm (L-infinite)
    fn norm_max(&self) -> f64;
}

impl<S, D> Norm for ArrayBase<S, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    fn norm_l2(&self) -> f64 {
        self.norm_l2_sq().sqrt()
    }

    fn norm_l2_sq(&self) -> f64 {
        self.iter().map(|&x| x * x).sum()
    }

    fn norm_max(&self) -> f64 {
        self.iter().fold(0.0, |f, &val| val.abs().max(f))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn norms() {
        let a = array![[1.0f64, -3.], [2., -8.]];
        assert_abs_diff_eq!(a.norm_l2(), 78.0f64.sqrt());
        assert_abs_diff_eq!(a.norm_l2_sq(), 78.0);
        assert_abs_diff_eq!(a.norm_max(), 8.);
    }
}
