//! The OptSpace optimization driver

use ndarray::{s, Array2, ArrayBase, Data, Ix2};

use crate::composition;
use crate::core_matrix::optimal_core;
use crate::gradient::gradient;
use crate::linesearch::line_search;
use crate::norm::Norm;
use crate::objective::masked_residual;
use crate::svd::svd_truncated;
use crate::{OptSpaceError, Result};

/// Sign applied to the line-search step when updating the factors.
///
/// The update is `X <- X - sign * t * W` (same for `Y`), with `t` negative by the line search's
/// convention. The two completion variants inherit opposite conventions: the direct variant
/// descends with [`StepSign::Negative`], the log-ratio variant with [`StepSign::Positive`].
/// Mixing them up flips the step direction, so the sign is part of the configuration rather than
/// an implicit default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSign {
    Positive,
    Negative,
}

impl StepSign {
    fn factor(self) -> f64 {
        match self {
            StepSign::Positive => 1.0,
            StepSign::Negative => -1.0,
        }
    }
}

/// Rank-r completion of a partially observed matrix.
///
/// `X` is n×r, `S` is r×r and `Y` is m×r; `X * S * Yt` reconstructs the full matrix estimate.
#[derive(Debug, Clone)]
pub struct Completion {
    x: Array2<f64>,
    s: Array2<f64>,
    y: Array2<f64>,
    residuals: Vec<f64>,
}

impl Completion {
    /// Left factor, n×r
    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    /// Core matrix, r×r
    pub fn s(&self) -> &Array2<f64> {
        &self.s
    }

    /// Right factor, m×r
    pub fn y(&self) -> &Array2<f64> {
        &self.y
    }

    /// Normalized masked residual after initialization and after every iteration.
    ///
    /// Never empty; at most `max_iter` entries. The solver stops appending once the trace drops
    /// below the tolerance. Exhausting the iteration budget first is not an error; inspect the
    /// tail to tell the two apart.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Whether the trace reached the given tolerance.
    pub fn converged(&self, tolerance: f64) -> bool {
        self.residuals.last().map_or(false, |&d| d < tolerance)
    }

    /// The full matrix estimate `X * S * Yt`; a pure function of the returned factors.
    pub fn reconstruct(&self) -> Array2<f64> {
        self.x.dot(&self.s).dot(&self.y.t())
    }

    /// Consumes the completion, returning `(X, S, Y)`.
    pub fn into_factors(self) -> (Array2<f64>, Array2<f64>, Array2<f64>) {
        (self.x, self.s, self.y)
    }
}

/// Configuration of the OptSpace solver.
///
/// Defaults follow the reference constants: incoherence cap 10000, initial line-search step
/// -0.1 with 20 halvings, and the direct variant's step sign.
///
/// ```rust
/// use ndarray::array;
/// use optspace::OptSpace;
///
/// let m = array![[1.0, 2., 1.], [2., 4., 2.], [1., 2., 0.]];
/// let mask = m.mapv(|v| v != 0.0);
/// let completion = OptSpace::new(1)
///     .max_iter(50)
///     .tolerance(1e-7)
///     .decompose(&m, &mask)
///     .unwrap();
/// assert!(completion.residuals().len() <= 50);
/// ```
#[derive(Debug, Clone)]
pub struct OptSpace {
    rank: usize,
    max_iter: usize,
    tolerance: f64,
    incoherence_cap: f64,
    initial_step: f64,
    max_step_halvings: usize,
    step_sign: StepSign,
}

impl OptSpace {
    /// Create a solver for the given target rank with default parameters.
    pub fn new(rank: usize) -> Self {
        OptSpace {
            rank,
            max_iter: 100,
            tolerance: 1e-8,
            incoherence_cap: 10_000.0,
            initial_step: -0.1,
            max_step_halvings: 20,
            step_sign: StepSign::Negative,
        }
    }

    /// Set the iteration budget (at least 1; the trace holds at most this many entries)
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the normalized-residual tolerance for early stopping
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the incoherence cap `m0` bounding acceptable factor row norms
    pub fn incoherence_cap(mut self, incoherence_cap: f64) -> Self {
        self.incoherence_cap = incoherence_cap;
        self
    }

    /// Set the line search's starting step (negative by convention)
    pub fn initial_step(mut self, initial_step: f64) -> Self {
        self.initial_step = initial_step;
        self
    }

    /// Set the line search's halving budget
    pub fn max_step_halvings(mut self, max_step_halvings: usize) -> Self {
        self.max_step_halvings = max_step_halvings;
        self
    }

    /// Set the sign convention applied to line-search steps
    pub fn step_sign(mut self, step_sign: StepSign) -> Self {
        self.step_sign = step_sign;
        self
    }

    /// Complete `m` at the configured rank, observing only the entries where `mask` is `true`.
    ///
    /// Unobserved positions of `m` should hold zeros (or imputed placeholder values); they take
    /// part in the dense initialization and the core solve's right-hand side exactly as given.
    /// `m` and `mask` are only read; the solver owns its iterates.
    pub fn decompose<S, Sm>(
        &self,
        m: &ArrayBase<S, Ix2>,
        mask: &ArrayBase<Sm, Ix2>,
    ) -> Result<Completion>
    where
        S: Data<Elem = f64>,
        Sm: Data<Elem = bool>,
    {
        let (n, d) = m.dim();
        if m.is_empty() {
            return Err(OptSpaceError::EmptyMatrix);
        }
        if mask.dim() != m.dim() {
            return Err(OptSpaceError::ShapeMismatch {
                rows: n,
                cols: d,
                mask_rows: mask.nrows(),
                mask_cols: mask.ncols(),
            });
        }
        if self.rank == 0 || self.rank > n.min(d) {
            return Err(OptSpaceError::RankOutOfBounds {
                rows: n,
                cols: d,
                rank: self.rank,
            });
        }
        if self.max_iter == 0 {
            return Err(OptSpaceError::ZeroIterations);
        }
        if !(self.tolerance > 0.0) {
            return Err(OptSpaceError::BadTolerance(self.tolerance));
        }

        let nnz = mask.iter().filter(|&&observed| observed).count();
        if nnz == 0 {
            return Err(OptSpaceError::NoObservedEntries);
        }
        let e = mask.mapv(|observed| observed as u8 as f64);

        // Rescale so the data sits in the regime the penalty and step constants were tuned for:
        // the expected squared norm of the fully observed matrix matches rank * nnz.
        let norm_sq = m.norm_l2_sq();
        let scale = if norm_sq > 0.0 {
            ((nnz * self.rank) as f64 / norm_sq).sqrt()
        } else {
            1.0
        };
        let m = m.mapv(|v| v * scale);

        let sqrt_nnz = (nnz as f64).sqrt();
        let density = nnz as f64 / ((n * d) as f64).sqrt();
        let rho = density * n as f64;
        let m0 = self.incoherence_cap;
        let sign = self.step_sign.factor();

        // Truncated-SVD initialization, compensated for the sampling density.
        let (u, _sigma, vt) = svd_truncated(&m, self.rank)?;
        let mut x = u * (n as f64).sqrt();
        let mut y = vt.reversed_axes() * (d as f64).sqrt();

        let mut s = optimal_core(&x, &y, &m, &e)?;
        let mut residuals = Vec::with_capacity(self.max_iter);
        residuals.push(masked_residual(&x, &y, &s, &m, &e).norm_l2() / sqrt_nnz);

        for _ in 1..self.max_iter {
            let (w, z) = gradient(&x, &y, &s, &m, &e, m0, rho);
            let t = line_search(
                &x,
                &w,
                &y,
                &z,
                &s,
                &m,
                &e,
                m0,
                rho,
                self.initial_step,
                self.max_step_halvings,
            );
            x -= &(w * (sign * t));
            y -= &(z * (sign * t));

            s = optimal_core(&x, &y, &m, &e)?;
            let dist = masked_residual(&x, &y, &s, &m, &e).norm_l2() / sqrt_nnz;
            residuals.push(dist);
            if dist < self.tolerance {
                break;
            }
        }

        // Undo the initial rescale on S only; X and Y are returned as-is.
        s.mapv_inplace(|v| v / scale);
        Ok(Completion { x, s, y, residuals })
    }
}

/// Completes a matrix whose missing entries are exact zeros.
///
/// Entries with magnitude above `1e-10` count as observed; the solver runs with the direct
/// variant's [`StepSign::Negative`] convention.
pub fn complete<S: Data<Elem = f64>>(
    m: &ArrayBase<S, Ix2>,
    rank: usize,
    max_iter: usize,
    tolerance: f64,
) -> Result<Completion> {
    let mask = m.mapv(|v| v.abs() > 1e-10);
    OptSpace::new(rank)
        .max_iter(max_iter)
        .tolerance(tolerance)
        .decompose(m, &mask)
}

/// Completes a compositional matrix in log-ratio coordinates, returning the reconstructed
/// compositions.
///
/// Non-positive entries count as missing: they are imputed by a running geometric mean before
/// the matrix is mapped into isometric log-ratio coordinates, completed there with the
/// [`StepSign::Positive`] convention, and mapped back onto the simplex. Rows of the result sum
/// to one. The first column of every row is assumed observed.
pub fn complete_log_ratio<S: Data<Elem = f64>>(
    m: &ArrayBase<S, Ix2>,
    rank: usize,
    max_iter: usize,
    tolerance: f64,
) -> Result<Array2<f64>> {
    let d = m.ncols();
    if m.is_empty() || d < 2 {
        return Err(OptSpaceError::EmptyMatrix);
    }

    // The ilr coordinates have one column fewer than the compositions; the observation mask
    // drops the first column to match, pairing with the reversed basis below.
    let mask = m.slice(s![.., 1..]).mapv(|v| v > 0.0);

    let logged = m.mapv(|v| if v > 0.0 { v.ln() } else { f64::NAN });
    let imputed = composition::impute_running_mean(&logged).mapv(f64::exp);

    let basis = composition::reversed(&composition::gram_schmidt_basis(d));
    let coords = composition::ilr(&imputed, &basis);

    let completion = OptSpace::new(rank)
        .max_iter(max_iter)
        .tolerance(tolerance)
        .step_sign(StepSign::Positive)
        .decompose(&coords, &mask)?;

    Ok(composition::ilr_inv(&completion.reconstruct(), &basis))
}
