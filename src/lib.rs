//! Pure-Rust implementation of the OptSpace low-rank matrix completion
//! algorithm on top of [`ndarray`].
//!
//! Given a partially observed matrix, a target rank `r` and convergence
//! parameters, the solver produces factors `X (n×r)`, `S (r×r)`, `Y (m×r)`
//! whose product `X·S·Yᵗ` approximates the matrix at the observed positions
//! and extrapolates plausible values elsewhere. The estimate is initialized
//! from a rank-r truncated singular value decomposition and refined by
//! gradient steps with a backtracking line search, re-solving the small core
//! matrix in closed form on every iteration.
//!
//! Two entry points cover the common cases:
//!
//! - [`complete`] treats exact zeros as missing entries and returns the raw
//!   factors together with the convergence trace.
//! - [`complete_log_ratio`] handles compositional data (e.g. relative
//!   abundances): non-positive entries are imputed by a running geometric
//!   mean, the matrix is mapped to isometric log-ratio coordinates, completed
//!   there, and mapped back to the simplex.
//!
//! Finer control (incoherence cap, line-search constants, step-sign
//! convention) is available through the [`OptSpace`] builder.
//!
//! ```rust
//! use ndarray::Array2;
//! use optspace::complete;
//!
//! // Rank-1 matrix with two unobserved (zero) entries.
//! let m = ndarray::array![
//!     [1.0, 2.0, 3.0],
//!     [2.0, 0.0, 6.0],
//!     [3.0, 6.0, 0.0],
//! ];
//! let completion = complete(&m, 1, 100, 1e-8).unwrap();
//! let full: Array2<f64> = completion.reconstruct();
//! assert!((full[(1, 1)] - 4.0).abs() < 0.1);
//! ```

use thiserror::Error;

pub mod bidiagonal;
pub mod composition;
pub mod givens;
pub mod householder;
pub mod lstsq;
pub mod norm;
pub mod reflection;
pub mod svd;

mod core_matrix;
mod gradient;
mod linesearch;
mod objective;
mod penalty;
mod solver;

pub use solver::{complete, complete_log_ratio, Completion, OptSpace, StepSign};

#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum OptSpaceError {
    #[error("Matrix is empty")]
    EmptyMatrix,
    #[error("Mask with shape {mask_rows}x{mask_cols} does not match matrix with shape {rows}x{cols}")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        mask_rows: usize,
        mask_cols: usize,
    },
    #[error("Rank {rank} is out of bounds for a {rows}x{cols} matrix")]
    RankOutOfBounds {
        rows: usize,
        cols: usize,
        rank: usize,
    },
    #[error("Mask marks no entry as observed")]
    NoObservedEntries,
    #[error("Tolerance {0} is not a positive number")]
    BadTolerance(f64),
    #[error("Iteration budget must be at least 1")]
    ZeroIterations,
    #[error("Expected matrix with {expected} rows but found {actual}")]
    WrongRows { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, OptSpaceError>;
