//! Error taxonomy for the numeric kernel.
//!
//! Infeasible actions are NOT errors — they are `f64::NEG_INFINITY` sentinels
//! excluded from max/softmax mass inside the operators. Everything in this
//! enum is a genuine failure: detect, report precisely, abort the operation.
//! There are no retries inside the kernel.

use thiserror::Error;

use crate::types::ValueFunction;

/// Crate-wide result alias.
pub type KernelResult<T> = Result<T, KernelError>;

#[derive(Error, Debug)]
pub enum KernelError {
    /// Grid points must be finite and strictly increasing.
    #[error("invalid grid: {reason}")]
    InvalidGrid { reason: &'static str },

    /// A transition-matrix row failed the row-stochasticity check at
    /// construction time. Never allowed to propagate into the solver.
    #[error("transition matrix row {row} sums to {sum:.12} (must be 1 within {tol:.0e})")]
    MalformedTransitionMatrix { row: usize, sum: f64, tol: f64 },

    /// A model parameter is outside its admissible range.
    #[error("invalid config: {field} = {value} ({reason})")]
    InvalidConfig {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Array shapes disagree (e.g. shock grid vs transition matrix).
    #[error("dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// Every action at state (k_i, z_j) is infeasible. Indicates capital-grid
    /// bounds too tight for the parameterization, not a recoverable condition.
    #[error("no feasible action at state (k={i}, z={j}); capital grid bounds are too tight")]
    DegenerateState { i: usize, j: usize },

    /// Softmax normalization produced a zero or non-finite weight sum.
    #[error("softmax normalization at state (k={i}, z={j}) is degenerate (weight sum {weight_sum})")]
    NumericalInstability { i: usize, j: usize, weight_sum: f64 },

    /// Softmax temperature must be strictly positive and finite.
    #[error("softmax temperature must be positive and finite, got {value}")]
    InvalidTemperature { value: f64 },

    /// The fixed-point iteration hit its cap before the residual fell below
    /// tolerance. Carries the last iterate so the caller can inspect it,
    /// relax the tolerance, or restart with a higher cap.
    #[error("no fixed point after {iterations} iterations (residual {residual:.3e}, tolerance {tol:.3e})")]
    NonConvergence {
        iterations: usize,
        residual: f64,
        tol: f64,
        last: Box<ValueFunction>,
    },
}

impl KernelError {
    /// Recover the last iterate from a [`KernelError::NonConvergence`].
    pub fn into_last_iterate(self) -> Option<ValueFunction> {
        match self {
            KernelError::NonConvergence { last, .. } => Some(*last),
            _ => None,
        }
    }
}
