//! Immutable model configuration shared by every downstream component.
//!
//! Built once per experiment, validated at construction, then passed by
//! shared reference into the operators, solver, simulator and stationary
//! solver. No component reads ambient/global model state.

use crate::errors::{KernelError, KernelResult};
use crate::types::{Grid, TransitionMatrix};

/// Parameter and grid bundle for one experiment.
///
/// Holds the economics common to both reward variants (discounting,
/// depreciation) plus the two grids and the shock transition matrix.
/// Variant-specific parameters (CRRA curvature, adjustment costs) live on
/// the reward kernels in [`crate::rewards`].
#[derive(Clone, Debug)]
pub struct ModelConfig {
    /// Discount factor β ∈ (0, 1); the contraction modulus of the Bellman
    /// operators.
    pub beta: f64,
    /// Depreciation rate δ ∈ [0, 1].
    pub delta: f64,
    /// Capital (endogenous-state) grid.
    pub k_grid: Grid,
    /// Productivity (exogenous-state) grid, typically from
    /// [`crate::tauchen::tauchen`].
    pub z_grid: Grid,
    /// Shock transition matrix over `z_grid` indices.
    pub shock_matrix: TransitionMatrix,
}

impl ModelConfig {
    pub fn new(
        beta: f64,
        delta: f64,
        k_grid: Grid,
        z_grid: Grid,
        shock_matrix: TransitionMatrix,
    ) -> KernelResult<Self> {
        if !(beta > 0.0 && beta < 1.0) {
            return Err(KernelError::InvalidConfig {
                field: "beta",
                value: beta,
                reason: "discount factor must lie strictly between 0 and 1",
            });
        }
        if !(0.0..=1.0).contains(&delta) || !delta.is_finite() {
            return Err(KernelError::InvalidConfig {
                field: "delta",
                value: delta,
                reason: "depreciation rate must lie in [0, 1]",
            });
        }
        if z_grid.len() != shock_matrix.num_states() {
            return Err(KernelError::DimensionMismatch {
                what: "shock grid vs transition matrix",
                expected: shock_matrix.num_states(),
                found: z_grid.len(),
            });
        }
        Ok(Self {
            beta,
            delta,
            k_grid,
            z_grid,
            shock_matrix,
        })
    }

    /// Number of capital grid points.
    #[inline(always)]
    pub fn nk(&self) -> usize {
        self.k_grid.len()
    }

    /// Number of shock grid points.
    #[inline(always)]
    pub fn nz(&self) -> usize {
        self.z_grid.len()
    }
}
