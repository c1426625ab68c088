//! Core data structures: grids, the shock transition matrix, value arrays
//! and policy representations.
//!
//! All arrays are dense row-major `Vec<f64>` with inline index helpers.
//! Layouts:
//! - [`ValueFunction`] / [`PolicyArray`]: `(capital index i, shock index j)`
//!   flattened as `i * nz + j`
//! - [`ProbabilityKernel`]: `(i, j, next-capital index h)` flattened as
//!   `(i * nz + j) * nk + h`
//!
//! [`TransitionMatrix`] enforces row-stochasticity at construction and is
//! never mutated afterwards; everything downstream may rely on it.

use serde::Serialize;

use crate::errors::{KernelError, KernelResult};

/// Row-sum tolerance for [`TransitionMatrix`] construction.
pub const ROW_SUM_TOL: f64 = 1e-8;

// ── Grid ────────────────────────────────────────────────────────────────────

/// Ordered discretization of a continuous state: strictly increasing, finite,
/// fixed size. Used for both capital (endogenous) and productivity
/// (exogenous) levels.
#[derive(Clone, Debug)]
pub struct Grid {
    points: Vec<f64>,
}

impl Grid {
    /// Build from raw points, validating the strictly-increasing invariant.
    pub fn new(points: Vec<f64>) -> KernelResult<Self> {
        if points.is_empty() {
            return Err(KernelError::InvalidGrid {
                reason: "grid must contain at least one point",
            });
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(KernelError::InvalidGrid {
                reason: "grid points must be finite",
            });
        }
        if points.windows(2).any(|w| w[1] <= w[0]) {
            return Err(KernelError::InvalidGrid {
                reason: "grid points must be strictly increasing",
            });
        }
        Ok(Self { points })
    }

    /// `n` equally spaced points on `[lo, hi]`.
    pub fn linspace(lo: f64, hi: f64, n: usize) -> KernelResult<Self> {
        if n == 0 {
            return Err(KernelError::InvalidGrid {
                reason: "grid must contain at least one point",
            });
        }
        if n == 1 {
            return Self::new(vec![lo]);
        }
        let step = (hi - lo) / (n - 1) as f64;
        let points = (0..n).map(|i| lo + step * i as f64).collect();
        Self::new(points)
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[f64] {
        &self.points
    }

    /// Index of the grid point nearest to `x` (linear scan).
    ///
    /// Tie-break: the FIRST minimum wins, i.e. an `x` exactly halfway between
    /// two points snaps to the lower one. This matters for the inaction
    /// branch of the investment model, which snaps depreciated capital onto
    /// the grid.
    pub fn nearest_index(&self, x: f64) -> usize {
        let mut best = 0usize;
        let mut best_dist = f64::INFINITY;
        for (idx, &p) in self.points.iter().enumerate() {
            let dist = (x - p).abs();
            if dist < best_dist {
                best_dist = dist;
                best = idx;
            }
        }
        best
    }
}

impl std::ops::Index<usize> for Grid {
    type Output = f64;

    #[inline(always)]
    fn index(&self, i: usize) -> &f64 {
        &self.points[i]
    }
}

// ── Transition matrix ───────────────────────────────────────────────────────

/// Row-stochastic square matrix over exogenous-shock indices.
///
/// Rows sum to 1 within [`ROW_SUM_TOL`] and entries are non-negative; both
/// are checked once in [`TransitionMatrix::from_rows`] and the matrix is
/// immutable afterwards.
#[derive(Clone, Debug)]
pub struct TransitionMatrix {
    n: usize,
    data: Vec<f64>,
}

impl TransitionMatrix {
    /// Build from a flat row-major `n × n` buffer, validating stochasticity.
    pub fn from_rows(n: usize, data: Vec<f64>) -> KernelResult<Self> {
        if data.len() != n * n {
            return Err(KernelError::DimensionMismatch {
                what: "transition matrix",
                expected: n * n,
                found: data.len(),
            });
        }
        for row in 0..n {
            let r = &data[row * n..(row + 1) * n];
            if r.iter().any(|&p| !p.is_finite() || p < 0.0) {
                return Err(KernelError::MalformedTransitionMatrix {
                    row,
                    sum: f64::NAN,
                    tol: ROW_SUM_TOL,
                });
            }
            let sum: f64 = r.iter().sum();
            if (sum - 1.0).abs() > ROW_SUM_TOL {
                return Err(KernelError::MalformedTransitionMatrix {
                    row,
                    sum,
                    tol: ROW_SUM_TOL,
                });
            }
        }
        Ok(Self { n, data })
    }

    /// Number of exogenous states.
    #[inline(always)]
    pub fn num_states(&self) -> usize {
        self.n
    }

    /// Transition probabilities out of shock state `j`.
    #[inline(always)]
    pub fn row(&self, j: usize) -> &[f64] {
        debug_assert!(j < self.n, "shock index {} out of range", j);
        &self.data[j * self.n..(j + 1) * self.n]
    }
}

// ── Value function ──────────────────────────────────────────────────────────

/// Dense value array `V[i, j]` over (capital index, shock index).
///
/// Mutated only by replacing whole iterates inside the fixed-point loop; each
/// operator application writes a fresh buffer, never in place.
#[derive(Clone, Debug)]
pub struct ValueFunction {
    nk: usize,
    nz: usize,
    data: Vec<f64>,
}

impl ValueFunction {
    pub fn zeros(nk: usize, nz: usize) -> Self {
        Self {
            nk,
            nz,
            data: vec![0.0; nk * nz],
        }
    }

    #[inline(always)]
    pub fn nk(&self) -> usize {
        self.nk
    }

    #[inline(always)]
    pub fn nz(&self) -> usize {
        self.nz
    }

    #[inline(always)]
    pub fn at(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < self.nk && j < self.nz, "state ({}, {}) out of range", i, j);
        self.data[i * self.nz + j]
    }

    #[inline(always)]
    pub fn set(&mut self, i: usize, j: usize, v: f64) {
        debug_assert!(i < self.nk && j < self.nz, "state ({}, {}) out of range", i, j);
        self.data[i * self.nz + j] = v;
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline(always)]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Sup-norm distance `‖self − other‖∞`; the fixed-point stopping metric.
    pub fn sup_dist(&self, other: &ValueFunction) -> f64 {
        debug_assert_eq!(self.nk, other.nk);
        debug_assert_eq!(self.nz, other.nz);
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

// ── Policies ────────────────────────────────────────────────────────────────

/// Deterministic policy: next-capital index for each state `(i, j)`.
#[derive(Clone, Debug)]
pub struct PolicyArray {
    nk: usize,
    nz: usize,
    data: Vec<usize>,
}

impl PolicyArray {
    pub(crate) fn from_raw(nk: usize, nz: usize, data: Vec<usize>) -> Self {
        debug_assert_eq!(data.len(), nk * nz);
        Self { nk, nz, data }
    }

    #[inline(always)]
    pub fn nk(&self) -> usize {
        self.nk
    }

    #[inline(always)]
    pub fn nz(&self) -> usize {
        self.nz
    }

    /// Next-capital index chosen at state `(i, j)`.
    #[inline(always)]
    pub fn next_index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.nk && j < self.nz, "state ({}, {}) out of range", i, j);
        self.data[i * self.nz + j]
    }
}

/// Stochastic policy: full conditional transition law `P[i, j, h]` over
/// next-capital indices, rows over `h` summing to 1.
///
/// This IS the quantal policy, not a sampling convenience — the softmax rows
/// evaluated at the converged value function. For the investment model the
/// per-state probability of the inaction branch is carried alongside.
#[derive(Clone, Debug)]
pub struct ProbabilityKernel {
    nk: usize,
    nz: usize,
    data: Vec<f64>,
    inaction: Option<Vec<f64>>,
}

impl ProbabilityKernel {
    pub(crate) fn from_raw(nk: usize, nz: usize, data: Vec<f64>, inaction: Option<Vec<f64>>) -> Self {
        debug_assert_eq!(data.len(), nk * nz * nk);
        Self {
            nk,
            nz,
            data,
            inaction,
        }
    }

    /// Lift a deterministic policy into a degenerate (one-hot) kernel, so the
    /// stationary-distribution solver accepts either policy form.
    pub fn from_policy(policy: &PolicyArray) -> Self {
        let (nk, nz) = (policy.nk(), policy.nz());
        let mut data = vec![0.0; nk * nz * nk];
        for i in 0..nk {
            for j in 0..nz {
                data[(i * nz + j) * nk + policy.next_index(i, j)] = 1.0;
            }
        }
        Self {
            nk,
            nz,
            data,
            inaction: None,
        }
    }

    #[inline(always)]
    pub fn nk(&self) -> usize {
        self.nk
    }

    #[inline(always)]
    pub fn nz(&self) -> usize {
        self.nz
    }

    /// Next-capital distribution at state `(i, j)`; length `nk`, sums to 1.
    #[inline(always)]
    pub fn row(&self, i: usize, j: usize) -> &[f64] {
        debug_assert!(i < self.nk && j < self.nz, "state ({}, {}) out of range", i, j);
        let base = (i * self.nz + j) * self.nk;
        &self.data[base..base + self.nk]
    }

    /// Probability of the inaction branch at `(i, j)`; 0 for models without
    /// an inaction option.
    #[inline(always)]
    pub fn inaction_prob(&self, i: usize, j: usize) -> f64 {
        match &self.inaction {
            Some(p) => p[i * self.nz + j],
            None => 0.0,
        }
    }
}

// ── Simulation summary ──────────────────────────────────────────────────────

/// Moments of a simulated series. Consumers read these as plain values;
/// the kernel does not render them.
#[derive(Clone, Debug, Serialize)]
pub struct SimulationSummary {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SimulationSummary {
    /// Moments of `values`; an empty series yields the all-zero summary.
    pub fn from_series(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std_dev: variance.sqrt(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}
