//! Markov simulation of the induced dynamics.
//!
//! Exogenous shocks evolve by inverse-CDF sampling from the transition-matrix
//! row of the current index. The endogenous capital path evolves either by
//! direct lookup in a deterministic policy or by sampling the probability
//! kernel row at the current capital index and a FIXED scenario shock index —
//! dynamics are conditioned on one illustrative productivity level,
//! independent of the simulated shock path.
//!
//! All sampling uses a seeded `SmallRng`; the seed is an explicit input, not
//! ambient global state, so every path is reproducible.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::ModelConfig;
use crate::types::{PolicyArray, ProbabilityKernel, TransitionMatrix};

/// Inverse-CDF draw from a categorical row. Accumulated rounding can leave
/// the CDF a hair below 1, so the last index absorbs the remainder.
#[inline]
pub(crate) fn sample_row(row: &[f64], u: f64) -> usize {
    let mut cum = 0.0;
    for (idx, &p) in row.iter().enumerate() {
        cum += p;
        if u < cum {
            return idx;
        }
    }
    row.len() - 1
}

/// Simulated endogenous path: state indices and the corresponding grid
/// values, append-only during generation, immutable after.
#[derive(Clone, Debug)]
pub struct CapitalPath {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl CapitalPath {
    fn from_indices(cfg: &ModelConfig, indices: Vec<usize>) -> Self {
        let values = indices.iter().map(|&i| cfg.k_grid[i]).collect();
        Self { indices, values }
    }

    /// Gross investment flow `x_t = k_{t+1} − (1−δ)·k_t` (length m−1).
    pub fn investment(&self, delta: f64) -> Vec<f64> {
        self.values
            .windows(2)
            .map(|w| w[1] - (1.0 - delta) * w[0])
            .collect()
    }

    /// Implied consumption `c_t = z·k_t^α + (1−δ)·k_t − k_{t+1}` at the
    /// scenario productivity level `z` (length m−1).
    pub fn consumption(&self, z: f64, alpha: f64, delta: f64) -> Vec<f64> {
        self.values
            .windows(2)
            .map(|w| z * w[0].powf(alpha) + (1.0 - delta) * w[0] - w[1])
            .collect()
    }
}

/// Simulate a length-`m` exogenous shock index path from `start`.
pub fn simulate_shock_path(
    trans: &TransitionMatrix,
    start: usize,
    m: usize,
    seed: u64,
) -> Vec<usize> {
    debug_assert!(start < trans.num_states(), "start index out of range");
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut path = Vec::with_capacity(m);
    let mut j = start;
    for _ in 0..m {
        path.push(j);
        j = sample_row(trans.row(j), rng.random::<f64>());
    }
    path
}

/// Capital path under a deterministic policy at a fixed scenario shock.
/// No randomness: the path is a pure policy iteration.
pub fn simulate_policy_path(
    cfg: &ModelConfig,
    policy: &PolicyArray,
    shock_index: usize,
    start: usize,
    m: usize,
) -> CapitalPath {
    debug_assert!(shock_index < cfg.nz(), "shock index out of range");
    debug_assert!(start < cfg.nk(), "capital index out of range");
    let mut indices = Vec::with_capacity(m);
    let mut i = start;
    for _ in 0..m {
        indices.push(i);
        i = policy.next_index(i, shock_index);
    }
    CapitalPath::from_indices(cfg, indices)
}

/// Capital path under a stochastic policy kernel at a fixed scenario shock:
/// each step samples the kernel row `P[i, shock_index, ·]`.
pub fn simulate_kernel_path(
    cfg: &ModelConfig,
    kernel: &ProbabilityKernel,
    shock_index: usize,
    start: usize,
    m: usize,
    seed: u64,
) -> CapitalPath {
    debug_assert!(shock_index < cfg.nz(), "shock index out of range");
    debug_assert!(start < cfg.nk(), "capital index out of range");
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut indices = Vec::with_capacity(m);
    let mut i = start;
    for _ in 0..m {
        indices.push(i);
        i = sample_row(kernel.row(i, shock_index), rng.random::<f64>());
    }
    CapitalPath::from_indices(cfg, indices)
}
