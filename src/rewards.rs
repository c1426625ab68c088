//! One-step reward kernels: the pluggable payoff side of the Bellman
//! operators.
//!
//! A [`RewardKernel`] evaluates, for a state `(k_i, z_j)` and a candidate
//! next-capital index `h`, the one-step payoff plus the discounted expected
//! continuation value. Infeasible actions (negative consumption,
//! non-positive next capital) return `f64::NEG_INFINITY` — a sentinel the
//! operators exclude from max and softmax mass, never an error.
//!
//! Two variants:
//! - [`GrowthReward`]: CRRA utility of consumption under a Cobb–Douglas
//!   technology; no inaction branch.
//! - [`InvestmentReward`]: operating profit minus an asymmetric
//!   convex-plus-fixed adjustment cost, plus an inaction branch that snaps
//!   depreciated capital to the nearest grid point at zero cost.
//!
//! Both are pure functions of the state and the continuation table; all
//! mutation stays in the operators' output buffers.

use rayon::prelude::*;

use crate::config::ModelConfig;
use crate::types::ValueFunction;

// ── Continuation table ──────────────────────────────────────────────────────

/// Discounted expected continuation values, precomputed once per operator
/// sweep: `cont[h, j] = β · Σ_{j'} Π[j, j'] · V[h, j']`.
///
/// Shared read-only by every `(i, j)` cell of the sweep, so the expectation
/// over next shocks is taken `nk × nz` times instead of `nk² × nz` times.
pub struct Continuation {
    nz: usize,
    data: Vec<f64>,
}

impl Continuation {
    pub fn from_value(cfg: &ModelConfig, v: &ValueFunction) -> Self {
        let (nk, nz) = (cfg.nk(), cfg.nz());
        debug_assert_eq!(v.nk(), nk);
        debug_assert_eq!(v.nz(), nz);

        let mut data = vec![0.0; nk * nz];
        data.par_chunks_mut(nz).enumerate().for_each(|(h, row)| {
            for (j, out) in row.iter_mut().enumerate() {
                let pi = cfg.shock_matrix.row(j);
                let mut ev = 0.0;
                for (jp, &p) in pi.iter().enumerate() {
                    ev += p * v.at(h, jp);
                }
                *out = cfg.beta * ev;
            }
        });
        Self { nz, data }
    }

    /// `β · E[V(k_h, ·) | z_j]`.
    #[inline(always)]
    pub fn at(&self, h: usize, j: usize) -> f64 {
        self.data[h * self.nz + j]
    }
}

// ── Reward kernel trait ─────────────────────────────────────────────────────

/// One-step payoff + discounted continuation for a candidate next-capital
/// choice. `Sync` so the grid loops can evaluate cells across rayon workers.
pub trait RewardKernel: Sync {
    /// Value of actively moving to capital index `h` from state `(i, j)`.
    /// Returns `f64::NEG_INFINITY` when the action is infeasible.
    fn action_value(&self, cfg: &ModelConfig, cont: &Continuation, i: usize, j: usize, h: usize)
        -> f64;

    /// Value of the no-adjustment branch, if the model has one: the snapped
    /// next-capital index and its value. Default: no inaction option.
    fn inaction(
        &self,
        _cfg: &ModelConfig,
        _cont: &Continuation,
        _i: usize,
        _j: usize,
    ) -> Option<(usize, f64)> {
        None
    }
}

// ── Growth variant ──────────────────────────────────────────────────────────

/// Stochastic growth reward: CRRA utility of consumption
/// `c = z_j · k_i^α + (1−δ)·k_i − k_h`.
#[derive(Clone, Copy, Debug)]
pub struct GrowthReward {
    /// CRRA curvature σ; σ = 1 uses the log-utility limiting case.
    pub sigma: f64,
    /// Production elasticity α (Cobb–Douglas `z·k^α`).
    pub alpha: f64,
}

impl GrowthReward {
    /// CRRA felicity `(c^(1−σ) − 1)/(1−σ)`, `ln c` at σ = 1.
    #[inline]
    fn utility(&self, c: f64) -> f64 {
        if self.sigma == 1.0 {
            c.ln()
        } else {
            (c.powf(1.0 - self.sigma) - 1.0) / (1.0 - self.sigma)
        }
    }
}

impl RewardKernel for GrowthReward {
    fn action_value(
        &self,
        cfg: &ModelConfig,
        cont: &Continuation,
        i: usize,
        j: usize,
        h: usize,
    ) -> f64 {
        let k = cfg.k_grid[i];
        let z = cfg.z_grid[j];
        let c = z * k.powf(self.alpha) + (1.0 - cfg.delta) * k - cfg.k_grid[h];
        if c < 0.0 {
            return f64::NEG_INFINITY;
        }
        let u = self.utility(c);
        if !u.is_finite() {
            // c = 0 under σ ≥ 1 drives felicity to −∞; same sentinel.
            return f64::NEG_INFINITY;
        }
        u + cont.at(h, j)
    }
}

// ── Investment variant ──────────────────────────────────────────────────────

/// Lumpy-investment reward: operating profit `z_j · k_i^θ` minus an
/// asymmetric convex-plus-fixed adjustment cost on gross investment
/// `x = k_h − (1−δ)·k_i`, with `p_buy ≥ p_sell`.
///
/// The inaction branch lets depreciated capital `(1−δ)·k_i` drift to the
/// nearest grid point (first-minimum tie-break, see
/// [`crate::types::Grid::nearest_index`]) with no adjustment cost.
#[derive(Clone, Copy, Debug)]
pub struct InvestmentReward {
    /// Profit curvature θ (`z·k^θ`).
    pub theta: f64,
    /// Unit price of capital purchases.
    pub p_buy: f64,
    /// Unit price received on capital sales; `p_sell ≤ p_buy`.
    pub p_sell: f64,
    /// Convex adjustment-cost coefficient (γ0, on `x²/2`).
    pub convex_cost: f64,
    /// Fixed cost paid for any active adjustment (γ1).
    pub fixed_cost: f64,
}

impl RewardKernel for InvestmentReward {
    fn action_value(
        &self,
        cfg: &ModelConfig,
        cont: &Continuation,
        i: usize,
        j: usize,
        h: usize,
    ) -> f64 {
        let k_next = cfg.k_grid[h];
        if k_next <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let k = cfg.k_grid[i];
        let z = cfg.z_grid[j];
        let x = k_next - (1.0 - cfg.delta) * k;
        let price = if x >= 0.0 { self.p_buy } else { self.p_sell };
        let cost = price * x + 0.5 * self.convex_cost * x * x + self.fixed_cost;
        z * k.powf(self.theta) - cost + cont.at(h, j)
    }

    fn inaction(
        &self,
        cfg: &ModelConfig,
        cont: &Continuation,
        i: usize,
        j: usize,
    ) -> Option<(usize, f64)> {
        let k = cfg.k_grid[i];
        let z = cfg.z_grid[j];
        let h0 = cfg.k_grid.nearest_index((1.0 - cfg.delta) * k);
        Some((h0, z * k.powf(self.theta) + cont.at(h0, j)))
    }
}
