//! Deterministic (hard-max) and quantal (entropy-regularized) Bellman
//! operators.
//!
//! Each application precomputes the discounted continuation table once, then
//! fills a fresh output array in an embarrassingly parallel `(i, j)` sweep:
//! every cell reads only the shared continuation table and the read-only
//! config, never sibling cells, so rows are distributed across rayon workers
//! with no locking and no aliasing of the input iterate.
//!
//! Softmax weights are computed over the FEASIBLE action subset only,
//! max-shifted before exponentiation. Infeasible entries are excluded from
//! the normalization rather than zeroed afterwards — `exp(−∞/λ)` never
//! enters the sum. Feasibility is an explicit per-action predicate
//! (`value > −∞`) and every reduction filters on it, so non-contiguous
//! infeasible sets are handled the same as contiguous ones.

use rayon::prelude::*;

use crate::config::ModelConfig;
use crate::errors::{KernelError, KernelResult};
use crate::rewards::{Continuation, RewardKernel};
use crate::types::ValueFunction;

/// Operator family selector.
///
/// `Quantal` holds the action-level temperature λ and, for models with an
/// inaction branch, the inaction-choice temperature λ_I of the second-level
/// logistic decision. λ → 0⁺ recovers the deterministic operator's action
/// choice as a limiting case.
#[derive(Clone, Copy, Debug)]
pub enum Operator {
    Deterministic,
    Quantal { lambda: f64, lambda_inaction: f64 },
}

impl Operator {
    /// Quantal operator with a single temperature for both decision levels.
    pub fn quantal(lambda: f64) -> Self {
        Operator::Quantal {
            lambda,
            lambda_inaction: lambda,
        }
    }

    /// Quantal operator with separate action (λ_A) and inaction (λ_I)
    /// temperatures for the two-branch investment model.
    pub fn quantal_two_level(lambda: f64, lambda_inaction: f64) -> Self {
        Operator::Quantal {
            lambda,
            lambda_inaction,
        }
    }

    pub(crate) fn validate(&self) -> KernelResult<()> {
        if let Operator::Quantal {
            lambda,
            lambda_inaction,
        } = *self
        {
            for value in [lambda, lambda_inaction] {
                if !(value > 0.0 && value.is_finite()) {
                    return Err(KernelError::InvalidTemperature { value });
                }
            }
        }
        Ok(())
    }
}

/// Apply one step of the selected operator: `V → T(V)` or `V → T_QR(λ, V)`.
///
/// The output array is always distinct from the input iterate.
pub fn apply<R: RewardKernel>(
    op: &Operator,
    cfg: &ModelConfig,
    reward: &R,
    v: &ValueFunction,
) -> KernelResult<ValueFunction> {
    op.validate()?;
    let (nk, nz) = (cfg.nk(), cfg.nz());
    let cont = Continuation::from_value(cfg, v);
    let mut out = ValueFunction::zeros(nk, nz);

    match *op {
        Operator::Deterministic => {
            out.as_mut_slice()
                .par_chunks_mut(nz)
                .enumerate()
                .try_for_each(|(i, row)| -> KernelResult<()> {
                    for (j, cell) in row.iter_mut().enumerate() {
                        *cell = max_cell(cfg, reward, &cont, i, j)?;
                    }
                    Ok(())
                })?;
        }
        Operator::Quantal {
            lambda,
            lambda_inaction,
        } => {
            out.as_mut_slice()
                .par_chunks_mut(nz)
                .enumerate()
                .try_for_each_init(
                    || vec![0.0f64; nk],
                    |weights, (i, row)| -> KernelResult<()> {
                        for (j, cell) in row.iter_mut().enumerate() {
                            let q = quantal_cell(
                                cfg,
                                reward,
                                &cont,
                                i,
                                j,
                                lambda,
                                lambda_inaction,
                                weights,
                            )?;
                            *cell = q.value;
                        }
                        Ok(())
                    },
                )?;
        }
    }
    Ok(out)
}

/// Hard-max cell: best feasible action value, with the inaction branch (if
/// any) competing against the best active choice.
pub(crate) fn max_cell<R: RewardKernel>(
    cfg: &ModelConfig,
    reward: &R,
    cont: &Continuation,
    i: usize,
    j: usize,
) -> KernelResult<f64> {
    let mut best = f64::NEG_INFINITY;
    for h in 0..cfg.nk() {
        let b = reward.action_value(cfg, cont, i, j, h);
        if b > best {
            best = b;
        }
    }
    if let Some((_, inaction_value)) = reward.inaction(cfg, cont, i, j) {
        if inaction_value > best {
            best = inaction_value;
        }
    }
    if !best.is_finite() {
        return Err(KernelError::DegenerateState { i, j });
    }
    Ok(best)
}

/// Result of one quantal cell evaluation.
///
/// `weights` (the caller-provided scratch slice) holds the softmax
/// distribution over ACTIVE next-capital choices; `inaction` carries the
/// second-level logistic branch when the model has one.
pub(crate) struct QuantalCell {
    /// Composite cell value: the λ_I-weighted mixture of inaction and active
    /// values (just the active value for models without inaction).
    pub value: f64,
    /// `(snapped next-capital index, P(inaction))`, if applicable.
    pub inaction: Option<(usize, f64)>,
}

/// Softmax evaluation of one `(i, j)` cell.
///
/// Fills `weights[h]` with `exp(B[h]/λ) / Σ exp(B[h']/λ)` over the feasible
/// subset (zero elsewhere) and returns the probability-weighted value. For
/// two-branch models, applies the logistic inaction choice
/// `P(inaction) = 1 / (1 + exp((V_active − V_inaction)/λ_I))` on top.
#[allow(clippy::too_many_arguments)]
pub(crate) fn quantal_cell<R: RewardKernel>(
    cfg: &ModelConfig,
    reward: &R,
    cont: &Continuation,
    i: usize,
    j: usize,
    lambda: f64,
    lambda_inaction: f64,
    weights: &mut [f64],
) -> KernelResult<QuantalCell> {
    let nk = cfg.nk();
    debug_assert_eq!(weights.len(), nk);

    let mut shift = f64::NEG_INFINITY;
    for (h, w) in weights.iter_mut().enumerate() {
        let b = reward.action_value(cfg, cont, i, j, h);
        *w = b;
        if b > shift {
            shift = b;
        }
    }
    if shift == f64::NEG_INFINITY {
        return Err(KernelError::DegenerateState { i, j });
    }

    // weights currently holds the action values; exponentiate feasible
    // entries in place against the max shift, accumulating the weighted
    // value before the buffer is overwritten.
    let mut weight_sum = 0.0;
    let mut weighted_value = 0.0;
    for w in weights.iter_mut() {
        let b = *w;
        if b.is_finite() {
            let e = ((b - shift) / lambda).exp();
            weight_sum += e;
            weighted_value += e * b;
            *w = e;
        } else {
            *w = 0.0;
        }
    }
    if !weight_sum.is_finite() || weight_sum <= 0.0 {
        return Err(KernelError::NumericalInstability { i, j, weight_sum });
    }

    let active_value = weighted_value / weight_sum;
    for w in weights.iter_mut() {
        *w /= weight_sum;
    }

    match reward.inaction(cfg, cont, i, j) {
        None => Ok(QuantalCell {
            value: active_value,
            inaction: None,
        }),
        Some((h0, inaction_value)) => {
            let p_inaction =
                1.0 / (1.0 + ((active_value - inaction_value) / lambda_inaction).exp());
            Ok(QuantalCell {
                value: p_inaction * inaction_value + (1.0 - p_inaction) * active_value,
                inaction: Some((h0, p_inaction)),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::GrowthReward;
    use crate::tauchen::tauchen;
    use crate::types::Grid;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn growth_setup() -> (ModelConfig, GrowthReward) {
        let (z, m) = tauchen(3, 0.9, 0.01).unwrap();
        let k = Grid::linspace(0.05, 10.0, 12).unwrap();
        let cfg = ModelConfig::new(0.9, 0.06, k, z, m).unwrap();
        let reward = GrowthReward {
            sigma: 0.9,
            alpha: 0.4,
        };
        (cfg, reward)
    }

    fn random_value(nk: usize, nz: usize, rng: &mut SmallRng) -> ValueFunction {
        let mut v = ValueFunction::zeros(nk, nz);
        for i in 0..nk {
            for j in 0..nz {
                v.set(i, j, rng.random_range(-5.0..5.0));
            }
        }
        v
    }

    #[test]
    fn test_deterministic_operator_is_beta_contraction() {
        let (cfg, reward) = growth_setup();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..5 {
            let v1 = random_value(12, 3, &mut rng);
            let v2 = random_value(12, 3, &mut rng);
            let t1 = apply(&Operator::Deterministic, &cfg, &reward, &v1).unwrap();
            let t2 = apply(&Operator::Deterministic, &cfg, &reward, &v2).unwrap();
            let lhs = t1.sup_dist(&t2);
            let rhs = cfg.beta * v1.sup_dist(&v2);
            assert!(
                lhs <= rhs + 1e-10,
                "contraction violated: ‖T(V1)−T(V2)‖ = {} > β·‖V1−V2‖ = {}",
                lhs,
                rhs
            );
        }
    }

    #[test]
    fn test_quantal_value_never_exceeds_hard_max() {
        // The softmax average of the action values is bounded by their max.
        let (cfg, reward) = growth_setup();
        let mut rng = SmallRng::seed_from_u64(11);
        let v = random_value(12, 3, &mut rng);
        let t = apply(&Operator::Deterministic, &cfg, &reward, &v).unwrap();
        let tq = apply(&Operator::quantal(0.25), &cfg, &reward, &v).unwrap();
        for i in 0..12 {
            for j in 0..3 {
                assert!(
                    tq.at(i, j) <= t.at(i, j) + 1e-10,
                    "quantal value {} above max value {} at ({}, {})",
                    tq.at(i, j),
                    t.at(i, j),
                    i,
                    j
                );
            }
        }
    }

    #[test]
    fn test_invalid_temperature_rejected() {
        let (cfg, reward) = growth_setup();
        let v = ValueFunction::zeros(12, 3);
        for lambda in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = apply(&Operator::quantal(lambda), &cfg, &reward, &v);
            assert!(matches!(err, Err(KernelError::InvalidTemperature { .. })));
        }
    }

    #[test]
    fn test_degenerate_state_reported() {
        // A capital grid so far above the production frontier that every
        // transition from the lowest state implies negative consumption.
        let (z, m) = tauchen(1, 0.5, 0.1).unwrap();
        let k = Grid::new(vec![5.0, 500.0, 1000.0]).unwrap();
        let cfg = ModelConfig::new(0.9, 1.0, k, z, m).unwrap();
        let reward = GrowthReward {
            sigma: 2.0,
            alpha: 0.4,
        };
        let v = ValueFunction::zeros(3, 1);
        let err = apply(&Operator::Deterministic, &cfg, &reward, &v);
        assert!(matches!(err, Err(KernelError::DegenerateState { i: 0, .. })));
    }
}
