//! Policy extraction at the converged value function.
//!
//! - Greedy: the argmax next-capital index per state, ties broken by first
//!   occurrence in index order; the inaction branch (if any) must strictly
//!   beat the best active value to be chosen.
//! - Quantal: the full conditional probability kernel — the softmax rows of
//!   the quantal operator evaluated at the fixed point. This IS the
//!   stochastic policy; sampling from it is the simulator's job.

use rayon::prelude::*;

use crate::bellman::{quantal_cell, Operator};
use crate::config::ModelConfig;
use crate::errors::{KernelError, KernelResult};
use crate::rewards::{Continuation, RewardKernel};
use crate::types::{PolicyArray, ProbabilityKernel, ValueFunction};

/// Extract the greedy (argmax) policy at the converged value function.
pub fn greedy_policy<R: RewardKernel>(
    cfg: &ModelConfig,
    reward: &R,
    v: &ValueFunction,
) -> KernelResult<PolicyArray> {
    let (nk, nz) = (cfg.nk(), cfg.nz());
    let cont = Continuation::from_value(cfg, v);

    let mut choices = vec![0usize; nk * nz];
    choices
        .par_chunks_mut(nz)
        .enumerate()
        .try_for_each(|(i, row)| -> KernelResult<()> {
            for (j, choice) in row.iter_mut().enumerate() {
                let mut best = f64::NEG_INFINITY;
                let mut best_h = 0usize;
                for h in 0..nk {
                    let b = reward.action_value(cfg, &cont, i, j, h);
                    // Strict comparison keeps the first maximizer.
                    if b > best {
                        best = b;
                        best_h = h;
                    }
                }
                if let Some((h0, inaction_value)) = reward.inaction(cfg, &cont, i, j) {
                    if inaction_value > best {
                        best = inaction_value;
                        best_h = h0;
                    }
                }
                if !best.is_finite() {
                    return Err(KernelError::DegenerateState { i, j });
                }
                *choice = best_h;
            }
            Ok(())
        })?;

    Ok(PolicyArray::from_raw(nk, nz, choices))
}

/// Extract the quantal stochastic policy: softmax rows over the feasible
/// action set, composed with the logistic inaction choice for two-branch
/// models (inaction mass lands on the snapped grid index).
pub fn quantal_policy<R: RewardKernel>(
    cfg: &ModelConfig,
    reward: &R,
    v: &ValueFunction,
    op: &Operator,
) -> KernelResult<ProbabilityKernel> {
    op.validate()?;
    let (lambda, lambda_inaction) = match *op {
        Operator::Quantal {
            lambda,
            lambda_inaction,
        } => (lambda, lambda_inaction),
        Operator::Deterministic => {
            // Degenerate kernel: all mass on the greedy choice.
            let policy = greedy_policy(cfg, reward, v)?;
            return Ok(ProbabilityKernel::from_policy(&policy));
        }
    };

    let (nk, nz) = (cfg.nk(), cfg.nz());
    let cont = Continuation::from_value(cfg, v);

    let mut rows = vec![0.0f64; nk * nz * nk];
    let mut inaction = vec![0.0f64; nk * nz];

    rows.par_chunks_mut(nz * nk)
        .zip(inaction.par_chunks_mut(nz))
        .enumerate()
        .try_for_each_init(
            || vec![0.0f64; nk],
            |weights, (i, (row_block, inaction_row))| -> KernelResult<()> {
                for j in 0..nz {
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
                    let row = &mut row_block[j * nk..(j + 1) * nk];
                    match q.inaction {
                        None => row.copy_from_slice(weights),
                        Some((h0, p_inaction)) => {
                            for (dst, &w) in row.iter_mut().zip(weights.iter()) {
                                *dst = (1.0 - p_inaction) * w;
                            }
                            row[h0] += p_inaction;
                            inaction_row[j] = p_inaction;
                        }
                    }
                }
                Ok(())
            },
        )?;

    let has_inaction = inaction.iter().any(|&p| p > 0.0);
    Ok(ProbabilityKernel::from_raw(
        nk,
        nz,
        rows,
        has_inaction.then_some(inaction),
    ))
}
