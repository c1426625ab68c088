//! Successive-approximation fixed-point solver.
//!
//! Repeatedly applies a Bellman operator until the sup-norm of successive
//! iterates falls below tolerance. The operator is a β-contraction
//! (β < 1, sup-norm), so convergence to the unique fixed point is geometric
//! from any initial array. The outer loop is strictly sequential — iterate
//! h+1 needs the fully materialized iterate h — while each application
//! parallelizes internally.
//!
//! Hitting the iteration cap is surfaced as
//! [`KernelError::NonConvergence`] carrying the last iterate and the
//! observed residual; it is never silently truncated.

use crate::bellman::{self, Operator};
use crate::config::ModelConfig;
use crate::errors::{KernelError, KernelResult};
use crate::rewards::RewardKernel;
use crate::types::ValueFunction;

/// Stopping rule for [`solve`].
#[derive(Clone, Copy, Debug)]
pub struct SolveOptions {
    /// Sup-norm convergence tolerance ε.
    pub tol: f64,
    /// Iteration cap; exceeding it is a reported failure.
    pub max_iter: usize,
    /// Print a residual line every this many iterations (0 = quiet).
    pub log_every: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            tol: 1e-8,
            max_iter: 2000,
            log_every: 0,
        }
    }
}

/// Iterate `operator` from `v0` to a fixed point.
///
/// Generic over the operator so tests can iterate arbitrary maps; model code
/// normally goes through [`solve_value_function`].
pub fn solve<F>(operator: F, v0: ValueFunction, opts: &SolveOptions) -> KernelResult<ValueFunction>
where
    F: Fn(&ValueFunction) -> KernelResult<ValueFunction>,
{
    let mut v = v0;
    let mut residual = f64::INFINITY;
    for iteration in 1..=opts.max_iter {
        let next = operator(&v)?;
        residual = next.sup_dist(&v);
        v = next;
        if opts.log_every > 0 && iteration % opts.log_every == 0 {
            println!("  iter {:5}: residual {:.3e}", iteration, residual);
        }
        if residual <= opts.tol {
            return Ok(v);
        }
    }
    Err(KernelError::NonConvergence {
        iterations: opts.max_iter,
        residual,
        tol: opts.tol,
        last: Box::new(v),
    })
}

/// Solve a model: iterate the selected Bellman operator from V ≡ 0.
pub fn solve_value_function<R: RewardKernel>(
    cfg: &ModelConfig,
    reward: &R,
    op: &Operator,
    opts: &SolveOptions,
) -> KernelResult<ValueFunction> {
    op.validate()?;
    let v0 = ValueFunction::zeros(cfg.nk(), cfg.nz());
    solve(|v| bellman::apply(op, cfg, reward, v), v0, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::GrowthReward;
    use crate::tauchen::tauchen;
    use crate::types::Grid;

    fn scenario() -> (ModelConfig, GrowthReward) {
        let (z, m) = tauchen(3, 0.9, 0.01).unwrap();
        let k = Grid::linspace(0.05, 10.0, 5).unwrap();
        let cfg = ModelConfig::new(0.9, 0.06, k, z, m).unwrap();
        let reward = GrowthReward {
            sigma: 0.9,
            alpha: 0.4,
        };
        (cfg, reward)
    }

    #[test]
    fn test_fixed_point_satisfies_bellman_equation() {
        let (cfg, reward) = scenario();
        let opts = SolveOptions {
            tol: 1e-10,
            max_iter: 5000,
            log_every: 0,
        };
        let v = solve_value_function(&cfg, &reward, &Operator::Deterministic, &opts).unwrap();
        let tv = crate::bellman::apply(&Operator::Deterministic, &cfg, &reward, &v).unwrap();
        assert!(
            v.sup_dist(&tv) < 1e-5,
            "converged V should satisfy V ≈ T(V), gap {}",
            v.sup_dist(&tv)
        );
    }

    #[test]
    fn test_value_function_monotone_in_capital() {
        let (cfg, reward) = scenario();
        let v =
            solve_value_function(&cfg, &reward, &Operator::Deterministic, &SolveOptions::default())
                .unwrap();
        for j in 0..cfg.nz() {
            for i in 1..cfg.nk() {
                assert!(
                    v.at(i, j) >= v.at(i - 1, j) - 1e-10,
                    "V must be weakly increasing in capital: V[{}][{}]={} < V[{}][{}]={}",
                    i,
                    j,
                    v.at(i, j),
                    i - 1,
                    j,
                    v.at(i - 1, j)
                );
            }
        }
    }

    #[test]
    fn test_quantal_solve_converges() {
        let (cfg, reward) = scenario();
        let v = solve_value_function(
            &cfg,
            &reward,
            &Operator::quantal(0.1),
            &SolveOptions::default(),
        )
        .unwrap();
        let tv = crate::bellman::apply(&Operator::quantal(0.1), &cfg, &reward, &v).unwrap();
        assert!(v.sup_dist(&tv) < 1e-6);
    }

    #[test]
    fn test_non_convergence_surfaces_last_iterate() {
        let (cfg, reward) = scenario();
        let opts = SolveOptions {
            tol: 1e-12,
            max_iter: 3,
            log_every: 0,
        };
        let err = solve_value_function(&cfg, &reward, &Operator::Deterministic, &opts)
            .expect_err("3 iterations cannot reach 1e-12");
        match &err {
            KernelError::NonConvergence {
                iterations,
                residual,
                ..
            } => {
                assert_eq!(*iterations, 3);
                assert!(*residual > 1e-12);
            }
            other => panic!("expected NonConvergence, got {other:?}"),
        }
        let last = err
            .into_last_iterate()
            .expect("NonConvergence must carry the last iterate");
        assert_eq!(last.nk(), cfg.nk());
        assert_eq!(last.nz(), cfg.nz());
    }
}
