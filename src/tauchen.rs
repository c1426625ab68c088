//! Tauchen (1986) discretization of a continuous AR(1) shock process.
//!
//! Approximates `y' = ρ·y + ε`, `ε ~ N(0, ν²)` with a finite Markov chain:
//! `n` equally spaced log-levels covering ±3 unconditional standard
//! deviations, transition probabilities from the Gaussian CDF over
//! equal-width bins (boundary bins absorb the tails). The returned grid is
//! exponentiated (`z = exp(y)`) because productivity enters the production
//! technology multiplicatively.
//!
//! Row-stochasticity is re-validated by [`TransitionMatrix::from_rows`]; a
//! failure there is a fatal construction error and never reaches the solver.

use statrs::function::erf::erfc;

use crate::errors::{KernelError, KernelResult};
use crate::types::{Grid, TransitionMatrix};

/// Half-width of the log-level grid in unconditional standard deviations.
const COVERAGE_STD_DEVS: f64 = 3.0;

/// Standard normal CDF.
#[inline]
fn phi(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Discretize an AR(1) with persistence `rho` and innovation std-dev `nu`
/// into `n` exponentiated shock levels and an `n × n` transition matrix.
pub fn tauchen(n: usize, rho: f64, nu: f64) -> KernelResult<(Grid, TransitionMatrix)> {
    if n == 0 {
        return Err(KernelError::InvalidGrid {
            reason: "shock grid must contain at least one point",
        });
    }
    if !(rho.abs() < 1.0) {
        return Err(KernelError::InvalidConfig {
            field: "rho",
            value: rho,
            reason: "AR(1) persistence must satisfy |rho| < 1",
        });
    }
    if !(nu > 0.0 && nu.is_finite()) {
        return Err(KernelError::InvalidConfig {
            field: "nu",
            value: nu,
            reason: "innovation std-dev must be positive and finite",
        });
    }

    if n == 1 {
        // Degenerate chain: one state at the unconditional mean.
        let grid = Grid::new(vec![1.0])?;
        let matrix = TransitionMatrix::from_rows(1, vec![1.0])?;
        return Ok((grid, matrix));
    }

    let sigma_y = nu / (1.0 - rho * rho).sqrt();
    let y_max = COVERAGE_STD_DEVS * sigma_y;
    let step = 2.0 * y_max / (n - 1) as f64;
    let levels: Vec<f64> = (0..n).map(|j| -y_max + step * j as f64).collect();

    let mut rows = vec![0.0; n * n];
    for j in 0..n {
        let mean = rho * levels[j];
        for (jp, &y_next) in levels.iter().enumerate() {
            let p = if jp == 0 {
                phi((y_next - mean + step / 2.0) / nu)
            } else if jp == n - 1 {
                1.0 - phi((y_next - mean - step / 2.0) / nu)
            } else {
                phi((y_next - mean + step / 2.0) / nu) - phi((y_next - mean - step / 2.0) / nu)
            };
            rows[j * n + jp] = p;
        }
    }

    let grid = Grid::new(levels.iter().map(|y| y.exp()).collect())?;
    let matrix = TransitionMatrix::from_rows(n, rows)?;
    Ok((grid, matrix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_sum_to_one() {
        let (_, m) = tauchen(9, 0.9, 0.01).unwrap();
        for j in 0..9 {
            let sum: f64 = m.row(j).iter().sum();
            assert!(
                (sum - 1.0).abs() < 1e-8,
                "row {} sums to {} (expected 1)",
                j,
                sum
            );
        }
    }

    #[test]
    fn test_grid_is_exponentiated_and_increasing() {
        let (g, _) = tauchen(7, 0.5, 0.2).unwrap();
        assert_eq!(g.len(), 7);
        for j in 0..7 {
            assert!(g[j] > 0.0, "shock levels must be positive");
            if j > 0 {
                assert!(g[j] > g[j - 1]);
            }
        }
        // Log-levels are symmetric around 0, so the middle level is exp(0) = 1.
        assert!((g[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_persistence_concentrates_mass() {
        // A highly persistent process rarely jumps across the whole grid.
        let (_, m) = tauchen(5, 0.95, 0.05).unwrap();
        assert!(m.row(0)[0] > m.row(0)[4]);
        assert!(m.row(4)[4] > m.row(4)[0]);
    }

    #[test]
    fn test_single_state_chain() {
        let (g, m) = tauchen(1, 0.9, 0.01).unwrap();
        assert_eq!(g.len(), 1);
        assert!((g[0] - 1.0).abs() < 1e-12);
        assert_eq!(m.row(0), &[1.0]);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(tauchen(3, 1.0, 0.01).is_err());
        assert!(tauchen(3, 0.9, 0.0).is_err());
        assert!(tauchen(0, 0.9, 0.01).is_err());
    }
}
