//! Stationary-distribution computation via the discrete Chapman–Kolmogorov
//! recursion.
//!
//! Starting from the kernel row of an initial state, repeatedly applies the
//! induced capital transition kernel at a fixed scenario shock index:
//! `Tp[·, h] = Σ_s P[s, j, ·] · Tp[s, h−1]`. The full column history is
//! returned so callers can inspect convergence — stabilization as h grows is
//! a testable property of ergodic kernels, not something the solver
//! enforces.
//!
//! An optional fixed-window moving average smooths each column to reduce
//! discretization noise; the window size is a tunable, not a correctness
//! requirement, and smoothed columns are renormalized so mass stays 1.

use rayon::prelude::*;

use crate::types::ProbabilityKernel;

/// Column history of the forward recursion: `nk × columns`, column-major.
#[derive(Clone, Debug)]
pub struct StationaryDensity {
    nk: usize,
    columns: usize,
    data: Vec<f64>,
}

impl StationaryDensity {
    #[inline(always)]
    pub fn nk(&self) -> usize {
        self.nk
    }

    #[inline(always)]
    pub fn num_columns(&self) -> usize {
        self.columns
    }

    /// Density after `h + 1` forward applications (column `h` of the
    /// history).
    #[inline(always)]
    pub fn column(&self, h: usize) -> &[f64] {
        debug_assert!(h < self.columns, "column {} out of range", h);
        &self.data[h * self.nk..(h + 1) * self.nk]
    }

    /// The final (most converged) column.
    #[inline(always)]
    pub fn last(&self) -> &[f64] {
        self.column(self.columns - 1)
    }

    /// Sup-norm gap between columns `h` and `h − 1`; tends to 0 for ergodic
    /// kernels as `h` grows.
    pub fn column_gap(&self, h: usize) -> f64 {
        debug_assert!(h >= 1 && h < self.columns);
        self.column(h)
            .iter()
            .zip(self.column(h - 1))
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

/// Centered moving average with shrinking edge windows, mass-renormalized.
/// `window <= 1` is a no-op.
fn smooth(dist: &mut [f64], window: usize) {
    if window <= 1 {
        return;
    }
    let n = dist.len();
    let half = window / 2;
    let mut out = vec![0.0; n];
    for (s, o) in out.iter_mut().enumerate() {
        let lo = s.saturating_sub(half);
        let hi = (s + half).min(n - 1);
        let span = (hi - lo + 1) as f64;
        *o = dist[lo..=hi].iter().sum::<f64>() / span;
    }
    let mass: f64 = out.iter().sum();
    if mass > 0.0 {
        for o in &mut out {
            *o /= mass;
        }
    }
    dist.copy_from_slice(&out);
}

/// Forward-iterate the induced capital kernel at shock index `shock_index`
/// for `iterations` steps from `start`, recording every column.
///
/// The recursion is sequential across columns; the inner sum over source
/// states parallelizes over destinations.
pub fn stationary_density(
    kernel: &ProbabilityKernel,
    shock_index: usize,
    start: usize,
    iterations: usize,
    smooth_window: usize,
) -> StationaryDensity {
    let nk = kernel.nk();
    debug_assert!(shock_index < kernel.nz(), "shock index out of range");
    debug_assert!(start < nk, "capital index out of range");
    debug_assert!(iterations >= 1, "need at least one iteration");

    let mut data = Vec::with_capacity(nk * iterations);

    let mut current = kernel.row(start, shock_index).to_vec();
    smooth(&mut current, smooth_window);
    data.extend_from_slice(&current);

    for _ in 1..iterations {
        let mut next: Vec<f64> = (0..nk)
            .into_par_iter()
            .map(|dest| {
                let mut mass = 0.0;
                for (s, &p) in current.iter().enumerate() {
                    if p > 0.0 {
                        mass += kernel.row(s, shock_index)[dest] * p;
                    }
                }
                mass
            })
            .collect();
        smooth(&mut next, smooth_window);
        data.extend_from_slice(&next);
        current = next;
    }

    StationaryDensity {
        nk,
        columns: iterations,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PolicyArray, ProbabilityKernel};

    /// Ergodic 3-state kernel at a single shock level.
    fn ergodic_kernel() -> ProbabilityKernel {
        let rows = vec![
            0.6, 0.3, 0.1, //
            0.2, 0.5, 0.3, //
            0.1, 0.4, 0.5, //
        ];
        ProbabilityKernel::from_raw(3, 1, rows, None)
    }

    #[test]
    fn test_columns_conserve_mass() {
        let kernel = ergodic_kernel();
        for window in [0, 1, 3, 4] {
            let density = stationary_density(&kernel, 0, 0, 20, window);
            for h in 0..density.num_columns() {
                let mass: f64 = density.column(h).iter().sum();
                assert!(
                    (mass - 1.0).abs() < 1e-10,
                    "column {} mass {} (window {})",
                    h,
                    mass,
                    window
                );
            }
        }
    }

    #[test]
    fn test_columns_converge_for_ergodic_kernel() {
        let kernel = ergodic_kernel();
        let density = stationary_density(&kernel, 0, 0, 60, 0);
        assert!(
            density.column_gap(59) < 1e-12,
            "late columns should have stabilized, gap {}",
            density.column_gap(59)
        );
        // Gaps shrink: compare an early gap to a late one.
        assert!(density.column_gap(2) > density.column_gap(30));
    }

    #[test]
    fn test_fixed_point_of_one_hot_kernel() {
        // A policy funneling every state to index 1 has a point-mass
        // stationary distribution there.
        let policy = PolicyArray::from_raw(3, 1, vec![1, 1, 1]);
        let kernel = ProbabilityKernel::from_policy(&policy);
        let density = stationary_density(&kernel, 0, 2, 5, 0);
        assert_eq!(density.last(), &[0.0, 1.0, 0.0]);
    }

    fn solved_growth_kernel(nk: usize) -> (crate::config::ModelConfig, ProbabilityKernel) {
        use crate::bellman::Operator;
        use crate::policy::quantal_policy;
        use crate::rewards::GrowthReward;
        use crate::solver::{solve_value_function, SolveOptions};
        use crate::tauchen::tauchen;
        use crate::types::Grid;

        let (z, m) = tauchen(3, 0.9, 0.01).unwrap();
        let k = Grid::linspace(0.05, 10.0, nk).unwrap();
        let cfg = crate::config::ModelConfig::new(0.9, 0.06, k, z, m).unwrap();
        let reward = GrowthReward {
            sigma: 0.9,
            alpha: 0.4,
        };
        let op = Operator::quantal(0.2);
        let v = solve_value_function(&cfg, &reward, &op, &SolveOptions::default()).unwrap();
        let kernel = quantal_policy(&cfg, &reward, &v, &op).unwrap();
        (cfg, kernel)
    }

    fn empirical_marginal(indices: &[usize], nk: usize, burn_in: usize) -> Vec<f64> {
        let mut hist = vec![0.0; nk];
        for &i in &indices[burn_in..] {
            hist[i] += 1.0;
        }
        let n = (indices.len() - burn_in) as f64;
        for h in &mut hist {
            *h /= n;
        }
        hist
    }

    #[test]
    fn test_simulation_round_trips_stationary_density() {
        // The empirical marginal of a long simulated path must match the
        // analytically iterated density within sampling error.
        let (cfg, kernel) = solved_growth_kernel(30);
        let density = stationary_density(&kernel, 1, 0, 100, 0);
        let path = crate::simulate::simulate_kernel_path(&cfg, &kernel, 1, 0, 50_000, 1234);
        let hist = empirical_marginal(&path.indices, cfg.nk(), 1000);

        let sup_gap = hist
            .iter()
            .zip(density.last())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        assert!(
            sup_gap < 0.05,
            "empirical marginal diverges from stationary density (sup gap {})",
            sup_gap
        );
    }

    /// Production-scale round trip. Run with:
    /// cargo test stationary -- --ignored --nocapture
    #[test]
    #[ignore] // 400-point grid, 150k-step path: minutes, not CI material
    fn test_simulation_round_trips_stationary_density_large() {
        let (cfg, kernel) = solved_growth_kernel(400);
        let density = stationary_density(&kernel, 1, 0, 100, 0);
        let path = crate::simulate::simulate_kernel_path(&cfg, &kernel, 1, 0, 150_000, 99);
        let hist = empirical_marginal(&path.indices, cfg.nk(), 5000);

        // Histogram-binning tolerance: compare mass aggregated over coarse
        // bins of 10 grid points.
        for bin in 0..40 {
            let lo = bin * 10;
            let sim: f64 = hist[lo..lo + 10].iter().sum();
            let exact: f64 = density.last()[lo..lo + 10].iter().sum();
            assert!(
                (sim - exact).abs() < 0.02,
                "bin {} mass: simulated {} vs stationary {}",
                bin,
                sim,
                exact
            );
        }
    }

    #[test]
    fn test_matches_direct_chain_stationary_distribution() {
        // Brute-force the stationary distribution by long multiplication of
        // a copy of the chain and compare.
        let kernel = ergodic_kernel();
        let density = stationary_density(&kernel, 0, 1, 200, 0);
        let pi = density.last();
        // π must be invariant: π P = π.
        for dest in 0..3 {
            let flow: f64 = (0..3).map(|s| kernel.row(s, 0)[dest] * pi[s]).sum();
            assert!(
                (flow - pi[dest]).abs() < 1e-10,
                "π not invariant at state {}: {} vs {}",
                dest,
                flow,
                pi[dest]
            );
        }
    }
}
