//! # quantal-capital — discrete stochastic optimal control, hard-max vs quantal response
//!
//! Solves discrete-state, infinite-horizon capital-accumulation problems by
//! **value-function iteration** and compares the classical (max-operator)
//! solution against a bounded-rationality (entropy-regularized / softmax
//! "quantal response") solution.
//!
//! ## Pipeline
//!
//! Data flows strictly downward:
//!
//! | Stage | Module | Description |
//! |-------|--------|-------------|
//! | 1 | [`tauchen`] | Discretize the AR(1) productivity shock into a finite Markov chain |
//! | 2 | [`config`] | Bundle parameters, grids and the transition matrix into an immutable [`ModelConfig`] |
//! | 3 | [`rewards`] | One-step payoff kernels: growth (CRRA) and lumpy investment (asymmetric adjustment cost + inaction branch) |
//! | 4 | [`bellman`] | Deterministic `T(V)` and quantal `T_QR(λ, V)` operators |
//! | 5 | [`solver`] | Successive approximation to the unique fixed point (β-contraction) |
//! | 6 | [`policy`] | Greedy argmax policy or the full softmax probability kernel |
//! | 7 | [`simulate`] | Seeded Monte Carlo paths of shocks and capital |
//! | 8 | [`stationary`] | Chapman–Kolmogorov forward recursion to the stationary density |
//!
//! Everything is in-memory `f64` arrays; plotting/report generation are
//! external consumers of the arrays and have no hooks here.
//!
//! ## Parallelism
//!
//! Every grid-indexed `(i, j)` sweep is embarrassingly parallel (rayon):
//! cells read only the previous iterate's shared continuation table and the
//! read-only config, and each sweep writes a fresh output buffer. The outer
//! fixed-point loop and the per-path simulation clock are sequential.

pub mod bellman;
pub mod config;
pub mod errors;
pub mod policy;
pub mod rewards;
pub mod runtime;
pub mod simulate;
pub mod solver;
pub mod stationary;
pub mod tauchen;
pub mod types;

pub use bellman::Operator;
pub use config::ModelConfig;
pub use errors::{KernelError, KernelResult};
pub use policy::{greedy_policy, quantal_policy};
pub use rewards::{Continuation, GrowthReward, InvestmentReward, RewardKernel};
pub use simulate::{simulate_kernel_path, simulate_policy_path, simulate_shock_path, CapitalPath};
pub use solver::{solve, solve_value_function, SolveOptions};
pub use stationary::{stationary_density, StationaryDensity};
pub use tauchen::tauchen;
pub use types::{
    Grid, PolicyArray, ProbabilityKernel, SimulationSummary, TransitionMatrix, ValueFunction,
};
