//! Shared environment configuration for the demo binaries.

/// Read `SOLVER_NUM_THREADS` and build the rayon global pool; tolerates an
/// already-initialized pool. Unset or unparsable leaves rayon's default.
/// Returns the effective thread count.
pub fn init_thread_pool() -> usize {
    if let Some(num_threads) = std::env::var("SOLVER_NUM_THREADS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
    {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // May fail if already initialized
    }
    let effective = rayon::current_num_threads();
    println!("Rayon threads: {}", effective);
    effective
}
