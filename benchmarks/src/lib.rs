//! Empirical amplification sweeps.
//!
//! Runs many independently seeded searches per iteration count and compares
//! the observed hit rate with the closed-form success probability.

use std::time::Instant;

use grover_search::{
    optimal_iterations, theoretical_success_probability, AmplificationEngine, Oracle,
    RangeOracle, SearchError,
};
use keyspace_core::Keyspace;
use num_traits::ToPrimitive;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

/// One iteration count of a sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepPoint {
    pub iterations: u64,
    pub trials: u64,
    pub hits: u64,
    pub empirical_hit_rate: f64,
    pub theoretical_success_probability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub keyspace: Keyspace,
    pub width: u32,
    pub marked_count: u64,
    pub optimal_iterations: u64,
    pub seed: u64,
    pub points: Vec<SweepPoint>,
    pub wall_seconds: f64,
}

/// Count seeded runs whose sample is marked. Trial `t` uses seed
/// `base_seed + t`, so results do not depend on thread scheduling.
pub fn count_hits<O>(
    engine: &AmplificationEngine,
    oracle: &O,
    width: u32,
    iterations: u64,
    trials: u64,
    base_seed: u64,
) -> Result<u64, SearchError>
where
    O: Oracle + Sync + ?Sized,
{
    let outcomes: Vec<bool> = (0..trials)
        .into_par_iter()
        .map(|trial| {
            let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(trial));
            engine
                .search(oracle, width, iterations, &mut rng)
                .map(|r| r.oracle_evaluation)
        })
        .collect::<Result<_, _>>()?;
    Ok(outcomes.into_iter().filter(|&hit| hit).count() as u64)
}

/// Fraction of `trials` seeded runs that land on a marked state.
pub fn empirical_hit_rate<O>(
    engine: &AmplificationEngine,
    oracle: &O,
    width: u32,
    iterations: u64,
    trials: u64,
    base_seed: u64,
) -> Result<f64, SearchError>
where
    O: Oracle + Sync + ?Sized,
{
    if trials == 0 {
        return Ok(0.0);
    }
    let hits = count_hits(engine, oracle, width, iterations, trials, base_seed)?;
    Ok(hits as f64 / trials as f64)
}

/// The three probe points around the optimum: half, optimal, double.
pub fn optimum_probes(optimal: u64) -> Vec<u64> {
    vec![optimal / 2, optimal, optimal * 2]
}

/// Sweep `iteration_points` over the keyspace's own state space.
pub fn sweep(
    engine: &AmplificationEngine,
    keyspace: &Keyspace,
    iteration_points: &[u64],
    trials: u64,
    seed: u64,
) -> Result<SweepReport, SearchError> {
    let start = Instant::now();
    let oracle = RangeOracle::for_keyspace(keyspace);
    let width = oracle.width();
    let marked_count = oracle
        .marked_count(width)
        .to_u64()
        .ok_or_else(|| SearchError::ResourceExceeded {
            width,
            reason: "marked state count does not fit in 64 bits".to_string(),
        })?;
    let optimal = optimal_iterations(width, marked_count)?;

    let mut points = Vec::with_capacity(iteration_points.len());
    for &iterations in iteration_points {
        let hits = count_hits(engine, &oracle, width, iterations, trials, seed)?;
        let point = SweepPoint {
            iterations,
            trials,
            hits,
            empirical_hit_rate: if trials == 0 { 0.0 } else { hits as f64 / trials as f64 },
            theoretical_success_probability: theoretical_success_probability(
                width,
                marked_count,
                iterations,
            ),
        };
        log::info!(
            "r={}: {}/{} hits (theory {:.4})",
            iterations,
            hits,
            trials,
            point.theoretical_success_probability
        );
        points.push(point);
    }

    Ok(SweepReport {
        keyspace: keyspace.clone(),
        width,
        marked_count,
        optimal_iterations: optimal,
        seed,
        points,
        wall_seconds: start.elapsed().as_secs_f64(),
    })
}
