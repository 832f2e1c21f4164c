//! Amplitude amplification: uniform start, `r` Grover rounds, one measurement.
//!
//! With `k` marked states out of `N = 2^W` and `sin θ = sqrt(k / N)`, the
//! marked mass after `r` rounds is `sin²((2r + 1)θ)`. It peaks near
//! `r ≈ (π/4)·sqrt(N/k)` and falls again past that point, so more rounds are
//! not always better.

use std::f64::consts::PI;

use keyspace_core::KeyspaceError;
use rand::Rng;
use serde::Serialize;

use crate::distribution::{bit_string, Distribution};
use crate::oracle::Oracle;
use crate::state::StateVector;
use crate::SearchError;

/// Caller policy for the simulation.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Refuse state spaces wider than this many bits. `None` leaves the
    /// bound to fallible allocation.
    pub max_width: Option<u32>,
}

/// Outcome of a single amplified search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// The sampled basis state.
    pub best_candidate: u64,
    /// Probability mass the final distribution assigns to `best_candidate`.
    pub confidence: f64,
    /// Whether `best_candidate` is marked by the oracle.
    pub oracle_evaluation: bool,
    /// Most probable state as a `W`-bit string.
    pub top_measurement: String,
    /// Aggregate probability mass on marked states.
    pub success_probability: f64,
    pub width: u32,
    pub iterations: u64,
    pub marked_count: u64,
    pub optimal_iterations: u64,
    /// Probability of every basis state, keyed by its `W`-bit string.
    pub raw_distribution: Distribution,
}

impl SearchResult {
    pub fn best_candidate_bits(&self) -> String {
        bit_string(self.best_candidate, self.width)
    }
}

fn rotation_angle(width: u32, marked: u64) -> f64 {
    let space = 2f64.powi(width as i32);
    (marked as f64 / space).sqrt().min(1.0).asin()
}

/// Round count that maximises the marked mass: `floor(π / 4θ)`.
pub fn optimal_iterations(width: u32, marked: u64) -> Result<u64, SearchError> {
    if marked == 0 {
        return Err(SearchError::EmptyOracle { width });
    }
    let theta = rotation_angle(width, marked);
    Ok((PI / (4.0 * theta)).floor() as u64)
}

/// Closed-form marked mass after `iterations` rounds: `sin²((2r + 1)θ)`.
pub fn theoretical_success_probability(width: u32, marked: u64, iterations: u64) -> f64 {
    if marked == 0 {
        return 0.0;
    }
    let theta = rotation_angle(width, marked);
    ((2.0 * iterations as f64 + 1.0) * theta).sin().powi(2)
}

/// Runs amplified searches. Stateless apart from its policy.
#[derive(Debug, Clone, Default)]
pub struct AmplificationEngine {
    config: EngineConfig,
}

impl AmplificationEngine {
    pub fn new(config: EngineConfig) -> Self {
        AmplificationEngine { config }
    }

    /// Amplify the states `oracle` marks in a `width`-bit space for
    /// `iterations` rounds, then sample once from the result.
    ///
    /// With `iterations == 0` this is a single draw from the uniform prior.
    /// Nothing is returned on failure; there are no internal retries.
    pub fn search<O, R>(
        &self,
        oracle: &O,
        width: u32,
        iterations: u64,
        rng: &mut R,
    ) -> Result<SearchResult, SearchError>
    where
        O: Oracle + ?Sized,
        R: Rng + ?Sized,
    {
        if width == 0 {
            return Err(KeyspaceError::InvalidWidth(width).into());
        }
        if let Some(max_width) = self.config.max_width {
            if width > max_width {
                return Err(SearchError::ResourceExceeded {
                    width,
                    reason: format!("policy limit is {} bits", max_width),
                });
            }
        }

        let mut state = StateVector::uniform(width)?;

        let marked_count = (0..state.len() as u64).filter(|&x| oracle.marks(x)).count() as u64;
        let optimal = optimal_iterations(width, marked_count)?;

        log::debug!(
            "Amplifying {} of 2^{} states for {} rounds (optimal {})",
            marked_count,
            width,
            iterations,
            optimal
        );
        if iterations > optimal {
            log::warn!(
                "{} rounds exceeds the optimal {} for {} marked states; success probability drops",
                iterations,
                optimal,
                marked_count
            );
        }

        for _ in 0..iterations {
            state.grover_step(oracle);
        }

        let best_candidate = state.sample(rng);
        let confidence = state.probability(best_candidate);
        let success_probability = state.marked_probability(oracle);
        let top_measurement = bit_string(state.most_probable(), width);

        Ok(SearchResult {
            best_candidate,
            confidence,
            oracle_evaluation: oracle.marks(best_candidate),
            top_measurement,
            success_probability,
            width,
            iterations,
            marked_count,
            optimal_iterations: optimal,
            raw_distribution: state.into_distribution(),
        })
    }
}
