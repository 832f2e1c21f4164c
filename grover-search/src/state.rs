//! Real-amplitude state vector over `2^W` basis states.
//!
//! Grover iterations only ever apply sign flips and reflections about the
//! mean to a real uniform start, so amplitudes stay real and a `Vec<f64>`
//! is enough.

use keyspace_core::KeyspaceError;
use rand::Rng;

use crate::distribution::Distribution;
use crate::oracle::Oracle;
use crate::SearchError;

#[derive(Debug, Clone)]
pub struct StateVector {
    width: u32,
    amplitudes: Vec<f64>,
}

/// Number of basis states for `width` bits, if addressable on this target.
fn state_count(width: u32) -> Result<usize, SearchError> {
    if width == 0 {
        return Err(KeyspaceError::InvalidWidth(width).into());
    }
    if width >= usize::BITS || width >= u64::BITS {
        return Err(SearchError::ResourceExceeded {
            width,
            reason: format!("2^{} basis states are not addressable", width),
        });
    }
    Ok(1usize << width)
}

impl StateVector {
    /// Uniform superposition over all `2^width` states.
    ///
    /// Allocation is fallible: a state space too large for memory is
    /// reported as [`SearchError::ResourceExceeded`] instead of aborting.
    pub fn uniform(width: u32) -> Result<Self, SearchError> {
        let len = state_count(width)?;

        let mut amplitudes = Vec::new();
        amplitudes
            .try_reserve_exact(len)
            .map_err(|e| SearchError::ResourceExceeded {
                width,
                reason: e.to_string(),
            })?;
        amplitudes.resize(len, 1.0 / (len as f64).sqrt());

        Ok(StateVector { width, amplitudes })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn len(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amplitudes.is_empty()
    }

    /// Phase-flip every marked state.
    pub fn apply_oracle<O: Oracle + ?Sized>(&mut self, oracle: &O) {
        for (state, amplitude) in self.amplitudes.iter_mut().enumerate() {
            if oracle.marks(state as u64) {
                *amplitude = -*amplitude;
            }
        }
    }

    /// Inversion about the mean: `a -> 2 * mean - a`.
    pub fn apply_diffusion(&mut self) {
        let mean = self.amplitudes.iter().sum::<f64>() / self.amplitudes.len() as f64;
        for amplitude in self.amplitudes.iter_mut() {
            *amplitude = 2.0 * mean - *amplitude;
        }
    }

    /// One Grover round: oracle followed by diffusion.
    pub fn grover_step<O: Oracle + ?Sized>(&mut self, oracle: &O) {
        self.apply_oracle(oracle);
        self.apply_diffusion();
    }

    /// Measurement probability of a single basis state (0 outside the space).
    pub fn probability(&self, state: u64) -> f64 {
        usize::try_from(state)
            .ok()
            .and_then(|i| self.amplitudes.get(i))
            .map_or(0.0, |a| a * a)
    }

    pub fn probabilities(&self) -> impl Iterator<Item = f64> + '_ {
        self.amplitudes.iter().map(|a| a * a)
    }

    /// Aggregate probability mass on marked states.
    pub fn marked_probability<O: Oracle + ?Sized>(&self, oracle: &O) -> f64 {
        self.amplitudes
            .iter()
            .enumerate()
            .filter(|(state, _)| oracle.marks(*state as u64))
            .map(|(_, a)| a * a)
            .sum()
    }

    /// The basis state with the largest probability (lowest index on ties).
    pub fn most_probable(&self) -> u64 {
        let mut best = 0usize;
        let mut best_p = f64::NEG_INFINITY;
        for (state, p) in self.probabilities().enumerate() {
            if p > best_p {
                best = state;
                best_p = p;
            }
        }
        best as u64
    }

    /// Square the amplitudes in place into a measurement distribution.
    pub fn into_distribution(self) -> Distribution {
        let mut probabilities = self.amplitudes;
        for p in probabilities.iter_mut() {
            *p *= *p;
        }
        Distribution::from_probabilities(self.width, probabilities)
    }

    /// Draw one basis state with probability `|a|^2`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let total: f64 = self.probabilities().sum();
        let threshold = rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        for (state, p) in self.probabilities().enumerate() {
            cumulative += p;
            if cumulative > threshold {
                return state as u64;
            }
        }
        // Only reached through floating-point rounding on the last bucket.
        (self.amplitudes.len() - 1) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn norm(state: &StateVector) -> f64 {
        state.probabilities().sum()
    }

    #[test]
    fn test_uniform() {
        let state = StateVector::uniform(3).unwrap();
        assert_eq!(state.len(), 8);
        for p in state.probabilities() {
            assert!((p - 0.125).abs() < 1e-12);
        }
        assert!((norm(&state) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_width_rejected() {
        let err = StateVector::uniform(0).unwrap_err();
        assert!(matches!(
            err,
            SearchError::Range(KeyspaceError::InvalidWidth(0))
        ));
    }

    #[test]
    fn test_unaddressable_width() {
        let err = StateVector::uniform(64).unwrap_err();
        assert!(matches!(err, SearchError::ResourceExceeded { width: 64, .. }));

        // 2^63 f64 amplitudes overflow the allocator's capacity limit.
        let err = StateVector::uniform(63).unwrap_err();
        assert!(matches!(err, SearchError::ResourceExceeded { width: 63, .. }));
    }

    #[test]
    fn test_into_distribution_squares_amplitudes() {
        let mut state = StateVector::uniform(3).unwrap();
        let oracle = |x: u64| x == 6;
        state.grover_step(&oracle);
        let expected: Vec<f64> = state.probabilities().collect();

        let dist = state.into_distribution();
        assert_eq!(dist.width(), 3);
        assert_eq!(dist.len(), 8);
        for (s, p) in expected.iter().enumerate() {
            assert_eq!(dist.probability(s as u64), *p);
        }
        assert_eq!(dist.get("110"), Some(expected[6]));
    }

    #[test]
    fn test_single_marked_state_after_one_step() {
        // N = 4, one marked state: a single Grover step is exact.
        let mut state = StateVector::uniform(2).unwrap();
        let oracle = |x: u64| x == 2;
        state.grover_step(&oracle);
        assert!((state.probability(2) - 1.0).abs() < 1e-12);
        assert!(state.probability(0) < 1e-12);
        assert_eq!(state.most_probable(), 2);
    }

    #[test]
    fn test_steps_preserve_norm() {
        let mut state = StateVector::uniform(6).unwrap();
        let oracle = |x: u64| (10..=20).contains(&x);
        for _ in 0..25 {
            state.grover_step(&oracle);
            assert!((norm(&state) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_diffusion_fixes_uniform_state() {
        let mut state = StateVector::uniform(4).unwrap();
        state.apply_diffusion();
        for p in state.probabilities() {
            assert!((p - 1.0 / 16.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_marked_probability() {
        let state = StateVector::uniform(4).unwrap();
        let oracle = |x: u64| x < 4;
        assert!((state.marked_probability(&oracle) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_probability_out_of_range() {
        let state = StateVector::uniform(2).unwrap();
        assert_eq!(state.probability(4), 0.0);
        assert_eq!(state.probability(u64::MAX), 0.0);
    }

    #[test]
    fn test_sample_follows_distribution() {
        let mut state = StateVector::uniform(3).unwrap();
        let oracle = |x: u64| x == 5;
        state.grover_step(&oracle);
        state.grover_step(&oracle);

        let mut rng = StdRng::seed_from_u64(7);
        let mut counts = [0u32; 8];
        for _ in 0..10_000 {
            counts[state.sample(&mut rng) as usize] += 1;
        }
        // Two rounds at N = 8 put ~94.5% of the mass on the marked state.
        let hit_rate = counts[5] as f64 / 10_000.0;
        assert!(
            (hit_rate - state.probability(5)).abs() < 0.02,
            "hit rate {} vs probability {}",
            hit_rate,
            state.probability(5)
        );
    }
}
