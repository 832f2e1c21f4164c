//! Measurement distribution over `2^W` basis states.
//!
//! Probabilities are held densely by state index, reusing the amplitude
//! buffer they were squared from. `W`-bit keys are formatted only while
//! iterating or serializing, so a result never costs more memory than the
//! state vector that produced it.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Zero-padded `width`-bit string for `state`.
pub(crate) fn bit_string(state: u64, width: u32) -> String {
    format!("{:0width$b}", state, width = width as usize)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    width: u32,
    probabilities: Vec<f64>,
}

impl Distribution {
    pub(crate) fn from_probabilities(width: u32, probabilities: Vec<f64>) -> Self {
        Distribution {
            width,
            probabilities,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Probability of a basis state (0 outside the space).
    pub fn probability(&self, state: u64) -> f64 {
        usize::try_from(state)
            .ok()
            .and_then(|i| self.probabilities.get(i))
            .copied()
            .unwrap_or(0.0)
    }

    /// Probability of the state spelled by exactly `W` binary digits.
    pub fn get(&self, bits: &str) -> Option<f64> {
        if bits.len() != self.width as usize || !bits.bytes().all(|b| b == b'0' || b == b'1') {
            return None;
        }
        let state = u64::from_str_radix(bits, 2).ok()?;
        Some(self.probability(state))
    }

    /// `(bitstring, probability)` pairs in state order.
    pub fn iter(&self) -> impl Iterator<Item = (String, f64)> + '_ {
        self.probabilities
            .iter()
            .enumerate()
            .map(move |(state, &p)| (bit_string(state as u64, self.width), p))
    }

    pub fn total(&self) -> f64 {
        self.probabilities.iter().sum()
    }

    /// The `n` most probable states, highest first. Ties keep state order.
    pub fn top(&self, n: usize) -> Vec<(u64, f64)> {
        let mut ranked: Vec<(u64, f64)> = Vec::with_capacity(n.min(self.len()));
        if n == 0 {
            return ranked;
        }
        for (state, &p) in self.probabilities.iter().enumerate() {
            if ranked.len() == n && ranked[n - 1].1 >= p {
                continue;
            }
            let at = ranked.partition_point(|&(_, q)| q >= p);
            if ranked.len() == n {
                ranked.pop();
            }
            ranked.insert(at, (state as u64, p));
        }
        ranked
    }
}

impl Serialize for Distribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (bits, p) in self.iter() {
            map.serialize_entry(&bits, &p)?;
        }
        map.end()
    }
}
