//! Amplitude-amplification search over assigned keyspaces.
//!
//! A classical state-vector simulation of Grover search:
//!
//! 1. **Oracle**: [`RangeOracle`] marks exactly the integers of an inclusive
//!    range inside a `W`-bit state space.
//! 2. **Amplification**: [`AmplificationEngine`] starts from the uniform
//!    superposition over `2^W` states and applies oracle phase flips followed
//!    by inversion about the mean, `iterations` times.
//! 3. **Measurement**: a single sample is drawn from the resulting
//!    distribution with a caller-supplied RNG.
//!
//! [`KeyspacePartitioner`] keeps the per-worker keyspace table and runs the
//! search for whatever range a worker currently holds. Cross-worker
//! disjointness is left to the caller; see [`KeyspacePartitioner::distribute`].

pub mod distribution;
pub mod engine;
pub mod oracle;
pub mod partition;
pub mod state;

use keyspace_core::{KeyspaceError, WorkerId};

pub use distribution::Distribution;
pub use engine::{
    optimal_iterations, theoretical_success_probability, AmplificationEngine, EngineConfig,
    SearchResult,
};
pub use oracle::{Oracle, RangeOracle};
pub use partition::KeyspacePartitioner;
pub use state::StateVector;

/// Errors surfaced by oracle construction, amplification and assigned searches.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid keyspace: {0}")]
    Range(#[from] KeyspaceError),

    #[error("oracle marks no states in a {width}-bit state space")]
    EmptyOracle { width: u32 },

    #[error("worker {0} has no assigned keyspace")]
    NoKeyspace(WorkerId),

    #[error("{width}-bit state space exceeds available resources: {reason}")]
    ResourceExceeded { width: u32, reason: String },
}
