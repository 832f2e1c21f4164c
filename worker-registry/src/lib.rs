//! Worker identities and the files that hold them.
//!
//! - [`WorkerProfile`]: API key plus optional outbound proxy settings.
//! - [`WorkerRegistry`]: the profiles file, addressed by position.
//! - [`AssignmentStore`]: the keyspace table, saved separately from identities.

pub mod profile;
pub mod registry;

use std::path::PathBuf;

use keyspace_core::WorkerId;

pub use profile::WorkerProfile;
pub use registry::{AssignmentStore, WorkerRegistry};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no worker at position {id} (registry holds {len})")]
    UnknownWorker { id: WorkerId, len: usize },

    #[error("failed to read or write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
