//! JSON files for worker profiles and keyspace assignments.
//!
//! The profiles file is a JSON array; a worker's id is its position in it.
//! The assignment file maps worker ids to `{"lower": "0x..", "upper": "0x.."}`.

use std::collections::BTreeMap;
use std::path::Path;

use keyspace_core::{Keyspace, WorkerId};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::profile::WorkerProfile;
use crate::RegistryError;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, RegistryError> {
    let contents = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| RegistryError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), RegistryError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| RegistryError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Worker profiles in file order.
#[derive(Debug, Clone, Default)]
pub struct WorkerRegistry {
    profiles: Vec<WorkerProfile>,
}

impl WorkerRegistry {
    pub fn from_profiles(profiles: Vec<WorkerProfile>) -> Self {
        WorkerRegistry { profiles }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let profiles: Vec<WorkerProfile> = read_json(path)?;
        log::info!("Loaded {} worker profiles from {}", profiles.len(), path.display());
        Ok(WorkerRegistry { profiles })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RegistryError> {
        let path = path.as_ref();
        write_json(path, &self.profiles)?;
        log::info!("Saved {} worker profiles to {}", self.profiles.len(), path.display());
        Ok(())
    }

    pub fn get(&self, id: WorkerId) -> Result<&WorkerProfile, RegistryError> {
        self.profiles.get(id.0).ok_or(RegistryError::UnknownWorker {
            id,
            len: self.profiles.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn worker_ids(&self) -> impl Iterator<Item = WorkerId> {
        (0..self.profiles.len()).map(WorkerId)
    }

    pub fn profiles(&self) -> &[WorkerProfile] {
        &self.profiles
    }
}

/// Saved keyspace assignments, keyed by worker id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentStore {
    assignments: BTreeMap<WorkerId, Keyspace>,
}

impl AssignmentStore {
    /// Load the table. A missing file is an empty table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No assignment file at {}, starting empty", path.display());
            return Ok(AssignmentStore::default());
        }
        let assignments: BTreeMap<WorkerId, Keyspace> = read_json(path)?;
        log::info!(
            "Loaded {} keyspace assignments from {}",
            assignments.len(),
            path.display()
        );
        Ok(AssignmentStore { assignments })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RegistryError> {
        let path = path.as_ref();
        write_json(path, &self.assignments)?;
        log::info!(
            "Saved {} keyspace assignments to {}",
            self.assignments.len(),
            path.display()
        );
        Ok(())
    }

    pub fn get(&self, id: WorkerId) -> Option<&Keyspace> {
        self.assignments.get(&id)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

impl FromIterator<(WorkerId, Keyspace)> for AssignmentStore {
    fn from_iter<I: IntoIterator<Item = (WorkerId, Keyspace)>>(iter: I) -> Self {
        AssignmentStore {
            assignments: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for AssignmentStore {
    type Item = (WorkerId, Keyspace);
    type IntoIter = std::collections::btree_map::IntoIter<WorkerId, Keyspace>;

    fn into_iter(self) -> Self::IntoIter {
        self.assignments.into_iter()
    }
}
