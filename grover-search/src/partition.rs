//! Per-worker keyspace assignments.
//!
//! The assignment table is keyed by [`WorkerId`] and lives apart from worker
//! identities and credentials. Each worker holds at most one keyspace; a new
//! assignment replaces the old one outright and no history is kept.
//!
//! Disjointness across workers is not enforced here. Callers that want a
//! non-overlapping partition should use [`KeyspacePartitioner::distribute`]
//! or check [`KeyspacePartitioner::overlapping_pairs`] themselves.

use std::collections::BTreeMap;

use keyspace_core::{Keyspace, KeyspaceError, WorkerId};
use num_bigint::BigUint;
use rand::Rng;

use crate::engine::{AmplificationEngine, SearchResult};
use crate::oracle::RangeOracle;
use crate::SearchError;

#[derive(Debug, Clone, Default)]
pub struct KeyspacePartitioner {
    engine: AmplificationEngine,
    assignments: BTreeMap<WorkerId, Keyspace>,
}

impl KeyspacePartitioner {
    pub fn new(engine: AmplificationEngine) -> Self {
        KeyspacePartitioner {
            engine,
            assignments: BTreeMap::new(),
        }
    }

    /// Rebuild a partitioner from a previously saved table.
    pub fn from_assignments<I>(engine: AmplificationEngine, assignments: I) -> Self
    where
        I: IntoIterator<Item = (WorkerId, Keyspace)>,
    {
        KeyspacePartitioner {
            engine,
            assignments: assignments.into_iter().collect(),
        }
    }

    /// Assign `[lower, upper]` to `worker`.
    ///
    /// Bounds are validated before the table is touched, so a rejected
    /// assignment leaves any previous keyspace in place.
    pub fn assign(
        &mut self,
        worker: WorkerId,
        lower: BigUint,
        upper: BigUint,
    ) -> Result<(), SearchError> {
        let keyspace = Keyspace::new(lower, upper)?;
        self.assign_keyspace(worker, keyspace);
        Ok(())
    }

    /// Store an already-validated keyspace, returning the one it replaced.
    pub fn assign_keyspace(&mut self, worker: WorkerId, keyspace: Keyspace) -> Option<Keyspace> {
        log::info!("Assigning keyspace {} to worker {}", keyspace, worker);
        let previous = self.assignments.insert(worker, keyspace);
        if let Some(old) = &previous {
            if Some(old) != self.assignments.get(&worker) {
                log::warn!("Worker {} dropped its previous keyspace {}", worker, old);
            }
        }
        previous
    }

    pub fn current_keyspace(&self, worker: WorkerId) -> Option<&Keyspace> {
        self.assignments.get(&worker)
    }

    /// Remove a worker's assignment.
    pub fn release(&mut self, worker: WorkerId) -> Option<Keyspace> {
        let released = self.assignments.remove(&worker);
        if let Some(keyspace) = &released {
            log::info!("Released keyspace {} from worker {}", keyspace, worker);
        }
        released
    }

    /// Assignments in worker order.
    pub fn assignments(&self) -> impl Iterator<Item = (WorkerId, &Keyspace)> + '_ {
        self.assignments.iter().map(|(id, ks)| (*id, ks))
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Pairs of workers whose keyspaces intersect. Reported, never rejected.
    pub fn overlapping_pairs(&self) -> Vec<(WorkerId, WorkerId)> {
        let entries: Vec<(&WorkerId, &Keyspace)> = self.assignments.iter().collect();
        let mut pairs = Vec::new();
        for (i, (a, ks_a)) in entries.iter().enumerate() {
            for (b, ks_b) in &entries[i + 1..] {
                if ks_a.overlaps(ks_b) {
                    pairs.push((**a, **b));
                }
            }
        }
        pairs
    }

    /// Split `keyspace` into contiguous disjoint pieces and hand them to
    /// `workers` in order. When the keyspace has fewer elements than there
    /// are workers, the trailing workers keep whatever they held before.
    pub fn distribute(
        &mut self,
        workers: &[WorkerId],
        keyspace: &Keyspace,
    ) -> Result<Vec<(WorkerId, Keyspace)>, SearchError> {
        if workers.is_empty() {
            return Err(KeyspaceError::InvalidPartCount(0).into());
        }
        let pieces = keyspace.split(workers.len())?;
        let assigned: Vec<(WorkerId, Keyspace)> = workers.iter().copied().zip(pieces).collect();
        for (worker, piece) in &assigned {
            self.assign_keyspace(*worker, piece.clone());
        }
        Ok(assigned)
    }

    /// Run an amplified search over the keyspace `worker` currently holds,
    /// in the state space of width derived from its upper bound.
    pub fn search_assigned<R: Rng + ?Sized>(
        &self,
        worker: WorkerId,
        iterations: u64,
        rng: &mut R,
    ) -> Result<SearchResult, SearchError> {
        let keyspace = self
            .current_keyspace(worker)
            .ok_or(SearchError::NoKeyspace(worker))?;
        let oracle = RangeOracle::for_keyspace(keyspace);
        self.engine.search(&oracle, oracle.width(), iterations, rng)
    }
}
