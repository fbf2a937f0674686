//! Registry store.
//!
//! # Responsibilities
//! - Own every registered service instance record
//! - Insert, upsert and remove records atomically
//! - Apply health status updates coming from the health checker
//!
//! # Concurrency
//! Records live in a `DashMap` keyed by instance id. Each record is inserted
//! and removed whole under its shard lock, so readers only ever see complete
//! records. Callers get clones; the only way to mutate a record is through
//! the methods here.
//!
//! Every insert gets a fresh generation. Status updates name the generation
//! they were scheduled for and are dropped when it no longer matches, which
//! keeps an in-flight probe of a removed or replaced registration from
//! touching the current record.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use crate::config::DuplicatePolicy;
use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::instance::{HealthStatus, ServiceInstance};

/// Outcome of a successful register call.
#[derive(Debug, Clone)]
pub struct Registered {
    /// Snapshot of the stored record.
    pub instance: ServiceInstance,
    /// True when an existing record with the same id was replaced.
    pub replaced: bool,
}

/// Thread-safe store of service instances.
#[derive(Debug)]
pub struct RegistryStore {
    records: DashMap<String, ServiceInstance>,
    next_generation: AtomicU64,
    duplicate_policy: DuplicatePolicy,
}

impl RegistryStore {
    pub fn new(duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            records: DashMap::new(),
            next_generation: AtomicU64::new(0),
            duplicate_policy,
        }
    }

    /// Insert a record, resetting it to Critical with a new generation.
    ///
    /// The generation is drawn while the id's shard lock is held, so the
    /// stored record for an id always carries the newest generation issued
    /// for it.
    pub fn register(&self, mut instance: ServiceInstance) -> RegistryResult<Registered> {
        instance.status = HealthStatus::Critical;
        instance.last_check = None;
        instance.output.clear();

        match self.records.entry(instance.id.clone()) {
            Entry::Occupied(mut entry) => match self.duplicate_policy {
                DuplicatePolicy::Reject => Err(RegistryError::DuplicateId(instance.id)),
                DuplicatePolicy::Upsert => {
                    instance.generation = self.issue_generation();
                    entry.insert(instance.clone());
                    Ok(Registered { instance, replaced: true })
                }
            },
            Entry::Vacant(entry) => {
                instance.generation = self.issue_generation();
                entry.insert(instance.clone());
                Ok(Registered { instance, replaced: false })
            }
        }
    }

    fn issue_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// True while the record for `id` belongs to `generation`.
    pub fn holds(&self, id: &str, generation: u64) -> bool {
        self.records
            .get(id)
            .is_some_and(|r| r.value().generation == generation)
    }

    /// Remove a record, returning it.
    pub fn deregister(&self, id: &str) -> RegistryResult<ServiceInstance> {
        self.records
            .remove(id)
            .map(|(_, instance)| instance)
            .ok_or_else(|| RegistryError::InstanceNotFound(id.to_string()))
    }

    /// Remove a record only if it still belongs to `generation`.
    pub fn deregister_generation(&self, id: &str, generation: u64) -> Option<ServiceInstance> {
        self.records
            .remove_if(id, |_, instance| instance.generation == generation)
            .map(|(_, instance)| instance)
    }

    pub fn get(&self, id: &str) -> RegistryResult<ServiceInstance> {
        self.records
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| RegistryError::InstanceNotFound(id.to_string()))
    }

    /// All instances sharing a logical service name, in no particular order.
    pub fn list(&self, name: &str) -> Vec<ServiceInstance> {
        self.records
            .iter()
            .filter(|r| r.value().name == name)
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn all(&self) -> Vec<ServiceInstance> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record a probe outcome.
    ///
    /// Returns the previous status, or `None` when the id is gone or the
    /// generation is stale; either way nothing is written.
    pub(crate) fn update_status(
        &self,
        id: &str,
        generation: u64,
        status: HealthStatus,
        output: String,
        at: SystemTime,
    ) -> Option<HealthStatus> {
        let mut record = self.records.get_mut(id)?;
        if record.generation != generation {
            return None;
        }
        let previous = record.status;
        record.status = status;
        record.output = output;
        record.last_check = Some(at);
        Some(previous)
    }
}

impl Default for RegistryStore {
    fn default() -> Self {
        Self::new(DuplicatePolicy::default())
    }
}
