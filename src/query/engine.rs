//! Discovery queries.
//!
//! Read-only over the registry store: only passing instances carrying the
//! requested tag are returned. An empty result is `ServiceNotFound`, whether
//! the service was never registered or every instance is unhealthy.

use std::sync::Arc;

use crate::observability::metrics;
use crate::registry::{RegistryError, RegistryResult, RegistryStore, ServiceInstance};

/// Answers health-gated discovery queries.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: Arc<RegistryStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<RegistryStore>) -> Self {
        Self { store }
    }

    /// Passing instances of `name`, filtered by `tag` unless it is empty.
    pub fn query(&self, name: &str, tag: &str) -> RegistryResult<Vec<ServiceInstance>> {
        let matches: Vec<ServiceInstance> = self
            .store
            .list(name)
            .into_iter()
            .filter(|instance| instance.is_passing() && instance.has_tag(tag))
            .collect();

        metrics::record_query(!matches.is_empty());

        if matches.is_empty() {
            tracing::debug!(service = %name, tag = %tag, "No passing instances");
            return Err(RegistryError::ServiceNotFound(name.to_string()));
        }
        Ok(matches)
    }
}
