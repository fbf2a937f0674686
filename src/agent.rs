//! Registry agent.
//!
//! Front door for register, deregister and query calls. Keeps store
//! mutations and probe tasks in step: every stored registration has a probe
//! task for its generation, and removal cancels the task.

use std::sync::Arc;

use crate::config::RegistryConfig;
use crate::health::HealthChecker;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::query::QueryEngine;
use crate::registry::{
    Registration, RegistryError, RegistryResult, RegistryStore, ServiceInstance,
};

pub struct Agent {
    store: Arc<RegistryStore>,
    checker: HealthChecker,
    queries: QueryEngine,
}

impl Agent {
    /// Build an agent. Must be called inside a Tokio runtime.
    pub fn new(config: &RegistryConfig, shutdown: Shutdown) -> RegistryResult<Self> {
        let store = Arc::new(RegistryStore::new(config.registry.duplicate_policy));
        let checker = HealthChecker::new(store.clone(), config.health_check.clone(), shutdown)?;
        let queries = QueryEngine::new(store.clone());

        Ok(Self {
            store,
            checker,
            queries,
        })
    }

    /// Register (or, under the upsert policy, replace) an instance.
    pub fn register(&self, registration: Registration) -> RegistryResult<ServiceInstance> {
        let instance = match ServiceInstance::from_registration(registration) {
            Ok(instance) => instance,
            Err(e) => {
                metrics::record_registration("invalid");
                return Err(e);
            }
        };

        let registered = match self.store.register(instance) {
            Ok(registered) => registered,
            Err(e) => {
                metrics::record_registration("duplicate");
                return Err(e);
            }
        };
        let instance = registered.instance;

        // A concurrent deregister may already have removed it; that is fine.
        // Finding some other generation's record without a replacement is not.
        if let Ok(current) = self.store.get(&instance.id) {
            if current.generation < instance.generation {
                tracing::error!(id = %instance.id, stored = current.generation, inserted = instance.generation, "Store returned an older record than the one just inserted");
                return Err(RegistryError::InvariantViolation(format!(
                    "instance {} regressed from generation {} to {}",
                    instance.id, instance.generation, current.generation
                )));
            }
        }

        self.checker.watch(&instance);

        metrics::record_registration(if registered.replaced { "updated" } else { "created" });
        metrics::record_instance_count(self.store.len());
        tracing::info!(
            id = %instance.id,
            service = %instance.name,
            address = %instance.address,
            port = instance.port,
            health_check = %instance.health_check_url,
            replaced = registered.replaced,
            "Service instance registered"
        );
        Ok(instance)
    }

    /// Remove an instance and cancel its probes.
    pub fn deregister(&self, id: &str) -> RegistryResult<()> {
        let removed = self.store.deregister(id)?;
        self.checker.unwatch_generation(id, removed.generation);

        metrics::record_deregistration("api");
        metrics::record_instance_count(self.store.len());
        tracing::info!(id = %id, service = %removed.name, "Service instance deregistered");
        Ok(())
    }

    pub fn get(&self, id: &str) -> RegistryResult<ServiceInstance> {
        self.store.get(id)
    }

    /// Every registered instance, regardless of health.
    pub fn services(&self) -> Vec<ServiceInstance> {
        self.store.all()
    }

    /// Passing instances of a service, optionally filtered by tag.
    pub fn health_service(&self, name: &str, tag: &str) -> RegistryResult<Vec<ServiceInstance>> {
        self.queries.query(name, tag)
    }

    pub fn instance_count(&self) -> usize {
        self.store.len()
    }

    pub fn watched_count(&self) -> usize {
        self.checker.watched()
    }

    /// Stop all probe tasks.
    pub fn shutdown(&self) {
        self.checker.shutdown();
    }
}
