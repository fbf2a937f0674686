//! Active health checking.
//!
//! # Responsibilities
//! - Run one probe task per registered instance
//! - Write every probe outcome back through the registry store
//! - Cancel an instance's task when it is deregistered or replaced
//!
//! A task holds only `(id, generation, url)`. It never keeps a copy of the
//! record; the store rejects its updates once the generation is gone.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use url::Url;

use crate::config::HealthCheckConfig;
use crate::health::probe::{describe, HttpProber};
use crate::health::state::{status_for, CriticalTimer};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::registry::{RegistryStore, ServiceInstance};

struct ProbeTask {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Schedules and cancels per-instance probe tasks.
pub struct HealthChecker {
    store: Arc<RegistryStore>,
    prober: HttpProber,
    config: HealthCheckConfig,
    tasks: Arc<DashMap<String, ProbeTask>>,
    shutdown: Shutdown,
}

impl HealthChecker {
    pub fn new(
        store: Arc<RegistryStore>,
        config: HealthCheckConfig,
        shutdown: Shutdown,
    ) -> Result<Self, reqwest::Error> {
        let prober = HttpProber::new(&config)?;
        Ok(Self {
            store,
            prober,
            config,
            tasks: Arc::new(DashMap::new()),
            shutdown,
        })
    }

    /// Start probing an instance, replacing any task for an older generation.
    ///
    /// Returns false when nothing was scheduled: checks are disabled, a newer
    /// registration owns the id, or the record is already gone. The task slot
    /// is locked before the store is consulted, so a concurrent deregister
    /// either sees the new task and cancels it or removes the record first.
    pub fn watch(&self, instance: &ServiceInstance) -> bool {
        if !self.config.enabled {
            tracing::debug!(id = %instance.id, "Active health checks disabled; instance stays critical");
            return false;
        }

        let entry = self.tasks.entry(instance.id.clone());
        if let Entry::Occupied(existing) = &entry {
            if existing.get().generation > instance.generation {
                return false;
            }
        }
        if !self.store.holds(&instance.id, instance.generation) {
            tracing::debug!(id = %instance.id, generation = instance.generation, "Instance gone before probing started");
            return false;
        }

        // The task's own cleanup needs this slot, so it cannot finish before
        // the handle is stored.
        let handle = tokio::spawn(self.probe_loop(instance).run(self.shutdown.subscribe()));
        let task = ProbeTask {
            generation: instance.generation,
            handle,
        };
        match entry {
            Entry::Occupied(mut existing) => existing.insert(task).handle.abort(),
            Entry::Vacant(vacant) => {
                vacant.insert(task);
            }
        }

        tracing::debug!(
            id = %instance.id,
            generation = instance.generation,
            url = %instance.health_check_url,
            "Health checks scheduled"
        );
        true
    }

    fn probe_loop(&self, instance: &ServiceInstance) -> ProbeLoop {
        ProbeLoop {
            id: instance.id.clone(),
            service: instance.name.clone(),
            generation: instance.generation,
            url: instance.health_check_url.clone(),
            store: self.store.clone(),
            prober: self.prober.clone(),
            tasks: self.tasks.clone(),
            interval: self.config.interval(),
            deregister_after: self.config.deregister_critical_after(),
        }
    }

    /// Cancel probing for an id. Returns true if a task was running.
    pub fn unwatch(&self, id: &str) -> bool {
        match self.tasks.remove(id) {
            Some((_, task)) => {
                task.handle.abort();
                tracing::debug!(id = %id, "Health checks cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel probing for one generation of an id, leaving any newer task alone.
    pub fn unwatch_generation(&self, id: &str, generation: u64) -> bool {
        match self.tasks.remove_if(id, |_, task| task.generation <= generation) {
            Some((_, task)) => {
                task.handle.abort();
                tracing::debug!(id = %id, generation, "Health checks cancelled");
                true
            }
            None => false,
        }
    }

    /// Number of instances currently being probed.
    pub fn watched(&self) -> usize {
        self.tasks.len()
    }

    /// Abort every probe task.
    pub fn shutdown(&self) {
        let ids: Vec<String> = self.tasks.iter().map(|t| t.key().clone()).collect();
        for id in ids {
            self.unwatch(&id);
        }
        tracing::info!("Health checker stopped");
    }
}

impl Drop for HealthChecker {
    fn drop(&mut self) {
        for task in self.tasks.iter() {
            task.handle.abort();
        }
    }
}

struct ProbeLoop {
    id: String,
    service: String,
    generation: u64,
    url: Url,
    store: Arc<RegistryStore>,
    prober: HttpProber,
    tasks: Arc<DashMap<String, ProbeTask>>,
    interval: Duration,
    deregister_after: Option<Duration>,
}

impl ProbeLoop {
    async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut critical = CriticalTimer::default();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.check(&mut critical).await {
                        break;
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!(id = %self.id, "Probe task received shutdown signal");
                    break;
                }
            }
        }

        self.tasks
            .remove_if(&self.id, |_, task| task.generation == self.generation);
    }

    /// Probe once and record the outcome. Returns false when the task should stop.
    async fn check(&self, critical: &mut CriticalTimer) -> bool {
        let start = Instant::now();
        let result = self.prober.probe(&self.url).await;
        let status = status_for(&result);

        if let Err(e) = &result {
            tracing::warn!(id = %self.id, url = %self.url, error = %e, "Health check failed");
        }
        metrics::record_probe(&self.service, result.is_ok(), start);

        let previous = self.store.update_status(
            &self.id,
            self.generation,
            status,
            describe(&self.url, &result),
            SystemTime::now(),
        );
        match previous {
            None => {
                tracing::debug!(id = %self.id, generation = self.generation, "Instance no longer registered; stopping probes");
                return false;
            }
            Some(previous) if previous != status => {
                tracing::info!(id = %self.id, service = %self.service, from = %previous, to = %status, "Health status changed");
                metrics::record_status_transition(previous, status);
            }
            Some(_) => {}
        }

        if let Some(limit) = self.deregister_after {
            if critical.observe(status, Instant::now()) > limit {
                if self.store.deregister_generation(&self.id, self.generation).is_some() {
                    tracing::warn!(
                        id = %self.id,
                        service = %self.service,
                        critical_for = ?limit,
                        "Deregistering instance critical beyond TTL"
                    );
                    metrics::record_deregistration("critical_ttl");
                    metrics::record_instance_count(self.store.len());
                }
                return false;
            }
        }

        true
    }
}
