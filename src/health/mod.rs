//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Register
//!     → checker.rs watch(instance): spawn probe task for (id, generation)
//!
//! Probe task (every interval, first tick immediate):
//!     → probe.rs GET health_check_url with timeout
//!     → state.rs maps outcome to Passing / Critical
//!     → RegistryStore::update_status (no-op once deregistered)
//!
//! Deregister
//!     → checker.rs unwatch_generation(id, gen): abort task
//! ```
//!
//! # Design Decisions
//! - One task per instance so cancellation is per id
//! - Probe failures become status changes, never caller-visible errors
//! - Optional critical TTL removes instances that never recover

pub mod checker;
pub mod probe;
pub mod state;

pub use checker::HealthChecker;
