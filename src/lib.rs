//! Service registry with health-gated discovery.
//!
//! Instances register with an HTTP health endpoint, are probed on a fixed
//! interval, and only passing instances are returned by discovery queries.

pub mod agent;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod query;
pub mod registry;

pub use agent::Agent;
pub use config::schema::RegistryConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use registry::{HealthStatus, Registration, RegistryError, ServiceInstance};
