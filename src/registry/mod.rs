//! Registry subsystem.
//!
//! # Data Flow
//! ```text
//! Register(registration)
//!     → instance.rs (validate, resolve health check URL)
//!     → store.rs (insert with new generation, status Critical)
//!
//! Health checker probe outcome
//!     → store.rs update_status (generation-checked)
//!
//! Query engine
//!     → store.rs list(name) → clones of whole records
//! ```

pub mod error;
pub mod instance;
pub mod store;

pub use error::{RegistryError, RegistryResult};
pub use instance::{HealthStatus, Registration, ServiceInstance};
pub use store::{Registered, RegistryStore};
