//! Service instance records.
//!
//! # Responsibilities
//! - Represent a single registered service instance
//! - Track health status and last probe outcome
//! - Validate registration input and build the health check URL

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::SystemTime;
use url::Url;

use crate::registry::error::{RegistryError, RegistryResult};

/// Health status of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Passing,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Passing => "passing",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration input as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Unique instance id.
    pub id: String,
    /// Logical service name.
    pub name: String,
    /// Host or IP the instance listens on.
    pub address: String,
    pub port: u16,
    /// Either a path joined onto `http://address:port` or an absolute URL.
    pub health_check_path: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Registration {
    /// Check required fields and resolve the health check URL.
    pub fn health_check_url(&self) -> RegistryResult<Url> {
        if self.id.trim().is_empty() {
            return Err(RegistryError::InvalidRegistration("id must not be empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(RegistryError::InvalidRegistration("name must not be empty".into()));
        }
        if self.address.trim().is_empty() {
            return Err(RegistryError::InvalidRegistration("address must not be empty".into()));
        }
        if self.port == 0 {
            return Err(RegistryError::InvalidRegistration("port must be non-zero".into()));
        }

        let path = self.health_check_path.trim();
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path).map_err(|e| {
                RegistryError::InvalidRegistration(format!("health check url {path:?}: {e}"))
            });
        }
        if !path.starts_with('/') {
            return Err(RegistryError::InvalidRegistration(format!(
                "health check path {path:?} must start with '/' or be an http(s) url"
            )));
        }

        let host = if self.address.contains(':') && !self.address.starts_with('[') {
            // Bare IPv6 literal.
            format!("[{}]", self.address)
        } else {
            self.address.clone()
        };
        let base = Url::parse(&format!("http://{}:{}", host, self.port)).map_err(|e| {
            RegistryError::InvalidRegistration(format!("address {:?}: {e}", self.address))
        })?;
        base.join(path).map_err(|e| {
            RegistryError::InvalidRegistration(format!("health check path {path:?}: {e}"))
        })
    }
}

/// A registered service instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstance {
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub tags: BTreeSet<String>,
    pub health_check_url: Url,
    pub status: HealthStatus,
    /// Time of the most recent probe outcome.
    pub last_check: Option<SystemTime>,
    /// Description of the most recent probe outcome.
    pub output: String,
    /// Registration epoch assigned by the store.
    pub generation: u64,
}

impl ServiceInstance {
    /// Build a fresh, never-probed instance from a registration.
    pub fn from_registration(registration: Registration) -> RegistryResult<Self> {
        let health_check_url = registration.health_check_url()?;
        Ok(Self {
            id: registration.id,
            name: registration.name,
            address: registration.address,
            port: registration.port,
            tags: registration
                .tags
                .into_iter()
                .filter(|t| !t.is_empty())
                .collect(),
            health_check_url,
            status: HealthStatus::Critical,
            last_check: None,
            output: String::new(),
            generation: 0,
        })
    }

    pub fn is_passing(&self) -> bool {
        self.status == HealthStatus::Passing
    }

    /// Empty tag matches every instance.
    pub fn has_tag(&self, tag: &str) -> bool {
        tag.is_empty() || self.tags.contains(tag)
    }
}
