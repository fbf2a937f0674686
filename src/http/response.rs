//! Response bodies and error mapping.
//!
//! # Design Decisions
//! - Records are never serialized directly; views pick the public fields
//! - Errors map to status codes here and nowhere else
//! - Error bodies are `{"error": "<message>"}`

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::UNIX_EPOCH;

use crate::registry::{HealthStatus, RegistryError, ServiceInstance};

/// Full view of a registered instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceView {
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub tags: Vec<String>,
    pub health_check_url: String,
    pub status: HealthStatus,
    /// Milliseconds since the Unix epoch.
    pub last_check_ms: Option<u64>,
    pub output: String,
}

impl From<ServiceInstance> for InstanceView {
    fn from(instance: ServiceInstance) -> Self {
        let last_check_ms = instance.last_check.map(|t| {
            t.duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64
        });
        Self {
            id: instance.id,
            name: instance.name,
            address: instance.address,
            port: instance.port,
            tags: instance.tags.into_iter().collect(),
            health_check_url: instance.health_check_url.to_string(),
            status: instance.status,
            last_check_ms,
            output: instance.output,
        }
    }
}

/// One discovery result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub tags: Vec<String>,
    pub status: HealthStatus,
}

impl From<ServiceInstance> for ServiceEntry {
    fn from(instance: ServiceInstance) -> Self {
        Self {
            id: instance.id,
            name: instance.name,
            address: instance.address,
            port: instance.port,
            tags: instance.tags.into_iter().collect(),
            status: instance.status,
        }
    }
}

/// Registry status summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub instances: usize,
    pub watched: usize,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl RegistryError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RegistryError::DuplicateId(_) => StatusCode::CONFLICT,
            RegistryError::InstanceNotFound(_) | RegistryError::ServiceNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            RegistryError::InvalidRegistration(_) => StatusCode::BAD_REQUEST,
            RegistryError::InvariantViolation(_) | RegistryError::HealthClient(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Registry request failed");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
