//! Registry error definitions.

use thiserror::Error;

/// Errors returned by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An instance with this id is already registered and the duplicate
    /// policy is `reject`.
    #[error("service instance ( {0} ) is already registered")]
    DuplicateId(String),

    /// No instance with this id is registered.
    #[error("service instance ( {0} ) was not found")]
    InstanceNotFound(String),

    /// No passing instance matched a discovery query.
    #[error("service ( {0} ) was not found")]
    ServiceNotFound(String),

    /// Registration input failed validation.
    #[error("invalid registration: {0}")]
    InvalidRegistration(String),

    /// Store state contradicts its own locking discipline. Always a bug.
    #[error("store invariant violated: {0}")]
    InvariantViolation(String),

    /// The health check HTTP client could not be constructed.
    #[error("health check client error: {0}")]
    HealthClient(#[from] reqwest::Error),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_not_found_display() {
        let err = RegistryError::ServiceNotFound("web".into());
        assert_eq!(err.to_string(), "service ( web ) was not found");
    }

    #[test]
    fn test_instance_errors_name_the_id() {
        let err = RegistryError::InstanceNotFound("web-1".into());
        assert!(err.to_string().contains("web-1"));

        let err = RegistryError::DuplicateId("web-1".into());
        assert!(err.to_string().contains("already registered"));
    }
}
