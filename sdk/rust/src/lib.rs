//! Client for the service registry HTTP API.

mod client;

pub use client::{ClientError, Registration, RegistryClient, ServiceEntry};
