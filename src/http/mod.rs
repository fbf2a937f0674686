//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, middleware)
//!     → request.rs (request ID)
//!     → handlers.rs (Agent calls)
//!     → response.rs (views, error → status mapping)
//!     → Send to client
//! ```
//!
//! # Routes
//! - `PUT  /v1/agent/service/register`
//! - `PUT  /v1/agent/service/deregister/{id}`
//! - `GET  /v1/agent/service/{id}`
//! - `GET  /v1/agent/services`
//! - `GET  /v1/health/service/{name}?tag=`
//! - `GET  /v1/status`

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
