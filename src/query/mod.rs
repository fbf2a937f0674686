//! Query subsystem: health-gated, tag-filtered discovery.

pub mod engine;

pub use engine::QueryEngine;
