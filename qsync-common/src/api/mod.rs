//! API module for shared HTTP API types
//!
//! Contains only serde types; each service wraps them with its own
//! framework-specific handlers (Axum).

pub mod types;

pub use types::{ListenDevicesRequest, ListenPausedRequest, StartSongRequest};
