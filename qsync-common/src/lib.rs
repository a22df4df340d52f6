//! # Queue Sync Common Library
//!
//! Shared code for the queue sync services:
//! - Error type
//! - Session/song identifiers
//! - Configuration loading (TOML bootstrap with compiled defaults)
//! - HTTP request types for the job triggers

pub mod api;
pub mod config;
pub mod error;
pub mod ids;

pub use error::{Error, Result};
pub use ids::{SessionId, SongId};
