//! # Queue Sync Daemon Library (qsync-sd)
//!
//! Keeps a collaborative queue session in step with the playback device
//! that actually plays it.
//!
//! **Purpose:** Run the timed jobs that advance songs, notice playback
//! resumed outside the queue, and wait for a playback device, polling the
//! session service throughout.
//!
//! **Architecture:** tokio timer tasks ([`scheduler`]) driven by an HTTP
//! trigger surface ([`api`]) and talking to the session service through
//! [`oracle::SessionOracle`].

pub mod api;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod oracle;
pub mod scheduler;
pub mod server;

pub use error::{Error, Result};
pub use jobs::SessionSync;
