//! HTTP trigger surface
//!
//! Each POST endpoint creates one job and answers immediately; the job
//! runs on its own from then on.

pub mod handlers;
pub mod health;

use axum::{routing::post, Router};
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;

use crate::jobs::SessionSync;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Job entry points
    pub sync: SessionSync,
    /// Process start time, reported by /health
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(sync: SessionSync) -> Self {
        Self {
            sync,
            started_at: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/startSong", post(handlers::start_song))
        .route("/listenPaused", post(handlers::listen_paused))
        .route("/listenDevices", post(handlers::listen_devices))
        .merge(health::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
