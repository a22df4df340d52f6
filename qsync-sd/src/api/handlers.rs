//! Job trigger handlers
//!
//! Request bodies are validated by the `Json` extractor; a body that does
//! not deserialize is rejected before any job exists.

use axum::{extract::State, http::StatusCode, Json};
use qsync_common::api::{ListenDevicesRequest, ListenPausedRequest, StartSongRequest};
use tracing::info;

use super::AppState;

/// POST /startSong
pub async fn start_song(
    State(state): State<AppState>,
    Json(request): Json<StartSongRequest>,
) -> StatusCode {
    info!(
        session_id = %request.party_id,
        song_id = %request.song_id,
        duration = request.duration,
        progress = request.progress,
        "startSong"
    );

    state.sync.start_song_sync(
        request.party_id,
        request.song_id,
        request.duration,
        request.progress,
    );
    StatusCode::OK
}

/// POST /listenPaused
pub async fn listen_paused(
    State(state): State<AppState>,
    Json(request): Json<ListenPausedRequest>,
) -> StatusCode {
    info!(session_id = %request.party_id, "listenPaused");

    state.sync.start_resume_watch(request.party_id);
    StatusCode::OK
}

/// POST /listenDevices
pub async fn listen_devices(
    State(state): State<AppState>,
    Json(request): Json<ListenDevicesRequest>,
) -> StatusCode {
    info!(
        session_id = %request.party_id,
        started_again = request.started_again,
        "listenDevices"
    );

    state
        .sync
        .start_device_acquisition(request.party_id, request.started_again);
    StatusCode::OK
}
