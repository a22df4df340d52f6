//! Request bodies for the job trigger endpoints
//!
//! Field names follow the session service's camelCase JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{SessionId, SongId};

/// Body of `POST /startSong`
///
/// # Examples
///
/// ```
/// use qsync_common::api::types::StartSongRequest;
///
/// let body = r#"{"partyId":"p1","songId":"s1","duration":200,"progress":50}"#;
/// let request: StartSongRequest = serde_json::from_str(body).unwrap();
/// assert_eq!(request.duration, 200);
/// assert!(request.device.is_none());
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSongRequest {
    pub party_id: SessionId,
    pub song_id: SongId,

    /// Track length in seconds
    pub duration: u64,

    /// Seconds already played when the request was made
    pub progress: u64,

    /// Device the song was started on; accepted for compatibility, unused
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Value>,
}

/// Body of `POST /listenPaused`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenPausedRequest {
    pub party_id: SessionId,
}

/// Body of `POST /listenDevices`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenDevicesRequest {
    pub party_id: SessionId,

    /// True when the party is being restarted rather than started fresh
    #[serde(default)]
    pub started_again: bool,
}
