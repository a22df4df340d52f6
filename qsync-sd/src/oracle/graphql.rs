//! GraphQL session oracle client
//!
//! Talks to the session service's GraphQL endpoint with plain
//! `{query, variables}` POST requests.

use std::time::Duration;

use async_trait::async_trait;
use qsync_common::{SessionId, SongId};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{Device, OracleError, SessionOracle, StopSignal};

const USER_AGENT: &str = concat!("qsync-sd/", env!("CARGO_PKG_VERSION"));

const PLAY_SONG: &str = r#"mutation playSong($partyId: ID!) {
  playSong(partyId: $partyId) {
    success
  }
}"#;

const CHECK_PLAYBACK_STATUS: &str = r#"mutation playbackStatus($partyId: ID!, $songId: ID!, $savedProgress: Int!) {
  playbackStatus(partyId: $partyId, songId: $songId, savedProgress: $savedProgress) {
    stop
  }
}"#;

const LISTEN_PAUSED: &str = r#"mutation listeningPaused($partyId: ID!) {
  listeningPaused(partyId: $partyId) {
    stop
  }
}"#;

const SEARCH_DEVICES: &str = r#"query searchDevices($partyId: ID!, $stop: Boolean!) {
  searchDevices(partyId: $partyId, stop: $stop) {
    id
    type
  }
}"#;

const INITIAL_PLAY_SONG: &str = r#"mutation initialPlaySong($partyId: ID!, $device: JSON!, $startedAgain: Boolean) {
  initialPlaySong(partyId: $partyId, device: $device, startedAgain: $startedAgain) {
    success
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Ack {
    success: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaySongData {
    play_song: Option<Ack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaybackStatusData {
    playback_status: StopSignal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListeningPausedData {
    listening_paused: StopSignal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchDevicesData {
    search_devices: Option<Device>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitialPlaySongData {
    initial_play_song: Option<Ack>,
}

/// Decode a GraphQL response body into its `data` payload
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, OracleError> {
    let response: GraphQlResponse<T> =
        serde_json::from_str(body).map_err(|e| OracleError::Parse(e.to_string()))?;

    if !response.errors.is_empty() {
        let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(OracleError::GraphQl(messages.join("; ")));
    }

    response
        .data
        .ok_or_else(|| OracleError::Parse("response has neither data nor errors".to_string()))
}

/// Log mutations the session service answered without confirming
fn check_ack(operation: &str, session: &SessionId, ack: Option<Ack>) {
    match ack {
        Some(Ack { success: Some(true) }) => {}
        other => warn!(
            session_id = %session,
            "{} was not confirmed by the session service ({:?})",
            operation,
            other.and_then(|a| a.success)
        ),
    }
}

/// Session oracle backed by the session service's GraphQL API
#[derive(Debug, Clone)]
pub struct GraphQlOracle {
    http_client: reqwest::Client,
    endpoint: String,
}

impl GraphQlOracle {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, OracleError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> Result<T, OracleError> {
        debug!(operation, "Sending GraphQL request");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| OracleError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OracleError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(OracleError::Http {
                status: status.as_u16(),
                body,
            });
        }

        decode(&body)
    }
}

#[async_trait]
impl SessionOracle for GraphQlOracle {
    async fn request_advance(&self, session: &SessionId) -> Result<(), OracleError> {
        let data: PlaySongData = self
            .execute("playSong", PLAY_SONG, json!({ "partyId": session }))
            .await?;
        check_ack("playSong", session, data.play_song);
        Ok(())
    }

    async fn report_playback_status(
        &self,
        session: &SessionId,
        song: &SongId,
        saved_progress: u64,
    ) -> Result<StopSignal, OracleError> {
        let data: PlaybackStatusData = self
            .execute(
                "playbackStatus",
                CHECK_PLAYBACK_STATUS,
                json!({
                    "partyId": session,
                    "songId": song,
                    "savedProgress": saved_progress,
                }),
            )
            .await?;
        Ok(data.playback_status)
    }

    async fn report_paused(&self, session: &SessionId) -> Result<StopSignal, OracleError> {
        let data: ListeningPausedData = self
            .execute("listeningPaused", LISTEN_PAUSED, json!({ "partyId": session }))
            .await?;
        Ok(data.listening_paused)
    }

    async fn search_devices(
        &self,
        session: &SessionId,
        stop: bool,
    ) -> Result<Option<Device>, OracleError> {
        let data: SearchDevicesData = self
            .execute(
                "searchDevices",
                SEARCH_DEVICES,
                json!({ "partyId": session, "stop": stop }),
            )
            .await?;
        Ok(data.search_devices)
    }

    async fn request_initial_play(
        &self,
        session: &SessionId,
        device: &Device,
        started_again: bool,
    ) -> Result<(), OracleError> {
        let data: InitialPlaySongData = self
            .execute(
                "initialPlaySong",
                INITIAL_PLAY_SONG,
                json!({
                    "partyId": session,
                    "device": device,
                    "startedAgain": started_again,
                }),
            )
            .await?;
        check_ack("initialPlaySong", session, data.initial_play_song);
        Ok(())
    }
}
