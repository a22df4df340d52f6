//! Session oracle
//!
//! The session service holds the ground truth about what the party should
//! be playing and (indirectly) what the playback device is doing. Jobs only
//! ever talk to it through [`SessionOracle`]; the production implementation
//! is [`graphql::GraphQlOracle`].

pub mod graphql;

use async_trait::async_trait;
use qsync_common::{SessionId, SongId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use graphql::GraphQlOracle;

/// Session oracle errors
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Outcome of every status-style poll
///
/// `stop = true` means the condition the job was waiting on is already
/// satisfied (or the session is gone) and the job must halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct StopSignal {
    pub stop: bool,
}

impl StopSignal {
    pub const STOP: StopSignal = StopSignal { stop: true };
    pub const CONTINUE: StopSignal = StopSignal { stop: false };
}

/// Playback-capable device reported by the oracle
///
/// Fields beyond `id` and `type` are kept so the device can be handed back
/// to the oracle unchanged when starting playback on it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Device {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A `null` id reads as an empty one
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Device {
    pub fn new(id: impl Into<String>, kind: Option<&str>) -> Self {
        Self {
            id: id.into(),
            kind: kind.map(str::to_string),
            extra: Map::new(),
        }
    }

    /// A device without an identifier cannot be played on
    pub fn is_usable(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Operations the synchronization jobs need from the session service
///
/// Every call may fail. Implementations must tolerate unlimited concurrent
/// calls; jobs never issue a second call from the same callback before the
/// first resolves.
#[async_trait]
pub trait SessionOracle: Send + Sync {
    /// Ask the session to start/advance to its next song
    async fn request_advance(&self, session: &SessionId) -> Result<(), OracleError>;

    /// Report observed progress of `song`; answers whether the session should halt
    async fn report_playback_status(
        &self,
        session: &SessionId,
        song: &SongId,
        saved_progress: u64,
    ) -> Result<StopSignal, OracleError>;

    /// Ask whether listening was resumed outside the queue
    async fn report_paused(&self, session: &SessionId) -> Result<StopSignal, OracleError>;

    /// Look for an active device; `stop = true` abandons the search on the oracle's side
    async fn search_devices(
        &self,
        session: &SessionId,
        stop: bool,
    ) -> Result<Option<Device>, OracleError>;

    /// Start playback on a newly found device
    async fn request_initial_play(
        &self,
        session: &SessionId,
        device: &Device,
        started_again: bool,
    ) -> Result<(), OracleError>;
}
