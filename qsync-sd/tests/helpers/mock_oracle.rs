//! Scripted session oracle
//!
//! Each operation answers from its own queue of scripted results and falls
//! back to a neutral default once the queue is empty:
//! advance/initial play succeed, status/pause polls answer `stop = false`,
//! device searches find nothing.
//!
//! A scripted result may carry a delay: the call is recorded when it starts
//! and answers only after the delay has passed in virtual time.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use qsync_common::{SessionId, SongId};
use qsync_sd::oracle::{Device, OracleError, SessionOracle, StopSignal};
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum OracleCall {
    Advance,
    PlaybackStatus { song: String, saved_progress: u64 },
    Paused,
    SearchDevices { stop: bool },
    InitialPlay { device_id: String, started_again: bool },
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Virtual time since the mock was created
    pub at: Duration,
    pub session: String,
    pub call: OracleCall,
}

impl RecordedCall {
    /// Elapsed time rounded to whole seconds
    pub fn secs(&self) -> u64 {
        ((self.at.as_millis() + 500) / 1000) as u64
    }
}

/// Failure value for scripts
pub fn failure() -> OracleError {
    OracleError::Network("scripted failure".to_string())
}

/// Scripted answers of one operation, each with its response delay
type Script<T> = Mutex<VecDeque<(Duration, T)>>;

async fn next<T>(queue: &Script<T>, default: T) -> T {
    let (delay, result) = queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((Duration::ZERO, default));
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    result
}

fn immediate<T>(results: impl IntoIterator<Item = T>) -> impl Iterator<Item = (Duration, T)> {
    results.into_iter().map(|result| (Duration::ZERO, result))
}

pub struct MockOracle {
    origin: Instant,
    calls: Mutex<Vec<RecordedCall>>,
    advance: Script<Result<(), OracleError>>,
    status: Script<Result<StopSignal, OracleError>>,
    paused: Script<Result<StopSignal, OracleError>>,
    devices: Script<Result<Option<Device>, OracleError>>,
    initial_play: Script<Result<(), OracleError>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            calls: Mutex::new(Vec::new()),
            advance: Mutex::new(VecDeque::new()),
            status: Mutex::new(VecDeque::new()),
            paused: Mutex::new(VecDeque::new()),
            devices: Mutex::new(VecDeque::new()),
            initial_play: Mutex::new(VecDeque::new()),
        }
    }

    pub fn script_advance(&self, results: impl IntoIterator<Item = Result<(), OracleError>>) {
        self.advance.lock().unwrap().extend(immediate(results));
    }

    pub fn script_status(&self, results: impl IntoIterator<Item = Result<StopSignal, OracleError>>) {
        self.status.lock().unwrap().extend(immediate(results));
    }

    pub fn script_paused(&self, results: impl IntoIterator<Item = Result<StopSignal, OracleError>>) {
        self.paused.lock().unwrap().extend(immediate(results));
    }

    pub fn script_devices(
        &self,
        results: impl IntoIterator<Item = Result<Option<Device>, OracleError>>,
    ) {
        self.devices.lock().unwrap().extend(immediate(results));
    }

    pub fn script_initial_play(&self, results: impl IntoIterator<Item = Result<(), OracleError>>) {
        self.initial_play.lock().unwrap().extend(immediate(results));
    }

    /// Next device search answers `result` only after `delay`
    pub fn script_devices_delayed(
        &self,
        delay: Duration,
        result: Result<Option<Device>, OracleError>,
    ) {
        self.devices.lock().unwrap().push_back((delay, result));
    }

    /// Next initial play answers `result` only after `delay`
    pub fn script_initial_play_delayed(&self, delay: Duration, result: Result<(), OracleError>) {
        self.initial_play.lock().unwrap().push_back((delay, result));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Whole-second timestamps of the calls matching `filter`
    pub fn times_of(&self, filter: impl Fn(&OracleCall) -> bool) -> Vec<u64> {
        self.calls()
            .iter()
            .filter(|c| filter(&c.call))
            .map(RecordedCall::secs)
            .collect()
    }

    pub fn status_times(&self) -> Vec<u64> {
        self.times_of(|c| matches!(c, OracleCall::PlaybackStatus { .. }))
    }

    pub fn advance_times(&self) -> Vec<u64> {
        self.times_of(|c| matches!(c, OracleCall::Advance))
    }

    pub fn paused_times(&self) -> Vec<u64> {
        self.times_of(|c| matches!(c, OracleCall::Paused))
    }

    pub fn search_times(&self, stop: bool) -> Vec<u64> {
        self.times_of(|c| matches!(c, OracleCall::SearchDevices { stop: s } if *s == stop))
    }

    pub fn initial_play_calls(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c.call, OracleCall::InitialPlay { .. }))
            .collect()
    }

    fn record(&self, session: &SessionId, call: OracleCall) {
        self.calls.lock().unwrap().push(RecordedCall {
            at: Instant::now() - self.origin,
            session: session.to_string(),
            call,
        });
    }
}

#[async_trait]
impl SessionOracle for MockOracle {
    async fn request_advance(&self, session: &SessionId) -> Result<(), OracleError> {
        self.record(session, OracleCall::Advance);
        next(&self.advance, Ok(())).await
    }

    async fn report_playback_status(
        &self,
        session: &SessionId,
        song: &SongId,
        saved_progress: u64,
    ) -> Result<StopSignal, OracleError> {
        self.record(
            session,
            OracleCall::PlaybackStatus {
                song: song.to_string(),
                saved_progress,
            },
        );
        next(&self.status, Ok(StopSignal::CONTINUE)).await
    }

    async fn report_paused(&self, session: &SessionId) -> Result<StopSignal, OracleError> {
        self.record(session, OracleCall::Paused);
        next(&self.paused, Ok(StopSignal::CONTINUE)).await
    }

    async fn search_devices(
        &self,
        session: &SessionId,
        stop: bool,
    ) -> Result<Option<Device>, OracleError> {
        self.record(session, OracleCall::SearchDevices { stop });
        next(&self.devices, Ok(None)).await
    }

    async fn request_initial_play(
        &self,
        session: &SessionId,
        device: &Device,
        started_again: bool,
    ) -> Result<(), OracleError> {
        self.record(
            session,
            OracleCall::InitialPlay {
                device_id: device.id.clone(),
                started_again,
            },
        );
        next(&self.initial_play, Ok(())).await
    }
}
