//! Session synchronization jobs
//!
//! Three kinds of job keep a party's queue in step with its playback
//! device:
//! - [`song_advance`]: advance the queue when the current song ends
//! - [`resume_watch`]: notice playback resumed outside the queue after a pause
//! - [`device_acquisition`]: wait for an active device, then start playback
//!
//! Each job is one [`JobPair`] plus a few fields of job-local state, owned
//! by an `Arc` that only the job's own timer actions hold. Jobs share
//! nothing but the oracle and are never deduplicated: two triggers for the
//! same session run two independent jobs.

pub mod device_acquisition;
pub mod metrics;
pub mod pair;
pub mod resume_watch;
pub mod song_advance;

use std::fmt;
use std::sync::{Arc, Mutex};

use qsync_common::config::SyncTimings;
use qsync_common::{SessionId, SongId};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::oracle::{OracleError, SessionOracle};
use crate::scheduler::Scheduler;

pub use device_acquisition::DeviceAcquisitionPhase;
pub use metrics::{JobMetrics, JobMetricsSnapshot, KindSnapshot};
pub use pair::JobPair;
pub use resume_watch::ResumeWatchPhase;
pub use song_advance::SongAdvancePhase;

/// Log correlation id of one job instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    SongAdvance,
    ResumeWatch,
    DeviceAcquisition,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobKind::SongAdvance => "song_advance",
            JobKind::ResumeWatch => "resume_watch",
            JobKind::DeviceAcquisition => "device_acquisition",
        })
    }
}

/// Everything a job needs from the outside world
#[derive(Clone)]
pub struct SyncContext {
    pub scheduler: Scheduler,
    pub oracle: Arc<dyn SessionOracle>,
    pub timings: SyncTimings,
    pub metrics: Arc<JobMetrics>,
}

/// Phase enum of one job kind
pub(crate) trait JobPhase: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    fn is_terminal(self) -> bool;
    fn label(self) -> &'static str;
}

/// State shared by the timer actions of one job
pub(crate) struct JobCore<P> {
    pub(crate) id: JobId,
    pub(crate) kind: JobKind,
    pub(crate) session: SessionId,
    pub(crate) ctx: SyncContext,
    pub(crate) pair: JobPair,
    phase: Mutex<P>,
}

impl<P: JobPhase> JobCore<P> {
    pub(crate) fn new(ctx: &SyncContext, kind: JobKind, session: SessionId, pair: JobPair, initial: P) -> Self {
        ctx.metrics.job_started(kind);
        Self {
            id: JobId::new(),
            kind,
            session,
            ctx: ctx.clone(),
            pair,
            phase: Mutex::new(initial),
        }
    }

    /// Move to `next` unless the job already ended; returns whether it moved
    fn transition(&self, next: P) -> bool {
        let mut phase = self.phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if phase.is_terminal() {
            return false;
        }
        *phase = next;
        true
    }

    /// Enter a non-terminal phase
    pub(crate) fn enter(&self, next: P) {
        if self.transition(next) {
            debug!(job = %self.kind, job_id = %self.id, session_id = %self.session, phase = next.label(), "Job phase changed");
        }
    }

    /// Terminate both timers and record the terminal outcome
    ///
    /// Safe to call from either timer, any number of times; only the first
    /// outcome counts.
    pub(crate) fn finish(&self, outcome: P) {
        self.pair.terminate();
        if self.transition(outcome) {
            info!(job = %self.kind, job_id = %self.id, session_id = %self.session, outcome = outcome.label(), "Job finished");
            self.ctx.metrics.job_finished(self.kind, outcome.label());
        }
    }

    pub(crate) fn report_failure(&self, operation: &'static str, err: &OracleError) {
        self.ctx.metrics.oracle_failure(self.kind);
        error!(
            job = %self.kind,
            job_id = %self.id,
            session_id = %self.session,
            operation,
            error = %err,
            "Oracle call failed"
        );
    }
}

/// Entry points used by the job triggers
///
/// Every call returns immediately; a job's result is visible only through
/// its effect on the session service and through logs/metrics.
#[derive(Clone)]
pub struct SessionSync {
    ctx: SyncContext,
}

impl SessionSync {
    pub fn new(scheduler: Scheduler, oracle: Arc<dyn SessionOracle>, timings: SyncTimings) -> Self {
        Self {
            ctx: SyncContext {
                scheduler,
                oracle,
                timings,
                metrics: Arc::new(JobMetrics::new()),
            },
        }
    }

    pub fn context(&self) -> &SyncContext {
        &self.ctx
    }

    pub fn metrics(&self) -> JobMetricsSnapshot {
        self.ctx.metrics.snapshot()
    }

    /// Follow `song` until it ends, then advance the queue
    pub fn start_song_sync(&self, session: SessionId, song: SongId, duration_secs: u64, progress_secs: u64) -> JobId {
        song_advance::spawn(&self.ctx, session, song, duration_secs, progress_secs)
    }

    /// Watch for playback resumed outside the queue
    pub fn start_resume_watch(&self, session: SessionId) -> JobId {
        resume_watch::spawn(&self.ctx, session)
    }

    /// Wait for an active device, then start playback on it
    pub fn start_device_acquisition(&self, session: SessionId, started_again: bool) -> JobId {
        device_acquisition::spawn(&self.ctx, session, started_again)
    }
}
