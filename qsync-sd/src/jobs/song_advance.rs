//! Song Advance job
//!
//! A one-shot song timer fires at the expected end of the current song and
//! asks the session service to play the next one. A status poller checks
//! every `status_interval` whether the session should stop following this
//! song (paused, skipped, party closed).
//!
//! ```text
//! Armed ──song end──▶ Resolving ──stop=false, advance ok──▶ Advanced
//!   ▲                     │ └──────stop=true──────────────▶ Stopped
//!   └──advance failed─────┘
//! Armed ──poll stop=true──────────────────────────────────▶ Stopped
//! ```
//!
//! The poller is created stopped and armed `status_arm_delay` after job
//! creation, and only when the song has more than that left. A pause and
//! resume right before a skip would otherwise let a poll judge stale
//! progress during the first seconds of the job.

use std::sync::Arc;
use std::time::Duration;

use qsync_common::{SessionId, SongId};
use tokio::time::Instant;
use tracing::{debug, info};

use super::{JobCore, JobId, JobKind, JobPair, JobPhase, SyncContext};
use crate::scheduler::deadline_after;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongAdvancePhase {
    /// Waiting for the song to end; the poller may be running
    Armed,
    /// Song timer fired; deciding whether to advance
    Resolving,
    Advanced,
    Stopped,
}

impl JobPhase for SongAdvancePhase {
    fn is_terminal(self) -> bool {
        matches!(self, SongAdvancePhase::Advanced | SongAdvancePhase::Stopped)
    }

    fn label(self) -> &'static str {
        match self {
            SongAdvancePhase::Armed => "armed",
            SongAdvancePhase::Resolving => "resolving",
            SongAdvancePhase::Advanced => "advanced",
            SongAdvancePhase::Stopped => "stopped",
        }
    }
}

/// Progress as reported to the session service, never past the end
pub fn saved_progress(duration_secs: u64, progress_secs: u64) -> u64 {
    progress_secs.min(duration_secs)
}

/// Time left until the song ends; zero when progress is past the end
pub fn remaining_time(duration_secs: u64, progress_secs: u64) -> Duration {
    Duration::from_secs(duration_secs - saved_progress(duration_secs, progress_secs))
}

struct SongAdvanceJob {
    core: JobCore<SongAdvancePhase>,
    song: SongId,
    saved_progress: u64,
}

pub(crate) fn spawn(
    ctx: &SyncContext,
    session: SessionId,
    song: SongId,
    duration_secs: u64,
    progress_secs: u64,
) -> JobId {
    let created = Instant::now();
    let remaining = remaining_time(duration_secs, progress_secs);
    let timings = &ctx.timings;
    let scheduler = &ctx.scheduler;

    let job = Arc::new(SongAdvanceJob {
        core: JobCore::new(
            ctx,
            JobKind::SongAdvance,
            session,
            JobPair::new(false),
            SongAdvancePhase::Armed,
        ),
        song,
        saved_progress: saved_progress(duration_secs, progress_secs),
    });

    info!(
        job_id = %job.core.id,
        session_id = %job.core.session,
        song_id = %job.song,
        remaining_secs = remaining.as_secs(),
        "Song timer armed"
    );

    let poller_job = Arc::clone(&job);
    scheduler.bind_recurring(&job.core.pair.watchdog, timings.status_interval(), move || {
        let job = Arc::clone(&poller_job);
        async move { job.on_status_tick().await }
    });

    let song_job = Arc::clone(&job);
    scheduler.bind_once(
        &job.core.pair.primary,
        deadline_after(created, remaining),
        move || async move { song_job.on_song_end().await },
    );

    let arm_delay = timings.status_arm_delay();
    if remaining > arm_delay {
        let poller = job.core.pair.watchdog.clone();
        let job_id = job.core.id;
        scheduler.schedule_at(deadline_after(created, arm_delay), move || async move {
            if poller.start() {
                debug!(%job_id, "Status poller armed");
            }
        });
    }

    job.core.id
}

impl SongAdvanceJob {
    /// Status poller firing
    async fn on_status_tick(&self) {
        if self.check_status().await {
            debug!(job_id = %self.core.id, session_id = %self.core.session, "Status poll says stop");
            self.core.finish(SongAdvancePhase::Stopped);
        }
    }

    /// Song timer firing: the song should have ended by now
    async fn on_song_end(&self) {
        // No poll may race the advance decision
        self.core.pair.watchdog.stop();
        self.core.enter(SongAdvancePhase::Resolving);

        if self.check_status().await {
            self.core.finish(SongAdvancePhase::Stopped);
            return;
        }

        match self.core.ctx.oracle.request_advance(&self.core.session).await {
            Ok(()) => self.core.finish(SongAdvancePhase::Advanced),
            Err(err) => {
                // Keep watching the session; the next poll decides again
                self.core.enter(SongAdvancePhase::Armed);
                self.core.pair.watchdog.start();
                self.core.report_failure("request_advance", &err);
            }
        }
    }

    /// Ask whether to stop following this song; failures count as stop
    async fn check_status(&self) -> bool {
        match self
            .core
            .ctx
            .oracle
            .report_playback_status(&self.core.session, &self.song, self.saved_progress)
            .await
        {
            Ok(signal) => signal.stop,
            Err(err) => {
                self.core.report_failure("report_playback_status", &err);
                true
            }
        }
    }
}
