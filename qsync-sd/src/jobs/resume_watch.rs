//! External-Resume Watch job
//!
//! After the party pauses, a listener may resume playback straight from
//! the device instead of through the queue. A poller asks the session
//! service every `paused_interval` whether that happened; a ceiling timer
//! bounds the watch for sessions that are simply abandoned.

use std::sync::Arc;

use qsync_common::SessionId;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{JobCore, JobId, JobKind, JobPair, JobPhase, SyncContext};
use crate::scheduler::deadline_after;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeWatchPhase {
    Watching,
    /// The session service answered stop (or could not be reached)
    Resolved,
    /// Ceiling reached without a stop answer
    Expired,
}

impl JobPhase for ResumeWatchPhase {
    fn is_terminal(self) -> bool {
        !matches!(self, ResumeWatchPhase::Watching)
    }

    fn label(self) -> &'static str {
        match self {
            ResumeWatchPhase::Watching => "watching",
            ResumeWatchPhase::Resolved => "resolved",
            ResumeWatchPhase::Expired => "expired",
        }
    }
}

struct ResumeWatchJob {
    core: JobCore<ResumeWatchPhase>,
}

pub(crate) fn spawn(ctx: &SyncContext, session: SessionId) -> JobId {
    let created = Instant::now();
    let timings = &ctx.timings;

    let job = Arc::new(ResumeWatchJob {
        core: JobCore::new(
            ctx,
            JobKind::ResumeWatch,
            session,
            JobPair::new(true),
            ResumeWatchPhase::Watching,
        ),
    });

    info!(
        job_id = %job.core.id,
        session_id = %job.core.session,
        ceiling_secs = timings.resume_ceiling().as_secs(),
        "Watching for external resume"
    );

    let poller_job = Arc::clone(&job);
    ctx.scheduler.bind_recurring(&job.core.pair.watchdog, timings.paused_interval(), move || {
        let job = Arc::clone(&poller_job);
        async move { job.on_poll().await }
    });

    let ceiling_job = Arc::clone(&job);
    ctx.scheduler.bind_once(
        &job.core.pair.primary,
        deadline_after(created, timings.resume_ceiling()),
        move || async move { ceiling_job.on_ceiling() },
    );

    job.core.id
}

impl ResumeWatchJob {
    async fn on_poll(&self) {
        let stop = match self.core.ctx.oracle.report_paused(&self.core.session).await {
            Ok(signal) => signal.stop,
            Err(err) => {
                self.core.report_failure("report_paused", &err);
                true
            }
        };

        if stop {
            debug!(job_id = %self.core.id, "Pause watch resolved");
            self.core.finish(ResumeWatchPhase::Resolved);
        }
    }

    fn on_ceiling(&self) {
        self.core.finish(ResumeWatchPhase::Expired);
    }
}
