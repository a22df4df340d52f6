//! Device-Acquisition job
//!
//! When a party starts, the session service may not see an active playback
//! device yet. A listener asks for one every `device_interval` (sub-second
//! by default, device appearance is latency sensitive) and starts playback
//! as soon as one shows up. A ceiling timer gives up after
//! `device_ceiling`.
//!
//! The `stop` flag sent with every search starts false and, once set by
//! the ceiling or by a failed play attempt, stays set. Exactly one search
//! with `stop = true` is sent to tell the session service to abandon its
//! side of the search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use qsync_common::SessionId;
use tokio::time::Instant;
use tracing::{info, trace, warn};

use super::{JobCore, JobId, JobKind, JobPair, JobPhase, SyncContext};
use crate::oracle::Device;
use crate::scheduler::deadline_after;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAcquisitionPhase {
    Searching,
    Acquired,
    TimedOut,
}

impl JobPhase for DeviceAcquisitionPhase {
    fn is_terminal(self) -> bool {
        !matches!(self, DeviceAcquisitionPhase::Searching)
    }

    fn label(self) -> &'static str {
        match self {
            DeviceAcquisitionPhase::Searching => "searching",
            DeviceAcquisitionPhase::Acquired => "acquired",
            DeviceAcquisitionPhase::TimedOut => "timed_out",
        }
    }
}

struct DeviceAcquisitionJob {
    core: JobCore<DeviceAcquisitionPhase>,
    started_again: bool,
    /// Written once, false -> true
    stop: AtomicBool,
}

pub(crate) fn spawn(ctx: &SyncContext, session: SessionId, started_again: bool) -> JobId {
    let created = Instant::now();
    let timings = &ctx.timings;

    let job = Arc::new(DeviceAcquisitionJob {
        core: JobCore::new(
            ctx,
            JobKind::DeviceAcquisition,
            session,
            JobPair::new(true),
            DeviceAcquisitionPhase::Searching,
        ),
        started_again,
        stop: AtomicBool::new(false),
    });

    info!(
        job_id = %job.core.id,
        session_id = %job.core.session,
        started_again,
        ceiling_secs = timings.device_ceiling().as_secs(),
        "Searching for an active device"
    );

    let listener_job = Arc::clone(&job);
    ctx.scheduler.bind_recurring(&job.core.pair.watchdog, timings.device_interval(), move || {
        let job = Arc::clone(&listener_job);
        async move { job.on_listen().await }
    });

    let ceiling_job = Arc::clone(&job);
    ctx.scheduler.bind_once(
        &job.core.pair.primary,
        deadline_after(created, timings.device_ceiling()),
        move || async move { ceiling_job.on_ceiling().await },
    );

    job.core.id
}

impl DeviceAcquisitionJob {
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Device listener firing
    async fn on_listen(&self) {
        let Some(device) = self.search(self.stopped()).await else {
            return;
        };

        if !device.is_usable() {
            trace!(job_id = %self.core.id, "Device reported without an id, still searching");
            return;
        }

        // The search was in flight when the job gave up
        if self.stopped() || self.core.pair.is_terminated() {
            return;
        }

        match self
            .core
            .ctx
            .oracle
            .request_initial_play(&self.core.session, &device, self.started_again)
            .await
        {
            Ok(()) => {
                info!(
                    job_id = %self.core.id,
                    session_id = %self.core.session,
                    device_id = %device.id,
                    device_type = device.kind.as_deref().unwrap_or("unknown"),
                    "Playback started on device"
                );
                self.core.finish(DeviceAcquisitionPhase::Acquired);
            }
            Err(err) => {
                self.core.report_failure("request_initial_play", &err);
                self.abandon().await;
            }
        }
    }

    /// Ceiling timer firing
    async fn on_ceiling(&self) {
        warn!(
            job_id = %self.core.id,
            session_id = %self.core.session,
            "No active device found before the ceiling"
        );
        self.abandon().await;
    }

    /// Stop both timers and send the single `stop = true` search
    async fn abandon(&self) {
        self.core.pair.terminate();

        if self.stop.swap(true, Ordering::SeqCst) {
            return;
        }

        self.search(true).await;
        self.core.finish(DeviceAcquisitionPhase::TimedOut);
    }

    /// Search failures are reported and read as "no device"
    async fn search(&self, stop: bool) -> Option<Device> {
        match self.core.ctx.oracle.search_devices(&self.core.session, stop).await {
            Ok(device) => device,
            Err(err) => {
                self.core.report_failure("search_devices", &err);
                None
            }
        }
    }
}
