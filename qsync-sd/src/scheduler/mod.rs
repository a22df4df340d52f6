//! Timer scheduling primitive
//!
//! Every timer is a task on the tokio runtime, controlled through a handle
//! (see [`handle`]). Actions are async; an action that awaits an oracle call
//! suspends its own task only.
//!
//! Guarantees:
//! - A one-shot fires at most once, at or after its deadline.
//! - A recurring timer first fires one full period after it becomes armed,
//!   then every period. Firings of one timer never overlap; ticks missed
//!   while an action runs are skipped.
//! - `stop()` cancels future firings only. A firing that already started
//!   runs to completion.

pub mod handle;

use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::trace;

pub use handle::{OnceHandle, RecurringHandle, TimerState};

/// Stand-in deadline for delays too large to represent; matches tokio's own
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `start + delay`, saturating to a far-future instant instead of panicking
///
/// Delays come straight from request bodies, so `u64::MAX` seconds must
/// produce a timer that never fires rather than an overflow.
pub fn deadline_after(start: Instant, delay: Duration) -> Instant {
    start
        .checked_add(delay)
        .unwrap_or_else(|| start + FAR_FUTURE)
}

/// Spawns timer tasks onto a tokio runtime
///
/// Cheap to clone; passed into every job through its context.
#[derive(Debug, Clone)]
pub struct Scheduler {
    runtime: Handle,
}

impl Scheduler {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Scheduler on the runtime of the calling task
    ///
    /// Panics outside a tokio runtime, like `Handle::current()`.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Run `action` once, `delay` from now
    pub fn schedule_once<F, Fut>(&self, delay: Duration, action: F) -> OnceHandle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.schedule_at(deadline_after(Instant::now(), delay), action)
    }

    /// Run `action` once at `deadline`; a deadline in the past fires immediately
    pub fn schedule_at<F, Fut>(&self, deadline: Instant, action: F) -> OnceHandle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = OnceHandle::new();
        self.bind_once(&handle, deadline, action);
        handle
    }

    /// Run `action` every `period` until the returned handle is stopped
    ///
    /// With `start_immediately = false` the timer is created stopped and
    /// does nothing until `start()` is called on its handle.
    pub fn schedule_recurring<F, Fut>(
        &self,
        period: Duration,
        start_immediately: bool,
        action: F,
    ) -> RecurringHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = RecurringHandle::new(start_immediately);
        self.bind_recurring(&handle, period, action);
        handle
    }

    /// Attach a one-shot task to a handle created beforehand
    ///
    /// Lets two timers of one job hold each other's handles before either
    /// task exists. Bind each handle once.
    pub fn bind_once<F, Fut>(&self, handle: &OnceHandle, deadline: Instant, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let timer = handle.clone();
        let mut state = handle.subscribe();

        self.runtime.spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {}
                _ = state.wait_for(|s| *s == TimerState::Closed) => {
                    trace!("One-shot timer stopped before its deadline");
                    return;
                }
            }

            if timer.claim_firing() {
                action().await;
            }
        });
    }

    /// Attach a recurring task to a handle created beforehand
    pub fn bind_recurring<F, Fut>(&self, handle: &RecurringHandle, period: Duration, mut action: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut state = handle.subscribe();

        self.runtime.spawn(async move {
            loop {
                let current = *state.borrow_and_update();
                match current {
                    TimerState::Closed => return,
                    TimerState::Stopped => {
                        // All handles dropped: nobody can re-arm us
                        if state.changed().await.is_err() {
                            return;
                        }
                        continue;
                    }
                    TimerState::Armed => {}
                }

                let first = deadline_after(Instant::now(), period);
                let mut ticker = tokio::time::interval_at(first, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            // Stopped at the same instant the tick came due
                            if *state.borrow() != TimerState::Armed {
                                break;
                            }
                            action().await;
                        }
                        changed = state.changed() => {
                            if changed.is_err() {
                                return;
                            }
                            // Re-evaluate; a re-arm restarts the cadence
                            break;
                        }
                    }
                }
            }
        });
    }
}
