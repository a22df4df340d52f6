//! Cancelable timer handles
//!
//! A handle is the control side of one timer task. The task watches the
//! handle's state through a `tokio::sync::watch` channel; every clone of a
//! handle controls the same timer.

use std::sync::Arc;
use tokio::sync::watch;

/// Lifecycle of a timer
///
/// `Stopped` is only reachable for recurring timers; a one-shot goes
/// straight from `Armed` to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Future firings will run
    Armed,
    /// Paused; a recurring timer can be re-armed with `start()`
    Stopped,
    /// Terminal; the timer never fires again and its task exits
    Closed,
}

#[derive(Debug, Clone)]
struct TimerControl {
    state: Arc<watch::Sender<TimerState>>,
}

impl TimerControl {
    fn new(initial: TimerState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { state: Arc::new(tx) }
    }

    fn state(&self) -> TimerState {
        *self.state.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state.subscribe()
    }

    /// Apply `from -> to` atomically; returns whether the state changed
    fn transition(&self, from: &[TimerState], to: TimerState) -> bool {
        self.state.send_if_modified(|state| {
            if from.contains(state) {
                *state = to;
                true
            } else {
                false
            }
        })
    }
}

/// Handle to a one-shot timer
///
/// Created armed. `stop()` closes the timer; it is idempotent and a no-op
/// after the timer has fired.
#[derive(Debug, Clone)]
pub struct OnceHandle {
    control: TimerControl,
}

impl OnceHandle {
    /// Create an armed handle with no task bound to it yet
    pub fn new() -> Self {
        Self {
            control: TimerControl::new(TimerState::Armed),
        }
    }

    /// Cancel the firing if it has not started yet
    pub fn stop(&self) {
        self.control
            .transition(&[TimerState::Armed, TimerState::Stopped], TimerState::Closed);
    }

    pub fn state(&self) -> TimerState {
        self.control.state()
    }

    /// True until the timer fires or is stopped
    pub fn is_pending(&self) -> bool {
        self.state() == TimerState::Armed
    }

    /// Claim the single firing; false if the timer was stopped first
    pub(crate) fn claim_firing(&self) -> bool {
        self.control.transition(&[TimerState::Armed], TimerState::Closed)
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.control.subscribe()
    }
}

impl Default for OnceHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a recurring timer
///
/// `stop()` pauses future firings and `start()` re-arms them. `close()`
/// ends the timer for good. All three are idempotent.
#[derive(Debug, Clone)]
pub struct RecurringHandle {
    control: TimerControl,
}

impl RecurringHandle {
    /// Create a handle with no task bound to it yet
    ///
    /// `armed = false` creates the timer stopped; it will not fire until
    /// `start()` is called.
    pub fn new(armed: bool) -> Self {
        let initial = if armed {
            TimerState::Armed
        } else {
            TimerState::Stopped
        };
        Self {
            control: TimerControl::new(initial),
        }
    }

    /// Re-arm a stopped timer; the next firing is one full period from now
    ///
    /// No effect on a timer that is already armed or closed.
    pub fn start(&self) -> bool {
        self.control.transition(&[TimerState::Stopped], TimerState::Armed)
    }

    /// Pause future firings; a firing already running completes
    pub fn stop(&self) {
        self.control.transition(&[TimerState::Armed], TimerState::Stopped);
    }

    /// Stop permanently
    pub fn close(&self) {
        self.control
            .transition(&[TimerState::Armed, TimerState::Stopped], TimerState::Closed);
    }

    pub fn state(&self) -> TimerState {
        self.control.state()
    }

    pub fn is_armed(&self) -> bool {
        self.state() == TimerState::Armed
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.control.subscribe()
    }
}
