//! Primary timer + watchdog poller owned by one job

use crate::scheduler::{OnceHandle, RecurringHandle, TimerState};

/// The two timers of one job
///
/// `primary` is the expected end of whatever the job waits for (song end,
/// ceiling); `watchdog` polls reality in the meantime. Handles are created
/// before their tasks are bound so each timer's action can stop the other.
#[derive(Debug, Clone)]
pub struct JobPair {
    pub primary: OnceHandle,
    pub watchdog: RecurringHandle,
}

impl JobPair {
    pub fn new(watchdog_armed: bool) -> Self {
        Self {
            primary: OnceHandle::new(),
            watchdog: RecurringHandle::new(watchdog_armed),
        }
    }

    /// Stop both halves for good
    ///
    /// Idempotent. Once this returns neither timer starts another firing.
    pub fn terminate(&self) {
        self.watchdog.close();
        self.primary.stop();
    }

    pub fn is_terminated(&self) -> bool {
        self.watchdog.state() == TimerState::Closed && self.primary.state() == TimerState::Closed
    }
}
