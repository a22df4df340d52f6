//! Process-local job counters
//!
//! Counts only; nothing here references a running job, so it cannot be
//! used to find or cancel one.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::Serialize;

use super::JobKind;

#[derive(Debug, Default)]
struct KindCounters {
    started: AtomicU64,
    active: AtomicU64,
    oracle_failures: AtomicU64,
    outcomes: Mutex<BTreeMap<&'static str, u64>>,
}

impl KindCounters {
    fn snapshot(&self) -> KindSnapshot {
        let outcomes = self
            .outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(outcome, count)| (outcome.to_string(), *count))
            .collect();

        KindSnapshot {
            started: self.started.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
            oracle_failures: self.oracle_failures.load(Ordering::Relaxed),
            outcomes,
        }
    }
}

/// Counters for all job kinds
#[derive(Debug, Default)]
pub struct JobMetrics {
    song_advance: KindCounters,
    resume_watch: KindCounters,
    device_acquisition: KindCounters,
}

/// Counters of one job kind at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KindSnapshot {
    pub started: u64,
    pub active: u64,
    pub oracle_failures: u64,
    pub outcomes: BTreeMap<String, u64>,
}

impl KindSnapshot {
    pub fn outcome(&self, outcome: &str) -> u64 {
        self.outcomes.get(outcome).copied().unwrap_or(0)
    }
}

/// Serializable view of [`JobMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobMetricsSnapshot {
    pub song_advance: KindSnapshot,
    pub resume_watch: KindSnapshot,
    pub device_acquisition: KindSnapshot,
}

impl JobMetricsSnapshot {
    pub fn kind(&self, kind: JobKind) -> &KindSnapshot {
        match kind {
            JobKind::SongAdvance => &self.song_advance,
            JobKind::ResumeWatch => &self.resume_watch,
            JobKind::DeviceAcquisition => &self.device_acquisition,
        }
    }
}

impl JobMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self, kind: JobKind) -> &KindCounters {
        match kind {
            JobKind::SongAdvance => &self.song_advance,
            JobKind::ResumeWatch => &self.resume_watch,
            JobKind::DeviceAcquisition => &self.device_acquisition,
        }
    }

    pub(crate) fn job_started(&self, kind: JobKind) {
        let counters = self.counters(kind);
        counters.started.fetch_add(1, Ordering::Relaxed);
        counters.active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a terminal outcome; call once per job
    pub(crate) fn job_finished(&self, kind: JobKind, outcome: &'static str) {
        let counters = self.counters(kind);
        counters.active.fetch_sub(1, Ordering::Relaxed);
        *counters
            .outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(outcome)
            .or_insert(0) += 1;
    }

    pub(crate) fn oracle_failure(&self, kind: JobKind) {
        self.counters(kind)
            .oracle_failures
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> JobMetricsSnapshot {
        JobMetricsSnapshot {
            song_advance: self.song_advance.snapshot(),
            resume_watch: self.resume_watch.snapshot(),
            device_acquisition: self.device_acquisition.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_and_finished_counts() {
        let metrics = JobMetrics::new();
        metrics.job_started(JobKind::SongAdvance);
        metrics.job_started(JobKind::SongAdvance);
        metrics.job_finished(JobKind::SongAdvance, "advanced");
        metrics.oracle_failure(JobKind::DeviceAcquisition);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.song_advance.started, 2);
        assert_eq!(snapshot.song_advance.active, 1);
        assert_eq!(snapshot.song_advance.outcome("advanced"), 1);
        assert_eq!(snapshot.song_advance.outcome("stopped"), 0);
        assert_eq!(snapshot.device_acquisition.oracle_failures, 1);
        assert_eq!(snapshot.resume_watch, KindSnapshot::default());
    }
}
