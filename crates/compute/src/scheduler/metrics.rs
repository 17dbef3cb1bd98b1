use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::types::StageKind;

/// Scheduler operational metrics, recorded for stages run on the pool.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerMetrics {
    /// Completed stages by kind.
    pub stages_executed: HashMap<StageKind, u64>,
    /// Total lanes run by completed bulk stages. Joins add none.
    pub lanes_executed: u64,
    /// Stages that ended with an error.
    pub stages_failed: u64,
    /// Bulk stages skipped because a stop was requested.
    pub stages_stopped: u64,
    /// Average stage duration by kind.
    pub avg_stage_duration: HashMap<StageKind, Duration>,
    /// Last completion time by kind.
    pub last_run: HashMap<StageKind, DateTime<Utc>>,
}

impl SchedulerMetrics {
    /// Record a completed stage.
    pub fn record_execution(&mut self, kind: StageKind, lanes: usize, duration: Duration) {
        *self.stages_executed.entry(kind).or_default() += 1;
        self.lanes_executed += lanes as u64;
        self.last_run.insert(kind, Utc::now());

        // Update rolling average duration
        let count = self.stages_executed[&kind];
        let prev_avg = self
            .avg_stage_duration
            .get(&kind)
            .copied()
            .unwrap_or_default();

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        let new_avg = if count == 1 {
            duration
        } else {
            let prev_nanos = prev_avg.as_nanos() as f64;
            let cur_nanos = duration.as_nanos() as f64;
            let avg_nanos = prev_nanos + (cur_nanos - prev_nanos) / count as f64;
            Duration::from_nanos(avg_nanos as u64)
        };

        self.avg_stage_duration.insert(kind, new_avg);
    }

    pub fn record_failure(&mut self) {
        self.stages_failed += 1;
    }

    pub fn record_stopped(&mut self) {
        self.stages_stopped += 1;
    }

    pub fn executed(&self, kind: StageKind) -> u64 {
        self.stages_executed.get(&kind).copied().unwrap_or(0)
    }
}
