use anyhow::{anyhow, Result};
use serde::Serialize;
use tilescan_compute::SchedulerMetrics;
use tilescan_core::ScanConfig;

/// Outcome of one timed scan.
#[derive(Debug, Clone, Serialize)]
pub struct IterationReport {
    pub iteration: usize,
    pub total: u64,
    pub seconds: f64,
    pub ok: bool,
}

/// Summary printed at the end of a run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub config: ScanConfig,
    pub inline: bool,
    pub seed: u64,
    pub expected: u64,
    pub runs: Vec<IterationReport>,
    pub metrics: Option<SchedulerMetrics>,
}

impl RunReport {
    pub fn mismatches(&self) -> usize {
        self.runs.iter().filter(|r| !r.ok).count()
    }

    pub fn mean_seconds(&self) -> Option<f64> {
        if self.runs.is_empty() {
            return None;
        }
        Some(self.runs.iter().map(|r| r.seconds).sum::<f64>() / self.runs.len() as f64)
    }
}

/// `seed + first + (first + 1) + ... + (first + len - 1)`, or an error if the
/// total does not fit in a `u64`.
pub fn closed_form_total(seed: u64, len: usize, first: u64) -> Result<u64> {
    let n = len as u128;
    let first = first as u128;
    let series = n * first + n * n.saturating_sub(1) / 2;
    u64::try_from(series + seed as u128)
        .map_err(|_| anyhow!("total of {} elements starting at {} overflows u64", len, first))
}
