use serde::{Deserialize, Serialize};

use tilescan_core::ScanConfig;

/// Kind of stage the scheduler executes on its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Fixed-width data-parallel stage over lane indices.
    Bulk,
    /// Two deferred values progressing concurrently.
    Join,
}

/// Scheduler configuration, typically parsed from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of worker threads. 0 = num_cpus.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Prefix for worker thread names.
    #[serde(default = "default_thread_name_prefix")]
    pub thread_name_prefix: String,
}

fn default_worker_threads() -> usize { 0 }
fn default_thread_name_prefix() -> String { "tilescan-worker".to_string() }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            thread_name_prefix: default_thread_name_prefix(),
        }
    }
}

impl SchedulerConfig {
    pub fn with_workers(worker_threads: usize) -> Self {
        Self {
            worker_threads,
            ..Self::default()
        }
    }

    /// Resolve worker thread count (0 means use available parallelism).
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.worker_threads
        }
    }
}

impl From<&ScanConfig> for SchedulerConfig {
    fn from(config: &ScanConfig) -> Self {
        Self::with_workers(config.worker_threads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_config_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.worker_threads, 0);
        assert_eq!(config.thread_name_prefix, "tilescan-worker");
    }

    #[test]
    fn resolved_worker_threads() {
        let mut config = SchedulerConfig::default();
        // 0 means auto-detect
        assert!(config.resolved_worker_threads() > 0);

        config.worker_threads = 8;
        assert_eq!(config.resolved_worker_threads(), 8);
    }

    #[test]
    fn from_scan_config() {
        let scan = ScanConfig {
            worker_threads: 3,
            ..ScanConfig::default()
        };
        let config = SchedulerConfig::from(&scan);
        assert_eq!(config.worker_threads, 3);
    }

    #[test]
    fn stage_kind_serializes_snake_case() {
        let json = serde_json::to_string(&StageKind::Bulk).unwrap();
        assert_eq!(json, "\"bulk\"");
    }
}
