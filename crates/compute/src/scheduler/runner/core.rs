use std::sync::{Arc, RwLock};

use tracing::info;

use crate::scheduler::metrics::SchedulerMetrics;
use crate::scheduler::outcome::ExecError;
use crate::scheduler::types::SchedulerConfig;

/// Handle to a worker pool. Cloning is cheap and shares the pool.
///
/// Deferred values placed on a scheduler with [`AsyncValue::on`] run their
/// bulk lanes and joins on this pool.
///
/// [`AsyncValue::on`]: crate::scheduler::AsyncValue::on
#[derive(Debug, Clone)]
pub struct Scheduler {
    pub(super) config: SchedulerConfig,
    pub(super) pool: Arc<rayon::ThreadPool>,
    /// Scheduler metrics.
    pub(super) metrics: Arc<RwLock<SchedulerMetrics>>,
}

impl Scheduler {
    /// Build a scheduler and its thread pool.
    pub fn new(config: SchedulerConfig) -> Result<Self, ExecError> {
        let num_workers = config.resolved_worker_threads();
        let prefix = config.thread_name_prefix.clone();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(move |i| format!("{}-{}", prefix, i))
            .build()
            .map_err(|e| ExecError::PoolBuild(e.to_string()))?;

        info!("Scheduler starting with {} workers", num_workers);

        Ok(Self {
            config,
            pool: Arc::new(pool),
            metrics: Arc::new(RwLock::new(SchedulerMetrics::default())),
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Number of threads actually running in the pool.
    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Get a snapshot of the current scheduler metrics.
    pub fn metrics(&self) -> SchedulerMetrics {
        match self.metrics.read() {
            Ok(m) => m.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Get an Arc to the metrics (for external reads without cloning).
    pub fn metrics_handle(&self) -> Arc<RwLock<SchedulerMetrics>> {
        Arc::clone(&self.metrics)
    }
}
