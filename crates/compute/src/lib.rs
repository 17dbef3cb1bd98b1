pub mod algorithms;
pub mod scheduler;

pub use algorithms::scan::{
    async_inclusive_scan, inclusive_scan, Combine, Product, ScanBuffers, Sum, TiledScanPipeline,
};
pub use scheduler::{
    sync_wait, sync_wait_with, AsyncValue, ExecError, Outcome, Scheduler, SchedulerConfig,
    SchedulerMetrics, StopSource, StopToken,
};
pub use tilescan_core::{ScanConfig, ScanError};
