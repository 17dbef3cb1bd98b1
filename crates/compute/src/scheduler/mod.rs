//! Deferred-value engine: a lazily built task graph driven to completion
//! on a rayon worker pool.
//!
//! An [`AsyncValue`] is a node that has not run yet. Combinators (`map`,
//! `join`, `bulk`, `on`, `chain`) build larger graphs without executing
//! anything; [`sync_wait`] drives a graph on the calling thread and reports
//! an [`Outcome`]: a value, a propagated [`ExecError`], or a cooperative stop.

pub mod metrics;
pub mod outcome;
pub mod runner;
pub mod stop;
pub mod types;
pub mod value;
pub mod wait;

pub use metrics::SchedulerMetrics;
pub use outcome::{ExecError, Outcome};
pub use runner::Scheduler;
pub use stop::{StopSource, StopToken};
pub use types::{SchedulerConfig, StageKind};
pub use value::{AsyncValue, ChainLink, ExecContext};
pub use wait::{sync_wait, sync_wait_with};
