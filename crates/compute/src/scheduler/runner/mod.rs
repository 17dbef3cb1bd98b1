//! Scheduler runner -- owns the worker pool and executes graph stages.
//!
//! Split into focused submodules:
//! - `core`: Scheduler struct, constructor, and accessor methods
//! - `execution`: bulk and join stages on the pool, inline lane execution

mod core;
mod execution;

pub use self::core::Scheduler;
pub(crate) use self::execution::run_lanes_inline;
