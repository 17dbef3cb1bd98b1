//! Tiled, two-pass parallel inclusive scan built on deferred values.
//!
//! - `combine`: associative operators (`Sum`, `Product`, closures)
//! - `partition`: balanced block ranges for lanes
//! - `view`: input/output views, possibly aliased
//! - `partials`: per-super-tile partial-sums buffer
//! - `pipeline`: `TiledScanPipeline`, the tiling loop and seed chaining
//! - `sequential`: reference scans
//! - `fill`: parallel fill used to prepare inputs

mod combine;
mod fill;
mod partials;
mod partition;
mod pipeline;
mod sequential;
mod view;

pub use combine::{Combine, Product, Sum};
pub use fill::tabulate;
pub use partition::block_range;
pub use pipeline::{async_inclusive_scan, TiledScanPipeline};
pub use sequential::{inclusive_scan, inclusive_scan_in_place};
pub use view::ScanBuffers;
