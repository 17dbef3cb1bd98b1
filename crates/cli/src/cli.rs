use clap::Parser;

/// Tiled parallel prefix-sum driver.
///
/// Fills a buffer with consecutive integers, scans it in place on a worker
/// pool, and checks the total against the closed form.
#[derive(Parser, Debug)]
#[command(name = "tilescan", version, about = "Tiled parallel prefix-sum driver")]
pub struct CliArgs {
    /// Path to a TOML config file (defaults come from TILESCAN_* env vars)
    #[arg(long, env = "TILESCAN_CONFIG")]
    pub config: Option<String>,

    /// Number of elements to scan
    #[arg(long)]
    pub len: Option<usize>,

    /// Elements per block
    #[arg(long)]
    pub block_size: Option<usize>,

    /// Blocks (lanes) per super-tile
    #[arg(long)]
    pub tile_count: Option<usize>,

    /// Worker threads (0 = available parallelism)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Number of timed scans
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Initial running total
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Fill with 0..len instead of 1..=len
    #[arg(long)]
    pub from_zero: bool,

    /// Drive everything on the calling thread instead of a worker pool
    #[arg(long)]
    pub inline: bool,

    /// Print the run summary as pretty JSON
    #[arg(long)]
    pub pretty: bool,
}
