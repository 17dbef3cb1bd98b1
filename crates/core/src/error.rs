use thiserror::Error;

/// Errors raised before any scan work is scheduled.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("block_size must be at least 1")]
    ZeroBlockSize,

    #[error("tile_count must be at least 1")]
    ZeroTileCount,

    #[error("super-tile of {tile_count} x {block_size} elements overflows usize")]
    TileOverflow { block_size: usize, tile_count: usize },

    #[error("output length {output} does not match input length {input}")]
    LengthMismatch { input: usize, output: usize },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
