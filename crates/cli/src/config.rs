use anyhow::{Context, Result};
use tilescan_core::{load_dotenv, ScanConfig};
use tracing::debug;

use crate::cli::CliArgs;

/// Resolve the run config: file (or environment), then command-line overrides.
pub fn resolve(args: &CliArgs) -> Result<ScanConfig> {
    let mut config = match &args.config {
        Some(path) => {
            debug!(path = %path, "Loading config file");
            ScanConfig::from_file(path).with_context(|| format!("failed to load {}", path))?
        }
        None => {
            load_dotenv();
            ScanConfig::from_env()
        }
    };

    if let Some(len) = args.len {
        config.len = len;
    }
    if let Some(block_size) = args.block_size {
        config.block_size = block_size;
    }
    if let Some(tile_count) = args.tile_count {
        config.tile_count = tile_count;
    }
    if let Some(workers) = args.workers {
        config.worker_threads = workers;
    }
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }

    config.validate().context("invalid tiling")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;

    use super::*;

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn flags_override_file_values() {
        let file = config_file("len = 10\nblock_size = 2\ntile_count = 2\n");
        let args = CliArgs::parse_from([
            "tilescan",
            "--config",
            file.path().to_str().unwrap(),
            "--tile-count",
            "4",
        ]);
        let config = resolve(&args).unwrap();

        assert_eq!(config.len, 10);
        assert_eq!(config.block_size, 2);
        assert_eq!(config.tile_count, 4);
    }

    #[test]
    fn zero_block_size_is_rejected() {
        let file = config_file("block_size = 0\n");
        let args = CliArgs::parse_from(["tilescan", "--config", file.path().to_str().unwrap()]);
        assert!(resolve(&args).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let args = CliArgs::parse_from(["tilescan", "--config", "/nonexistent/tilescan.toml"]);
        let err = resolve(&args).unwrap_err();
        assert!(err.to_string().contains("failed to load"));
    }
}
