use std::env;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_parse<T: FromStr>(profile: &str, key: &str, default: T) -> T {
    match profiled_env_opt(profile, key) {
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, "ignoring unparsable config value");
                default
            }
        },
        None => default,
    }
}

/// Number of elements in one super-tile, rejecting zero sizes and overflow.
pub fn super_tile_len(block_size: usize, tile_count: usize) -> Result<usize, ScanError> {
    if block_size == 0 {
        return Err(ScanError::ZeroBlockSize);
    }
    if tile_count == 0 {
        return Err(ScanError::ZeroTileCount);
    }
    block_size
        .checked_mul(tile_count)
        .ok_or(ScanError::TileOverflow { block_size, tile_count })
}

// ── Scan config ───────────────────────────────────────────────

/// Tiling and driver settings, typically parsed from TOML or the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Elements per block (one lane's share of a super-tile).
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Lanes per bulk stage; blocks per super-tile.
    #[serde(default = "default_tile_count")]
    pub tile_count: usize,
    /// Worker threads for the scheduler. 0 = available parallelism.
    #[serde(default)]
    pub worker_threads: usize,
    /// Input length used by the driver.
    #[serde(default = "default_len")]
    pub len: usize,
    /// Repetitions of the driver's scan.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
}

fn default_block_size() -> usize { 4096 }
fn default_tile_count() -> usize { 8 }
fn default_len() -> usize { 100_000 }
fn default_iterations() -> usize { 1 }

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            tile_count: default_tile_count(),
            worker_threads: 0,
            len: default_len(),
            iterations: default_iterations(),
        }
    }
}

impl ScanConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `TILESCAN_PROFILE`. When set (e.g. `BENCH`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("TILESCAN_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            block_size: profiled_env_parse(p, "TILESCAN_BLOCK_SIZE", default_block_size()),
            tile_count: profiled_env_parse(p, "TILESCAN_TILE_COUNT", default_tile_count()),
            worker_threads: profiled_env_parse(p, "TILESCAN_WORKERS", 0),
            len: profiled_env_parse(p, "TILESCAN_LEN", default_len()),
            iterations: profiled_env_parse(p, "TILESCAN_ITERATIONS", default_iterations()),
        }
    }

    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ScanError> {
        toml::from_str(raw).map_err(|e| ScanError::Config(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    /// Check the tiling parameters without building a pipeline.
    pub fn validate(&self) -> Result<(), ScanError> {
        self.super_tile_len().map(|_| ())
    }

    pub fn super_tile_len(&self) -> Result<usize, ScanError> {
        super_tile_len(self.block_size, self.tile_count)
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Scan config:");
        tracing::info!(
            "  tiling:   block_size={}, tile_count={}",
            self.block_size,
            self.tile_count
        );
        if self.worker_threads == 0 {
            tracing::info!("  workers:  auto");
        } else {
            tracing::info!("  workers:  {}", self.worker_threads);
        }
        tracing::info!("  driver:   len={}, iterations={}", self.len, self.iterations);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.block_size, 4096);
        assert_eq!(config.tile_count, 8);
        assert_eq!(config.worker_threads, 0);
        assert_eq!(config.len, 100_000);
        assert_eq!(config.iterations, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn super_tile_rejects_zero_sizes() {
        assert!(matches!(super_tile_len(0, 8), Err(ScanError::ZeroBlockSize)));
        assert!(matches!(super_tile_len(16, 0), Err(ScanError::ZeroTileCount)));
        assert_eq!(super_tile_len(1000, 8).unwrap(), 8000);
    }

    #[test]
    fn super_tile_rejects_overflow() {
        let err = super_tile_len(usize::MAX, 2).unwrap_err();
        assert!(matches!(err, ScanError::TileOverflow { tile_count: 2, .. }));
    }

    #[test]
    fn toml_partial_document_fills_defaults() {
        let config = ScanConfig::from_toml_str("block_size = 1000\ntile_count = 4\n").unwrap();
        assert_eq!(config.block_size, 1000);
        assert_eq!(config.tile_count, 4);
        assert_eq!(config.len, 100_000);
    }

    #[test]
    fn toml_rejects_wrong_types() {
        let err = ScanConfig::from_toml_str("block_size = \"big\"").unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "len = 500\niterations = 3\nworker_threads = 2").unwrap();

        let config = ScanConfig::from_file(file.path()).unwrap();
        assert_eq!(config.len, 500);
        assert_eq!(config.iterations, 3);
        assert_eq!(config.worker_threads, 2);
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ScanConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ScanError::Io(_)));
    }

    #[test]
    fn profiled_env_prefers_prefixed_key() {
        // Only test in this crate that touches the process environment.
        env::set_var("TILESCAN_TILE_COUNT", "16");
        env::set_var("QA_TILESCAN_TILE_COUNT", "32");
        env::set_var("QA_TILESCAN_BLOCK_SIZE", "not-a-number");

        let base = ScanConfig::for_profile("");
        let qa = ScanConfig::for_profile("qa");

        env::remove_var("TILESCAN_TILE_COUNT");
        env::remove_var("QA_TILESCAN_TILE_COUNT");
        env::remove_var("QA_TILESCAN_BLOCK_SIZE");

        assert_eq!(base.tile_count, 16);
        assert_eq!(qa.tile_count, 32);
        assert_eq!(qa.block_size, 4096);
    }
}
