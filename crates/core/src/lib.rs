pub mod config;
pub mod error;

pub use config::{load_dotenv, super_tile_len, ScanConfig};
pub use error::*;
