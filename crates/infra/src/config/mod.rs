//! Configuration types and loading

pub mod loader;

use serde::{Deserialize, Serialize};

pub use loader::{load, load_from_env, load_from_file};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldlineConfig {
    pub database: DatabaseConfig,
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: String,
    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_pool_size() -> u32 {
    4
}
