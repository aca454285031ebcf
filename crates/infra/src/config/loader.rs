//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from a TOML file
//!
//! ## Environment Variables
//! - `FIELDLINE_DB_PATH`: Database file path
//! - `FIELDLINE_DB_POOL_SIZE`: Connection pool size (optional, default 4)
//!
//! ## File Locations
//! The loader probes `./fieldline.toml` and `./config.toml` in the current
//! working directory.

use std::path::PathBuf;

use fieldline_domain::{FieldlineError, Result};

use super::{DatabaseConfig, FieldlineConfig};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns [`FieldlineError::Config`] if configuration cannot be loaded
/// from either source.
pub fn load() -> Result<FieldlineConfig> {
    // .env files are a convenience for local development; absence is fine.
    let _ = dotenvy::dotenv();

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns [`FieldlineError::Config`] if `FIELDLINE_DB_PATH` is missing or
/// `FIELDLINE_DB_POOL_SIZE` is not a number.
pub fn load_from_env() -> Result<FieldlineConfig> {
    let path = std::env::var("FIELDLINE_DB_PATH")
        .map_err(|_| FieldlineError::Config("FIELDLINE_DB_PATH is not set".into()))?;
    let pool_size = match std::env::var("FIELDLINE_DB_POOL_SIZE") {
        Ok(value) => value
            .parse::<u32>()
            .map_err(|e| FieldlineError::Config(format!("Invalid pool size: {e}")))?,
        Err(_) => 4,
    };

    Ok(FieldlineConfig { database: DatabaseConfig { path, pool_size } })
}

/// Load configuration from a TOML file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns [`FieldlineError::Config`] if no file is found or the file does
/// not parse.
pub fn load_from_file(path: Option<PathBuf>) -> Result<FieldlineConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(FieldlineError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            FieldlineError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| FieldlineError::Config(format!("Failed to read config file: {e}")))?;

    toml::from_str(&contents)
        .map_err(|e| FieldlineError::Config(format!("Failed to parse config file: {e}")))
}

fn probe_config_paths() -> Option<PathBuf> {
    ["fieldline.toml", "config.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists())
}
