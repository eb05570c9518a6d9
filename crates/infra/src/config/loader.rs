//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Searches multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `TRADELINK_TOKEN`: Auth token (required)
//! - `TRADELINK_AUTH_TYPE`: `OAUTH` or `AUTHNAUTH` (required)
//! - `TRADELINK_ENV`: `sandbox` or `production` (required)
//! - `TRADELINK_TOKEN_EXPIRES_AT`: Token expiry, RFC 3339
//! - `TRADELINK_CLIENT_ID`, `TRADELINK_DEV_ID`, `TRADELINK_CERT_ID`: App
//!   credential for the `AUTHNAUTH` scheme
//! - `TRADELINK_SHOPPING_APP_ID`: App id for Shopping API calls
//!
//! ## File Locations
//! The loader searches the following paths (in order):
//! 1. `./tradelink.json` or `./tradelink.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names in the parent and grandparent directories
//! 4. Relative to executable location
//!
//! Values are only parsed here. The environment and auth type are validated
//! when a session is built from the configuration.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tradelink_domain::{ApiError, AppCredential, ClientConfig, Result};

use crate::errors::InfraError;

const CONFIG_FILE_NAMES: [&str; 4] =
    ["tradelink.json", "tradelink.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `ApiError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<ClientConfig> {
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
/// Returns `ApiError::Config` if required variables are missing or the
/// expiry is not a valid RFC 3339 timestamp.
pub fn load_from_env() -> Result<ClientConfig> {
    let token = env_var("TRADELINK_TOKEN")?;
    let auth_type = env_var("TRADELINK_AUTH_TYPE")?;
    let env = env_var("TRADELINK_ENV")?;

    let expires_at = optional_env_var("TRADELINK_TOKEN_EXPIRES_AT")
        .map(|value| parse_expiry(&value))
        .transpose()?;

    let client_id = optional_env_var("TRADELINK_CLIENT_ID");
    let dev_id = optional_env_var("TRADELINK_DEV_ID");
    let cert_id = optional_env_var("TRADELINK_CERT_ID");
    let app_config = if client_id.is_some() || dev_id.is_some() || cert_id.is_some() {
        Some(AppCredential::new(
            client_id.unwrap_or_default(),
            dev_id.unwrap_or_default(),
            cert_id.unwrap_or_default(),
        ))
    } else {
        None
    };

    Ok(ClientConfig {
        token,
        auth_type,
        expires_at,
        env,
        app_config,
        shopping_app_id: optional_env_var("TRADELINK_SHOPPING_APP_ID"),
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, searches multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ApiError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ApiError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => search_config_paths().ok_or_else(|| {
            ApiError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(InfraError::from)?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `ApiError::Config` if format is invalid or parsing fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| ApiError::from(InfraError::from(e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ApiError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ApiError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Search multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn search_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_around(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_around(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_around(dir: &Path) -> Vec<PathBuf> {
    ["", "..", "../.."]
        .iter()
        .flat_map(|prefix| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(prefix).join(name)))
        .collect()
}

fn parse_expiry(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| ApiError::Config(format!("Invalid token expiry `{value}`: {e}")))
}

/// Get required environment variable
///
/// # Errors
/// Returns `ApiError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| ApiError::Config(format!("Missing required environment variable: {key}")))
}

fn optional_env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
