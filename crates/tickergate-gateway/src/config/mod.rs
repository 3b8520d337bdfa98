//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use tickergate_core::error::{GatewayError, Result};

pub use schema::{GatewayConfig, GatewaySection, UpstreamSection};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "TICKERGATE_CONFIG";
/// Environment variable overriding `upstream.base_url`.
pub const UPSTREAM_URL_ENV: &str = "TICKERGATE_UPSTREAM_URL";

const DEFAULT_CONFIG_PATH: &str = "tickergate.yaml";

pub fn load_from_file(path: impl AsRef<Path>) -> Result<GatewayConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .map_err(|e| GatewayError::Config(format!("read {} failed: {e}", path.display())))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| GatewayError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve config from the process environment.
///
/// A missing file is not an error: every section has defaults.
pub fn load_from_env() -> Result<GatewayConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut cfg = if Path::new(&path).exists() {
        load_from_file(&path)?
    } else {
        tracing::info!(%path, "config file not found, using defaults");
        GatewayConfig::default()
    };

    if let Ok(url) = std::env::var(UPSTREAM_URL_ENV) {
        cfg.upstream.base_url = url;
        cfg.validate()?;
    }
    Ok(cfg)
}
