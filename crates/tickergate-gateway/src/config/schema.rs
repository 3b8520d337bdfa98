use std::net::SocketAddr;

use serde::Deserialize;
use tickergate_core::error::{GatewayError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub upstream: UpstreamSection,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            gateway: GatewaySection::default(),
            upstream: UpstreamSection::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(GatewayError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.gateway.validate()?;
        self.upstream.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            GatewayError::Config(format!("gateway.listen must be a valid SocketAddr: {e}"))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Visited once before fetching a crumb so the provider sets its session cookie.
    #[serde(default = "default_session_url")]
    pub session_url: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_url: default_session_url(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl UpstreamSection {
    pub fn validate(&self) -> Result<()> {
        for (field, url) in [("base_url", &self.base_url), ("session_url", &self.session_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(GatewayError::Config(format!(
                    "upstream.{field} must start with http:// or https://"
                )));
            }
        }
        if !(100..=120_000).contains(&self.timeout_ms) {
            return Err(GatewayError::Config(
                "upstream.timeout_ms must be between 100 and 120000".into(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(GatewayError::Config("upstream.user_agent must not be empty".into()));
        }
        Ok(())
    }
}

fn default_version() -> u32 {
    1
}
fn default_listen() -> String {
    "0.0.0.0:8000".into()
}
fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".into()
}
fn default_session_url() -> String {
    "https://fc.yahoo.com".into()
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_user_agent() -> String {
    concat!("tickergate/", env!("CARGO_PKG_VERSION")).into()
}
