//! Shared error type across tickergate crates.

use thiserror::Error;

/// Stable failure category, used as the `error_type` metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Upstream returned no rows / unknown expiration date.
    NotFound,
    /// Malformed input.
    BadRequest,
    /// Transport or provider-side failure.
    Upstream,
    /// Invalid configuration.
    Config,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// String representation used in metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        }
    }

    /// HTTP status code for this kind.
    ///
    /// Upstream failures share 400 with bad input: callers see one coarse
    /// client error, metrics still tell them apart.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::BadRequest | ErrorKind::Upstream => 400,
            ErrorKind::Config | ErrorKind::Internal => 500,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Upstream(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::NotFound(_) => ErrorKind::NotFound,
            GatewayError::BadRequest(_) => ErrorKind::BadRequest,
            GatewayError::Upstream(_) => ErrorKind::Upstream,
            GatewayError::Config(_) => ErrorKind::Config,
            GatewayError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Prefix the message, keeping the kind.
    pub fn with_context(self, prefix: &str) -> Self {
        match self {
            GatewayError::NotFound(m) => GatewayError::NotFound(format!("{prefix}{m}")),
            GatewayError::BadRequest(m) => GatewayError::BadRequest(format!("{prefix}{m}")),
            GatewayError::Upstream(m) => GatewayError::Upstream(format!("{prefix}{m}")),
            GatewayError::Config(m) => GatewayError::Config(format!("{prefix}{m}")),
            GatewayError::Internal(m) => GatewayError::Internal(format!("{prefix}{m}")),
        }
    }
}
