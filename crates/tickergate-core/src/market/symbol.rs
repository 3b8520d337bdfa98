use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{GatewayError, Result};

/// Opaque ticker symbol. Only emptiness is checked; the provider decides
/// whether it exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(raw: &str) -> Result<Self> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(GatewayError::BadRequest("ticker must not be empty".into()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split a comma-separated list, dropping blank entries and duplicates
    /// while keeping first-seen order.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>> {
        let mut out: Vec<Self> = Vec::new();
        for part in raw.split(',') {
            let Ok(sym) = Self::parse(part) else { continue };
            if !out.contains(&sym) {
                out.push(sym);
            }
        }
        if out.is_empty() {
            return Err(GatewayError::BadRequest(
                "tickers must contain at least one symbol".into(),
            ));
        }
        Ok(out)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
