//! tickergate core: transport-agnostic market data types and the error
//! taxonomy shared by the gateway and its upstream adapters.
//!
//! Nothing here performs I/O. Types validate on construction so the gateway
//! only ever hands finite numbers and non-empty symbols to clients.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! All fallible paths surface as `GatewayError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod market;

/// Shared result type.
pub use error::{ErrorKind, GatewayError, Result};
