//! Request extractors whose rejections render as `ApiError`.
//!
//! axum's own `Path`/`Query` rejections answer in plain text; these wrappers
//! keep every failure on the `{"detail": ...}` shape and tagged with a kind.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query},
    http::{request::Parts, StatusCode},
};
use serde::de::DeserializeOwned;

use tickergate_core::error::GatewayError;

use crate::error::ApiError;

/// The `:ticker` path parameter, percent-decoded.
#[derive(Debug)]
pub struct Ticker(pub String);

/// Query string deserialized into `T`.
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

fn rejected(status: StatusCode, text: String) -> ApiError {
    if status.is_client_error() {
        ApiError(GatewayError::BadRequest(text))
    } else {
        ApiError(GatewayError::Internal(text))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Ticker
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<String>::from_request_parts(parts, state)
            .await
            .map(|Path(t)| Ticker(t))
            .map_err(|e| rejected(e.status(), e.body_text()))
    }
}

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(q)| QueryParams(q))
            .map_err(|e| rejected(e.status(), e.body_text()))
    }
}
