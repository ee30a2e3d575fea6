//! Bearer key authentication.
//!
//! When the server is started with an API key, every route except
//! `/health` requires `Authorization: Bearer <key>`.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::routes::ErrorResponse;

#[derive(Debug, Clone)]
pub struct ApiKeyConfig {
    key_bytes: Vec<u8>,
}

impl ApiKeyConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key_bytes: key.into().into_bytes(),
        }
    }

    /// Compares every byte regardless of where the first mismatch is.
    fn verify(&self, provided: &[u8]) -> bool {
        if self.key_bytes.len() != provided.len() {
            return false;
        }
        let diff = self
            .key_bytes
            .iter()
            .zip(provided)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        diff == 0
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Middleware rejecting requests without the configured key with 401.
pub async fn require_api_key(
    State(config): State<ApiKeyConfig>,
    request: Request,
    next: Next,
) -> Response {
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    match bearer_token(request.headers()) {
        Some(token) if config.verify(token.as_bytes()) => next.run(request).await,
        Some(_) => {
            warn!(path = %request.uri().path(), "Rejected request with invalid API key");
            ErrorResponse::unauthorized("Invalid API key", "INVALID_API_KEY").into_response()
        }
        None => {
            warn!(path = %request.uri().path(), "Rejected request without API key");
            ErrorResponse::unauthorized(
                "Missing Authorization header. Use: Authorization: Bearer <key>",
                "MISSING_API_KEY",
            )
            .into_response()
        }
    }
}
