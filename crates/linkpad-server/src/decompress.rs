#![forbid(unsafe_code)]

//! `GET /api/decompress?data=<token>`: inflate a share token for clients
//! that cannot gunzip locally.
//!
//! Returns the raw state buffer as `application/octet-stream`, byte for byte
//! what `linkpad_transfer::inflate_token` yields in-process.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use linkpad_transfer::inflate_token;

use crate::config::ServerConfig;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct DecompressQuery {
    pub data: Option<String>,
}

pub async fn decompress(
    State(config): State<Arc<ServerConfig>>,
    Query(query): Query<DecompressQuery>,
) -> Result<Response, ApiError> {
    let token = query
        .data
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidRequest("missing `data` query parameter".to_owned()))?;
    if token.len() > config.max_token_len {
        return Err(ApiError::InvalidRequest(format!(
            "token is {} bytes, limit is {}",
            token.len(),
            config.max_token_len
        )));
    }

    let limit = config.max_inflated_len;
    let token_len = token.len();
    let inflated = tokio::task::spawn_blocking(move || inflate_token(&token, limit))
        .await
        .map_err(|err| ApiError::DecompressionFailed(format!("inflate task failed: {err}")))??;

    tracing::debug!(token_len, inflated_len = inflated.len(), "token inflated");
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        inflated,
    )
        .into_response())
}

pub async fn health() -> &'static str {
    "ok"
}
