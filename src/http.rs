//! Shared HTTP response helpers for the tracker and wiki clients.

use crate::error::ApiError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build the HTTP client shared by both remote services.
///
/// Without a configured timeout the transport default applies.
pub fn build_client(timeout_seconds: Option<u64>) -> Result<reqwest::Client, ApiError> {
    let mut builder = reqwest::Client::builder().user_agent(concat!(
        "wikireporter/",
        env!("CARGO_PKG_VERSION")
    ));

    if let Some(secs) = timeout_seconds {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    Ok(builder.build()?)
}

/// Check a response for success.
///
/// Only `200 OK` counts as success; anything else becomes
/// [`ApiError::Status`] with the raw body attached.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if resp.status() != StatusCode::OK {
        return Err(ApiError::Status {
            status: resp.status().as_u16(),
            body: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

/// Decode a successful JSON response body.
pub async fn decode_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}
