//! Multipart image posting.
//!
//! # Responsibilities
//! - Decode a data-URI image into a file part
//! - Submit file + caption to the posting microservice in one request
//! - Turn every failure into an error whose message can be shown as-is

use std::time::Duration;

use axum::http::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::validation::check_http_url;
use crate::config::{GatewayConfig, PostingConfig, TimeoutConfig};
use crate::posting::data_uri::{DataUri, DataUriError};

/// Message used when the service gives no usable error detail.
pub const GENERIC_FAILURE: &str = "Failed to post to Instagram";

/// Posting failures. `Display` is the user-facing message.
#[derive(Debug, Error)]
pub enum PostingError {
    #[error("{0}")]
    InvalidDataUri(#[from] DataUriError),

    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    InvalidResponse(String),

    #[error("Invalid posting endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Client for the posting microservice.
#[derive(Debug, Clone)]
pub struct PostingClient {
    client: reqwest::Client,
    url: Url,
}

impl PostingClient {
    pub fn new(config: &PostingConfig, timeouts: &TimeoutConfig) -> Result<Self, PostingError> {
        let url = check_http_url(&config.url).map_err(PostingError::InvalidEndpoint)?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.upstream_secs))
            .build()
            .map_err(|e| PostingError::Transport(e.to_string()))?;
        Ok(Self { client, url })
    }

    /// Client for the `[posting]` endpoint using the configured timeouts.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, PostingError> {
        Self::new(&config.posting, &config.timeouts)
    }

    pub fn with_client(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Upload `data_uri` as the `file` part with a `caption` field.
    pub async fn post_image(&self, data_uri: &str, caption: &str) -> Result<Value, PostingError> {
        let image = DataUri::parse(data_uri)?;
        let file_name = format!("image.{}", image.extension());
        let DataUri { mime, bytes } = image;
        let size = bytes.len();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(&mime)
            .map_err(|_| DataUriError::InvalidMime(mime.clone()))?;
        let form = Form::new()
            .part("file", part)
            .text("caption", caption.to_string());

        tracing::info!(url = %self.url, mime = %mime, size, "Posting image");

        let response = self
            .client
            .post(self.url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Posting service unreachable");
                PostingError::Transport(format!("Could not reach posting service: {e}"))
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PostingError::Transport(format!("Failed to read posting response: {e}")))?;

        if !status.is_success() {
            let message = error_detail(&text).unwrap_or_else(|| GENERIC_FAILURE.to_string());
            tracing::warn!(status = %status, message = %message, "Posting service rejected upload");
            return Err(PostingError::Rejected { status, message });
        }

        serde_json::from_str(&text).map_err(|e| {
            PostingError::InvalidResponse(format!("Posting service returned invalid JSON: {e}"))
        })
    }
}

/// The `detail` field of a JSON error body, stringified if not a string.
fn error_detail(text: &str) -> Option<String> {
    let body: Value = serde_json::from_str(text).ok()?;
    match body.get("detail")? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
