//! Single-shot HTTP client for upstream services.
//!
//! # Responsibilities
//! - Issue exactly one request per call (no retries, no backoff)
//! - Capture the raw body text before any interpretation
//! - Report non-2xx as a normal reply, transport failures as errors

use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::config::TimeoutConfig;
use crate::http::X_REQUEST_ID;
use crate::upstream::UpstreamError;

/// One outbound call.
#[derive(Debug, Clone)]
pub struct UpstreamRequest<'a> {
    pub method: Method,
    pub url: Url,
    /// Headers configured for the target.
    pub headers: &'a HeaderMap,
    /// JSON body; `None` sends no body at all.
    pub body: Option<&'a Value>,
    /// Correlation ID forwarded as `x-request-id`.
    pub request_id: Option<&'a str>,
}

/// What came back from upstream, uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamReply {
    /// True for 2xx statuses.
    pub ok: bool,
    pub status: StatusCode,
    pub raw_text: String,
}

impl UpstreamReply {
    pub fn new(status: StatusCode, raw_text: impl Into<String>) -> Self {
        Self {
            ok: status.is_success(),
            status,
            raw_text: raw_text.into(),
        }
    }
}

/// Upstream client wrapper. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    /// Build a client with connect and whole-request timeouts.
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.upstream_secs))
            .build()
            .map_err(UpstreamError::Transport)?;
        Ok(Self { client })
    }

    /// Wrap an existing reqwest client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Perform the call and hand back the raw reply.
    pub async fn send(&self, request: UpstreamRequest<'_>) -> Result<UpstreamReply, UpstreamError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());

        if let Some(id) = request.request_id {
            if let Ok(value) = HeaderValue::from_str(id) {
                builder = builder.header(X_REQUEST_ID, value);
            }
        }

        if let Some(body) = request.body {
            let bytes = serde_json::to_vec(body).map_err(|e| {
                UpstreamError::InvalidTarget(format!("unserializable request body: {e}"))
            })?;
            builder = builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(bytes);
        }

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            has_body = request.body.is_some(),
            "Calling upstream"
        );

        let response = builder.send().await.map_err(UpstreamError::Transport)?;
        let status = response.status();
        let raw_text = response.text().await.map_err(UpstreamError::Body)?;

        Ok(UpstreamReply::new(status, raw_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_ok_tracks_status_class() {
        assert!(UpstreamReply::new(StatusCode::OK, "{}").ok);
        assert!(UpstreamReply::new(StatusCode::NO_CONTENT, "").ok);
        assert!(!UpstreamReply::new(StatusCode::NOT_FOUND, "nope").ok);
        assert!(!UpstreamReply::new(StatusCode::BAD_GATEWAY, "").ok);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = UpstreamClient::from_client(reqwest::Client::builder().no_proxy().build().unwrap());
        let headers = HeaderMap::new();
        let result = client
            .send(UpstreamRequest {
                method: Method::GET,
                url: Url::parse(&format!("http://{addr}/analytics")).unwrap(),
                headers: &headers,
                body: None,
                request_id: None,
            })
            .await;

        assert!(matches!(result, Err(UpstreamError::Transport(_))));
    }
}
