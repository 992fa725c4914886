//! Generic forwarding handler.
//!
//! Every operation runs the same single pass:
//!
//! ```text
//! RECEIVED ─┬─▶ REJECTED (400, no upstream call) ────────────────┐
//!           └─▶ VALIDATED ─▶ FORWARDED ─┬─▶ UPSTREAM_OK    (200) ├─▶ RESPONDED
//!                                       ├─▶ UPSTREAM_ERROR (passthrough)
//!                                       └─▶ TRANSPORT_ERROR (500)
//! ```

use std::fmt;

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::validation::check_http_url;
use crate::config::UpstreamTarget;
use crate::gateway::envelope::{normalize_body, Envelope, EMPTY_BODY_FALLBACK};
use crate::gateway::operation::{Forward, Inbound, Operation};
use crate::upstream::{UpstreamClient, UpstreamError, UpstreamRequest};

/// Message for inbound bodies that are not JSON.
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON body";

/// Error binding an operation to its configured target.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("operation '{operation}': {message}")]
    InvalidUrl { operation: String, message: String },

    #[error("operation '{operation}': invalid header '{header}'")]
    InvalidHeader { operation: String, header: String },
}

/// Why an inbound request was refused before forwarding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("{}", INVALID_JSON_MESSAGE)]
    InvalidJson,

    #[error("{0}")]
    MissingFields(&'static str),
}

/// Terminal state of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Rejected,
    UpstreamOk,
    UpstreamError,
    TransportError,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Rejected => "rejected",
            Outcome::UpstreamOk => "upstream_ok",
            Outcome::UpstreamError => "upstream_error",
            Outcome::TransportError => "transport_error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation joined with its upstream target.
#[derive(Debug, Clone)]
pub struct BoundOperation {
    pub operation: Operation,
    pub url: Url,
    pub headers: HeaderMap,
}

impl BoundOperation {
    pub fn bind(operation: Operation, target: &UpstreamTarget) -> Result<Self, BindError> {
        let url = check_http_url(&target.url).map_err(|message| BindError::InvalidUrl {
            operation: operation.name.to_string(),
            message,
        })?;

        let mut headers = HeaderMap::new();
        for (name, value) in &target.headers {
            let invalid = || BindError::InvalidHeader {
                operation: operation.name.to_string(),
                header: name.clone(),
            };
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            headers.insert(name, value);
        }

        Ok(Self {
            operation,
            url,
            headers,
        })
    }

    /// Target URL, with `param` appended as an encoded path segment.
    pub fn upstream_url(&self, param: Option<&str>) -> Result<Url, UpstreamError> {
        let Some(param) = param else {
            return Ok(self.url.clone());
        };
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidTarget(format!("'{}' cannot take a path", self.url)))?
            .pop_if_empty()
            .push(param);
        Ok(url)
    }

    /// URL without credentials, query or fragment, for display.
    pub fn display_url(&self) -> String {
        let mut url = self.url.clone();
        let _ = url.set_username("");
        let _ = url.set_password(None);
        url.set_query(None);
        url.set_fragment(None);
        url.to_string()
    }
}

/// The inbound side of one request.
#[derive(Debug, Clone, Copy, Default)]
pub struct InboundRequest<'a> {
    pub path_param: Option<&'a str>,
    pub body: &'a [u8],
    pub request_id: Option<&'a str>,
}

/// Validate the inbound request and produce the JSON payload, if any.
pub fn validate(operation: &Operation, inbound: &InboundRequest<'_>) -> Result<Option<Value>, RejectReason> {
    match operation.inbound {
        Inbound::Empty => Ok(None),
        Inbound::PathParam => match inbound.path_param {
            Some(param) if !param.trim().is_empty() => Ok(None),
            _ => Err(RejectReason::MissingFields(operation.missing_fields_message)),
        },
        Inbound::Json { required } => {
            let payload: Value =
                serde_json::from_slice(inbound.body).map_err(|_| RejectReason::InvalidJson)?;
            if required.iter().any(|field| is_missing(&payload, field)) {
                return Err(RejectReason::MissingFields(operation.missing_fields_message));
            }
            Ok(Some(payload))
        }
    }
}

/// Absent, `null` and blank strings all count as missing.
fn is_missing(payload: &Value, field: &str) -> bool {
    match payload.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Run one request through `bound` and build the envelope for the browser.
pub async fn forward(
    client: &UpstreamClient,
    bound: &BoundOperation,
    inbound: InboundRequest<'_>,
) -> (Envelope, Outcome) {
    let operation = &bound.operation;
    let request_id = inbound.request_id.unwrap_or("unknown");

    let payload = match validate(operation, &inbound) {
        Ok(payload) => payload,
        Err(reason) => {
            tracing::warn!(
                request_id = %request_id,
                operation = operation.name,
                reason = %reason,
                "Rejected inbound request"
            );
            return (
                Envelope::error(StatusCode::BAD_REQUEST, &reason.to_string()),
                Outcome::Rejected,
            );
        }
    };

    let param = match operation.inbound {
        Inbound::PathParam => inbound.path_param,
        Inbound::Json { .. } | Inbound::Empty => None,
    };
    let body = match operation.forward {
        Forward::Json => payload.as_ref(),
        Forward::Nothing => None,
    };

    let result = match bound.upstream_url(param) {
        Ok(url) => {
            client
                .send(UpstreamRequest {
                    method: operation.method.clone(),
                    url,
                    headers: &bound.headers,
                    body,
                    request_id: inbound.request_id,
                })
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(reply) if reply.ok => {
            let body = normalize_body(&reply.raw_text, EMPTY_BODY_FALLBACK);
            (Envelope::new(StatusCode::OK, body), Outcome::UpstreamOk)
        }
        Ok(reply) => {
            tracing::warn!(
                request_id = %request_id,
                operation = operation.name,
                status = %reply.status,
                "Upstream returned an error status"
            );
            let envelope = match operation.upstream_failure_message {
                Some(message) => Envelope::error(reply.status, message),
                None => Envelope::new(reply.status, normalize_body(&reply.raw_text, EMPTY_BODY_FALLBACK)),
            };
            (envelope, Outcome::UpstreamError)
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                operation = operation.name,
                error = %e,
                "Upstream call failed"
            );
            (
                Envelope::error(StatusCode::INTERNAL_SERVER_ERROR, operation.internal_error_message),
                Outcome::TransportError,
            )
        }
    }
}
