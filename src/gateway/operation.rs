//! Operation definitions.
//!
//! An operation is one instantiation of the generic forwarding handler: the
//! inbound route, how the inbound request is validated, what is sent
//! upstream, and the messages used when things fail.

use axum::http::Method;
use serde::Serialize;

/// What the inbound request must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// No body is read; the last route segment is a required parameter
    /// that is appended to the upstream URL as a path segment.
    PathParam,
    /// A JSON object body with the listed required fields.
    Json { required: &'static [&'static str] },
    /// Any inbound body is ignored.
    Empty,
}

/// What is sent upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Forward {
    /// The validated inbound JSON object.
    Json,
    /// No body.
    Nothing,
}

/// One registered gateway operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Name used in config (`upstreams.<name>`), logs and metrics.
    pub name: &'static str,
    /// Axum route path.
    pub route: &'static str,
    /// Inbound and upstream method.
    pub method: Method,
    pub inbound: Inbound,
    pub forward: Forward,
    /// 400 message when a required field is missing.
    pub missing_fields_message: &'static str,
    /// Fixed `{"error": ..}` body replacing upstream's on non-2xx, if set.
    pub upstream_failure_message: Option<&'static str>,
    /// 500 message for transport failures.
    pub internal_error_message: &'static str,
}

impl Operation {
    /// Required JSON fields, empty for operations without a JSON body.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self.inbound {
            Inbound::Json { required } => required,
            Inbound::PathParam | Inbound::Empty => &[],
        }
    }
}
