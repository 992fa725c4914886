//! Dispatch table from operation name to definition.

use axum::http::Method;

use crate::gateway::operation::{Forward, Inbound, Operation};

pub const FETCH_ANALYTICS: &str = "fetch_analytics";
pub const SEND_BLAST: &str = "send_blast";
pub const TRIGGER_RECENT_MESSAGES: &str = "trigger_recent_messages";
pub const GENERATE_CONTENT: &str = "generate_content";
pub const GENERATE_IMAGE: &str = "generate_image";

/// Ordered set of operations served by the gateway.
#[derive(Debug, Clone)]
pub struct OperationRegistry {
    operations: Vec<Operation>,
}

impl OperationRegistry {
    /// The dashboard's operations.
    pub fn builtin() -> Self {
        Self {
            operations: vec![
                Operation {
                    name: FETCH_ANALYTICS,
                    route: "/api/analytics/{username}",
                    method: Method::GET,
                    inbound: Inbound::PathParam,
                    forward: Forward::Nothing,
                    missing_fields_message: "Missing username",
                    upstream_failure_message: Some("Failed to fetch analytics data"),
                    internal_error_message: "Internal server error",
                },
                Operation {
                    name: SEND_BLAST,
                    route: "/api/automation/blast",
                    method: Method::POST,
                    inbound: Inbound::Json {
                        required: &["subject", "body"],
                    },
                    forward: Forward::Json,
                    missing_fields_message: "Missing subject or body",
                    upstream_failure_message: None,
                    internal_error_message: "Failed to send blast",
                },
                Operation {
                    name: TRIGGER_RECENT_MESSAGES,
                    route: "/api/automation/recent-messages",
                    method: Method::POST,
                    inbound: Inbound::Empty,
                    forward: Forward::Nothing,
                    missing_fields_message: "",
                    upstream_failure_message: None,
                    internal_error_message: "Failed to trigger recent message automation",
                },
                Operation {
                    name: GENERATE_CONTENT,
                    route: "/api/generate/content",
                    method: Method::POST,
                    inbound: Inbound::Json {
                        required: &["prompt"],
                    },
                    forward: Forward::Json,
                    missing_fields_message: "Missing prompt",
                    upstream_failure_message: None,
                    internal_error_message: "Failed to generate content",
                },
                Operation {
                    name: GENERATE_IMAGE,
                    route: "/api/generate/image",
                    method: Method::POST,
                    inbound: Inbound::Json {
                        required: &["prompt"],
                    },
                    forward: Forward::Json,
                    missing_fields_message: "Missing prompt",
                    upstream_failure_message: None,
                    internal_error_message: "Failed to generate image",
                },
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
