//! Upstream service access.
//!
//! # Data Flow
//! ```text
//! gateway handler
//!     → client.rs (one HTTP call, raw text captured)
//!     → UpstreamReply { ok, status, raw_text }   (any HTTP status)
//!     | UpstreamError                           (network, DNS, timeout)
//! ```

pub mod client;

use thiserror::Error;

pub use client::{UpstreamClient, UpstreamReply, UpstreamRequest};

/// Failures that prevent an upstream reply from being obtained at all.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("upstream transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The response started but its body could not be read.
    #[error("failed to read upstream body: {0}")]
    Body(#[source] reqwest::Error),

    /// The request could not be built for this target.
    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),
}
