//! Proxy route handling.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → registry.rs (operation definition by name)
//!     → handler.rs (validate → forward once → normalize)
//!     → envelope.rs ({status, body} as JSON)
//! ```
//!
//! One generic handler serves every operation; operations differ only in
//! their definition and their configured upstream target.

pub mod envelope;
pub mod handler;
pub mod operation;
pub mod registry;

pub use envelope::{normalize_body, Envelope};
pub use handler::{forward, BindError, BoundOperation, InboundRequest, Outcome, RejectReason};
pub use operation::{Forward, Inbound, Operation};
pub use registry::OperationRegistry;
