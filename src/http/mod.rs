//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID assigned or kept)
//!     → one route per gateway operation
//!     → gateway::forward (validate, call upstream once, normalize)
//!     → JSON envelope to client
//! ```

pub mod request;
pub mod server;

pub use request::{MakeRequestUuidV4, RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError};
