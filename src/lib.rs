//! API gateway for a social-media management dashboard.
//!
//! The browser talks to this gateway; each gateway operation validates the
//! request, forwards it once to a configured upstream service (analytics,
//! marketing automation, AI content generation) and relays the reply as a
//! normalized JSON envelope. [`posting`] uploads images straight to the
//! posting microservice.

pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod posting;
pub mod upstream;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
