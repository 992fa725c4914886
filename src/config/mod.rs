//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), optional
//!     → loader.rs (parse & deserialize)
//!     → GATEWAY_* environment overrides
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//! ```
//!
//! Upstream targets are never compiled in; every operation's URL comes from
//! here. Config is immutable once loaded.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, load_from_env, ConfigError};
pub use schema::{
    GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig, PostingConfig, SecurityConfig,
    TimeoutConfig, UpstreamTarget,
};
