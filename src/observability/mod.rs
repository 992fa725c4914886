//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! handlers and upstream client produce:
//!     → logging.rs (structured tracing events, request ID in every span)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout log lines
//!     → Prometheus scrape endpoint (when enabled)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
