//! Direct posting to the posting microservice.
//!
//! Unlike the gateway operations this path does not go through a proxy
//! route: the caller holds an in-memory image as a data URI and submits it
//! straight to the service as multipart form data.

pub mod client;
pub mod data_uri;

pub use client::{PostingClient, PostingError};
pub use data_uri::{DataUri, DataUriError};
