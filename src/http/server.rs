//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Bind every registered operation to its configured upstream
//! - Create the Axum Router with one route per operation
//! - Wire up middleware (tracing, timeout, request ID, body limit, headers)
//! - Serve until a shutdown signal arrives

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::{
        rejection::{BytesRejection, PathRejection},
        DefaultBodyLimit, Path, State,
    },
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    routing::{get, on, MethodFilter, MethodRouter},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Span;

use crate::config::GatewayConfig;
use crate::gateway::{self, BindError, BoundOperation, Envelope, Inbound, InboundRequest, OperationRegistry};
use crate::http::request::{MakeRequestUuidV4, RequestIdExt};
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics;
use crate::upstream::{UpstreamClient, UpstreamError};

/// Errors building or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("no upstream configured for operation '{0}'")]
    MissingUpstream(String),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] UpstreamError),

    #[error("operation '{operation}' uses unsupported method {method}")]
    UnsupportedMethod { operation: String, method: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: UpstreamClient,
    pub operations: Arc<Vec<Arc<BoundOperation>>>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server with an upstream client built from the config timeouts.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let client = UpstreamClient::new(&config.timeouts)?;
        Self::with_client(config, client)
    }

    /// Create a server around an existing upstream client.
    pub fn with_client(config: GatewayConfig, client: UpstreamClient) -> Result<Self, ServerError> {
        let registry = OperationRegistry::builtin();
        let mut operations = Vec::with_capacity(registry.len());

        for operation in registry.iter() {
            let target = config
                .upstreams
                .get(operation.name)
                .ok_or_else(|| ServerError::MissingUpstream(operation.name.to_string()))?;
            let bound = BoundOperation::bind(operation.clone(), target)?;
            tracing::debug!(
                operation = operation.name,
                route = operation.route,
                upstream = %bound.display_url(),
                "Operation bound"
            );
            operations.push(Arc::new(bound));
        }

        let state = AppState {
            client,
            operations: Arc::new(operations),
        };
        let router = Self::build_router(&config, state)?;

        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Result<Router, ServerError> {
        let mut router = Router::new()
            .route("/health", get(health))
            .route("/api/operations", get(list_operations));

        for bound in state.operations.iter() {
            router = router.route(bound.operation.route, operation_route(bound.clone())?);
        }

        let router = router
            .method_not_allowed_fallback(method_not_allowed)
            .fallback(not_found)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4));

        if !config.security.enable_headers {
            return Ok(router);
        }

        Ok(router
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            )))
    }

    /// The fully layered router, for serving or driving directly in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until Ctrl+C, SIGTERM, or a message on `shutdown`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            operations = self.config.upstreams.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => tracing::info!("Shutdown requested"),
                    _ = shutdown_signal() => {}
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Route for one operation; the extractors depend on its inbound shape.
fn operation_route(bound: Arc<BoundOperation>) -> Result<MethodRouter<AppState>, ServerError> {
    let operation = &bound.operation;
    let filter = MethodFilter::try_from(operation.method.clone()).map_err(|_| {
        ServerError::UnsupportedMethod {
            operation: operation.name.to_string(),
            method: operation.method.to_string(),
        }
    })?;

    let inbound = operation.inbound;

    let route = match inbound {
        Inbound::PathParam => on(
            filter,
            move |State(state): State<AppState>,
                  path: Result<Path<String>, PathRejection>,
                  headers: HeaderMap| {
                let bound = bound.clone();
                async move {
                    match path {
                        Ok(Path(param)) => dispatch(&state, &bound, Some(&param), &headers, &[]).await,
                        Err(rejection) => {
                            extractor_rejected(&bound, rejection.status(), &rejection.body_text())
                        }
                    }
                }
            },
        ),
        Inbound::Json { .. } | Inbound::Empty => on(
            filter,
            move |State(state): State<AppState>,
                  headers: HeaderMap,
                  body: Result<Bytes, BytesRejection>| {
                let bound = bound.clone();
                async move {
                    match body {
                        Ok(body) => dispatch(&state, &bound, None, &headers, &body).await,
                        Err(rejection) => {
                            extractor_rejected(&bound, rejection.status(), &rejection.body_text())
                        }
                    }
                }
            },
        ),
    };
    Ok(route)
}

async fn dispatch(
    state: &AppState,
    bound: &BoundOperation,
    param: Option<&str>,
    headers: &HeaderMap,
    body: &[u8],
) -> Envelope {
    let start_time = Instant::now();
    let request_id = headers.request_id();

    let (envelope, outcome) = gateway::forward(
        &state.client,
        bound,
        InboundRequest {
            path_param: param,
            body,
            request_id,
        },
    )
    .await;

    metrics::record_request(bound.operation.name, outcome, envelope.status.as_u16(), start_time);
    tracing::info!(
        request_id = %request_id.unwrap_or("unknown"),
        operation = bound.operation.name,
        status = envelope.status.as_u16(),
        outcome = %outcome,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Request completed"
    );

    envelope
}

/// Body or path extraction failed before validation; answered as JSON.
fn extractor_rejected(bound: &BoundOperation, status: StatusCode, detail: &str) -> Envelope {
    tracing::warn!(
        operation = bound.operation.name,
        status = status.as_u16(),
        detail = %detail,
        "Request rejected by extractor"
    );
    Envelope::error(status, detail)
}

async fn not_found() -> Envelope {
    Envelope::error(StatusCode::NOT_FOUND, "Not found")
}

async fn method_not_allowed() -> Envelope {
    Envelope::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request.headers().request_id().unwrap_or("unknown");
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct OperationInfo {
    pub name: &'static str,
    pub method: String,
    pub route: &'static str,
    pub upstream: String,
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_operations(State(state): State<AppState>) -> Json<Vec<OperationInfo>> {
    let operations = state
        .operations
        .iter()
        .map(|bound| OperationInfo {
            name: bound.operation.name,
            method: bound.operation.method.to_string(),
            route: bound.operation.route,
            upstream: bound.display_url(),
        })
        .collect();
    Json(operations)
}
