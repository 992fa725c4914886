//! Router-level tests for the gateway operations.

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use social_gateway::config::UpstreamTarget;
use social_gateway::gateway::{Inbound, OperationRegistry};
use social_gateway::HttpServer;

mod common;

fn router_for(base: &str) -> Router {
    common::server_for(common::config_for(base)).router()
}

async fn call(
    app: Router,
    method: Method,
    path: &str,
    body: Option<&str>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    let body = match body {
        Some(text) => {
            builder = builder.header("content-type", "application/json");
            Body::from(text.to_string())
        }
        None => Body::empty(),
    };

    let resp = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

#[tokio::test]
async fn blast_without_fields_is_rejected_before_upstream() {
    let upstream = common::start_mock_upstream(200, r#"{"sent":true}"#).await;
    let app = router_for(&upstream.url(""));

    let (status, headers, body) = call(app, Method::POST, "/api/automation/blast", Some("{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(headers.get("content-type").unwrap(), "application/json");
    assert!(body["error"].as_str().unwrap().contains("Missing subject or body"));
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn blast_with_one_field_is_rejected() {
    let upstream = common::start_mock_upstream(200, r#"{"sent":true}"#).await;
    let app = router_for(&upstream.url(""));

    let (status, _, _) = call(app, Method::POST, "/api/automation/blast", Some(r#"{"subject":"Hi"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn blast_with_invalid_json_is_rejected() {
    let upstream = common::start_mock_upstream(200, r#"{"sent":true}"#).await;
    let app = router_for(&upstream.url(""));

    let (status, _, body) = call(app, Method::POST, "/api/automation/blast", Some("subject=Hi&body=Hello")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid JSON body"}));
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn blast_is_forwarded_once_and_relayed() {
    let upstream = common::start_mock_upstream(200, r#"{"sent":true}"#).await;
    let app = router_for(&upstream.url(""));

    let (status, _, body) = call(
        app,
        Method::POST,
        "/api/automation/blast",
        Some(r#"{"subject":"Hi","body":"Hello"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"sent": true}));
    assert_eq!(upstream.hits(), 1);

    let seen = upstream.last();
    assert_eq!(seen.method, Method::POST);
    assert_eq!(seen.path, "/send_blast");
    assert_eq!(seen.headers.get("content-type").unwrap(), "application/json");
    let forwarded: Value = serde_json::from_slice(&seen.body).unwrap();
    assert_eq!(forwarded, json!({"subject": "Hi", "body": "Hello"}));
}

#[tokio::test]
async fn upstream_error_status_is_passed_through() {
    let upstream = common::start_mock_upstream(429, r#"{"detail":"slow down"}"#).await;
    let app = router_for(&upstream.url(""));

    let (status, _, body) = call(
        app,
        Method::POST,
        "/api/automation/blast",
        Some(r#"{"subject":"Hi","body":"Hello"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body, json!({"detail": "slow down"}));
}

#[tokio::test]
async fn upstream_created_becomes_ok() {
    let upstream = common::start_mock_upstream(201, r#"{"id":42}"#).await;
    let app = router_for(&upstream.url(""));

    let (status, _, body) = call(app, Method::POST, "/api/generate/image", Some(r#"{"prompt":"sunset"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 42}));
}

#[tokio::test]
async fn analytics_failure_uses_fixed_message() {
    let upstream = common::start_mock_upstream(404, r#"{"detail":"no such user"}"#).await;
    let app = router_for(&upstream.url(""));

    let (status, _, body) = call(app, Method::GET, "/api/analytics/ghost", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Failed to fetch analytics data"}));
    assert_eq!(upstream.last().path, "/fetch_analytics/ghost");
}

#[tokio::test]
async fn analytics_success_is_passed_through() {
    let upstream = common::start_mock_upstream(200, r#"{"followers":120,"posts":[1,2,3]}"#).await;
    let app = router_for(&upstream.url(""));

    let (status, _, body) = call(app, Method::GET, "/api/analytics/jane.doe", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"followers": 120, "posts": [1, 2, 3]}));

    let seen = upstream.last();
    assert_eq!(seen.method, Method::GET);
    assert_eq!(seen.path, "/fetch_analytics/jane.doe");
    assert!(seen.body.is_empty());
}

#[tokio::test]
async fn non_json_upstream_body_is_wrapped() {
    let upstream = common::start_mock_upstream(502, "Bad Gateway").await;
    let app = router_for(&upstream.url(""));

    let (status, _, body) = call(
        app.clone(),
        Method::POST,
        "/api/generate/image",
        Some(r#"{"prompt":"   "}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing prompt"}));
    assert_eq!(upstream.hits(), 0);

    let (status, _, body) = call(app, Method::POST, "/api/generate/content", Some(r#"{"prompt":"launch"}"#)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({"message": "Bad Gateway"}));
}

#[tokio::test]
async fn empty_upstream_body_uses_fallback() {
    let upstream = common::start_mock_upstream(200, "").await;
    let app = router_for(&upstream.url(""));

    let (status, _, body) = call(app, Method::POST, "/api/automation/recent-messages", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "No response body"}));
}

#[tokio::test]
async fn trigger_never_forwards_a_body() {
    let upstream = common::start_mock_upstream(200, r#"{"triggered":true}"#).await;
    let app = router_for(&upstream.url(""));

    let (status, _, body) = call(
        app,
        Method::POST,
        "/api/automation/recent-messages",
        Some(r#"{"ignored":true}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"triggered": true}));

    let seen = upstream.last();
    assert_eq!(seen.method, Method::POST);
    assert_eq!(seen.path, "/trigger_recent_messages");
    assert!(seen.body.is_empty());
}

#[tokio::test]
async fn generate_requires_prompt_only() {
    let upstream = common::start_mock_upstream(200, r#"{"text":"Big news!"}"#).await;
    let app = router_for(&upstream.url(""));

    let (status, _, body) = call(
        app.clone(),
        Method::POST,
        "/api/generate/content",
        Some(r#"{"platform":"linkedin","tone":"formal"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing prompt"}));
    assert_eq!(upstream.hits(), 0);

    let (status, _, body) = call(app, Method::POST, "/api/generate/content", Some(r#"{"prompt":"launch"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"text": "Big news!"}));
    assert_eq!(upstream.hits(), 1);
}

#[tokio::test]
async fn transport_failure_is_generic_500() {
    let dead = common::dead_address().await;
    let app = router_for(&format!("http://{dead}"));

    for operation in OperationRegistry::builtin().iter() {
        let path = operation.route.replace("{username}", "jane");
        let body = match operation.inbound {
            Inbound::Json { required } => {
                let fields: serde_json::Map<String, Value> = required
                    .iter()
                    .map(|field| (field.to_string(), json!("launch")))
                    .collect();
                Some(Value::Object(fields).to_string())
            }
            Inbound::PathParam | Inbound::Empty => None,
        };

        let (status, headers, body) =
            call(app.clone(), operation.method.clone(), &path, body.as_deref()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", operation.name);
        assert_eq!(headers.get("content-type").unwrap(), "application/json");
        assert_eq!(body, json!({"error": operation.internal_error_message}), "{}", operation.name);
    }

    // Still serving.
    let (status, _, _) = call(app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn configured_headers_and_request_id_reach_upstream() {
    let upstream = common::start_mock_upstream(200, r#"{"ok":true}"#).await;
    let mut config = common::config_for(&upstream.url(""));
    config.upstreams.insert(
        "fetch_analytics".into(),
        UpstreamTarget::new(upstream.url("/analytics"))
            .with_header("ngrok-skip-browser-warning", "true"),
    );
    let app = common::server_for(config).router();

    let req = Request::builder()
        .method(Method::GET)
        .uri("/api/analytics/jane")
        .header("x-request-id", "req-abc-123")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "req-abc-123");

    let seen = upstream.last();
    assert_eq!(seen.path, "/analytics/jane");
    assert_eq!(seen.headers.get("ngrok-skip-browser-warning").unwrap(), "true");
    assert_eq!(seen.headers.get("x-request-id").unwrap(), "req-abc-123");
}

#[tokio::test]
async fn request_id_is_generated_when_absent() {
    let upstream = common::start_mock_upstream(200, r#"{"ok":true}"#).await;
    let app = router_for(&upstream.url(""));

    let (_, headers, _) = call(app, Method::POST, "/api/automation/recent-messages", None).await;

    let id = headers.get("x-request-id").unwrap().to_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert_eq!(upstream.last().headers.get("x-request-id").unwrap(), id.as_str());
}

#[tokio::test]
async fn wrong_method_is_not_forwarded() {
    let upstream = common::start_mock_upstream(200, "{}").await;
    let app = router_for(&upstream.url(""));

    let (status, headers, body) = call(app, Method::GET, "/api/automation/blast", None).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers.get("content-type").unwrap(), "application/json");
    assert_eq!(body, json!({"error": "Method not allowed"}));
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let upstream = common::start_mock_upstream(200, "{}").await;
    let app = router_for(&upstream.url(""));

    let (status, headers, body) = call(app, Method::GET, "/api/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(headers.get("content-type").unwrap(), "application/json");
    assert_eq!(body, json!({"error": "Not found"}));
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn oversized_body_is_json_413() {
    let upstream = common::start_mock_upstream(200, r#"{"sent":true}"#).await;
    let mut config = common::config_for(&upstream.url(""));
    config.security.max_body_size = 64;
    let app = common::server_for(config).router();

    let payload = json!({"subject": "Hi", "body": "x".repeat(200)}).to_string();
    let (status, headers, body) = call(app, Method::POST, "/api/automation/blast", Some(&payload)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(headers.get("content-type").unwrap(), "application/json");
    assert!(body["error"].is_string());
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn health_and_operation_listing() {
    let upstream = common::start_mock_upstream(200, "{}").await;
    let app = router_for(&upstream.url(""));

    let (status, headers, body) = call(app.clone(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");

    let (status, _, body) = call(app, Method::GET, "/api/operations", None).await;
    assert_eq!(status, StatusCode::OK);
    let operations = body.as_array().unwrap();
    assert_eq!(operations.len(), 5);
    let blast = operations.iter().find(|op| op["name"] == "send_blast").unwrap();
    assert_eq!(blast["method"], "POST");
    assert_eq!(blast["route"], "/api/automation/blast");
    assert_eq!(blast["upstream"], upstream.url("/send_blast"));
}

#[tokio::test]
async fn missing_upstream_fails_construction() {
    let mut config = common::config_for("http://127.0.0.1:5000");
    config.upstreams.remove("generate_image");

    let err = HttpServer::new(config).err().unwrap();
    assert_eq!(err.to_string(), "no upstream configured for operation 'generate_image'");
}
