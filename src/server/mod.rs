//! HTTP server for the Slack dispatcher.
//!
//! # Endpoints
//!
//! - `POST /slack/events` - Accepts Slack deliveries, authenticates and dispatches them
//! - `GET /health` - Returns 200 if server is running
//! - `GET /` - Plain-text landing page

use std::sync::Arc;

pub mod health;
pub mod webhook;

pub use health::{health_handler, root_handler};
pub use webhook::slack_events_handler;

use crate::slack::SlackClient;
use crate::webhooks::HandlerRegistry;

/// Shared application state.
///
/// Passed to all handlers via Axum's `State` extractor. Nothing in it changes
/// after startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Secret for verifying request signatures.
    signing_secret: Vec<u8>,

    registry: HandlerRegistry,

    slack: SlackClient,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `signing_secret` - The app's signing secret
    /// * `registry` - Handlers, keyed by category and routing key
    /// * `slack` - Web API client handed to every handler
    pub fn new(
        signing_secret: impl Into<Vec<u8>>,
        registry: HandlerRegistry,
        slack: SlackClient,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                signing_secret: signing_secret.into(),
                registry,
                slack,
            }),
        }
    }

    pub fn signing_secret(&self) -> &[u8] {
        &self.inner.signing_secret
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.inner.registry
    }

    pub fn slack(&self) -> &SlackClient {
        &self.inner.slack
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};
    use tower_http::trace::TraceLayer;

    axum::Router::new()
        .route("/", get(root_handler))
        .route("/slack/events", post(slack_events_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::test_utils::MockSlackApi;
    use crate::webhooks::signature::{
        HEADER_SIGNATURE, HEADER_TIMESTAMP, compute_signature, format_signature_header,
    };
    use crate::webhooks::{
        Category, HandlerError, HandlerResponse, RequestContext, default_registry,
    };

    const SECRET: &[u8] = b"8f742231b10e8888abcd99yyyzzz85a5";

    async fn echo_classification(
        ctx: RequestContext,
        _client: SlackClient,
        _body: Value,
    ) -> Result<HandlerResponse, HandlerError> {
        Ok(HandlerResponse::json(
            StatusCode::OK,
            json!({ "ok": true, "classification": ctx.classification }),
        ))
    }

    async fn always_fails(
        _ctx: RequestContext,
        _client: SlackClient,
        _body: Value,
    ) -> Result<HandlerResponse, HandlerError> {
        Err(HandlerError::Failed("quote service unavailable".to_string()))
    }

    async fn always_panics(
        _ctx: RequestContext,
        _client: SlackClient,
        _body: Value,
    ) -> Result<HandlerResponse, HandlerError> {
        panic!("handler exploded")
    }

    fn test_registry() -> HandlerRegistry {
        HandlerRegistry::builder()
            .register(Category::Event, "message", echo_classification)
            .unwrap()
            .register(Category::Shortcut, "make_quote", echo_classification)
            .unwrap()
            .register(Category::ViewAction, "quote_modal", always_fails)
            .unwrap()
            .register(Category::Action, "", always_panics)
            .unwrap()
            .build()
    }

    fn test_app(registry: HandlerRegistry, slack: SlackClient) -> axum::Router {
        build_router(AppState::new(SECRET.to_vec(), registry, slack))
    }

    fn now() -> String {
        chrono::Utc::now().timestamp().to_string()
    }

    /// Creates a signed request with the given timestamp.
    fn signed_request_at(body: &Value, timestamp: &str) -> Request<Body> {
        let body_bytes = serde_json::to_vec(body).unwrap();
        let digest = compute_signature(SECRET, "v0", timestamp, &body_bytes);

        Request::builder()
            .method("POST")
            .uri("/slack/events")
            .header("content-type", "application/json")
            .header(HEADER_SIGNATURE, format_signature_header("v0", &digest))
            .header(HEADER_TIMESTAMP, timestamp)
            .body(Body::from(body_bytes))
            .unwrap()
    }

    fn signed_request(body: &Value) -> Request<Body> {
        signed_request_at(body, &now())
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    // ─── Plain endpoints ───

    #[tokio::test]
    async fn health_returns_200() {
        let app = test_app(test_registry(), SlackClient::new("xoxb-test"));

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn root_returns_greeting() {
        let app = test_app(test_registry(), SlackClient::new("xoxb-test"));

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    // ─── Handshake ───

    #[tokio::test]
    async fn challenge_is_echoed_without_authentication() {
        let app = test_app(test_registry(), SlackClient::new("xoxb-test"));

        let request = Request::builder()
            .method("POST")
            .uri("/slack/events")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"token":"t","challenge":"3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P","type":"url_verification"}"#,
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P" })
        );
    }

    #[tokio::test]
    async fn challenge_wins_over_event_and_bad_signature() {
        let app = test_app(test_registry(), SlackClient::new("xoxb-test"));

        let request = Request::builder()
            .method("POST")
            .uri("/slack/events")
            .header(HEADER_SIGNATURE, "v0=deadbeef")
            .header(HEADER_TIMESTAMP, "1")
            .body(Body::from(
                r#"{"challenge":{"nested":1},"event":{"type":"message"}}"#,
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "challenge": { "nested": 1 } })
        );
    }

    #[tokio::test]
    async fn null_challenge_is_echoed() {
        let app = test_app(test_registry(), SlackClient::new("xoxb-test"));

        let request = Request::builder()
            .method("POST")
            .uri("/slack/events")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"challenge":null}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "challenge": null }));
    }

    // ─── Rejections ───

    #[tokio::test]
    async fn non_json_body_returns_400() {
        let app = test_app(test_registry(), SlackClient::new("xoxb-test"));

        let request = Request::builder()
            .method("POST")
            .uri("/slack/events")
            .body(Body::from("token=abc&command=%2Fquote"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["ok"], false);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("invalid JSON body")
        );
    }

    #[tokio::test]
    async fn missing_signature_returns_401() {
        let app = test_app(test_registry(), SlackClient::new("xoxb-test"));

        let request = Request::builder()
            .method("POST")
            .uri("/slack/events")
            .body(Body::from(r#"{"event":{"type":"message"}}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            json!({ "ok": false, "error": "invalid request signature" })
        );
    }

    #[tokio::test]
    async fn wrong_signature_returns_401() {
        let app = test_app(test_registry(), SlackClient::new("xoxb-test"));
        let body = json!({ "event": { "type": "message", "channel": "C1" } });

        // Signed with a different secret.
        let body_bytes = serde_json::to_vec(&body).unwrap();
        let timestamp = now();
        let digest = compute_signature(b"wrong-secret", "v0", &timestamp, &body_bytes);
        let request = Request::builder()
            .method("POST")
            .uri("/slack/events")
            .header(HEADER_SIGNATURE, format_signature_header("v0", &digest))
            .header(HEADER_TIMESTAMP, timestamp)
            .body(Body::from(body_bytes))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn tampered_body_returns_401() {
        let app = test_app(test_registry(), SlackClient::new("xoxb-test"));
        let timestamp = now();
        let digest = compute_signature(SECRET, "v0", &timestamp, br#"{"event":{"type":"message"}}"#);

        let request = Request::builder()
            .method("POST")
            .uri("/slack/events")
            .header(HEADER_SIGNATURE, format_signature_header("v0", &digest))
            .header(HEADER_TIMESTAMP, timestamp)
            .body(Body::from(r#"{"event":{"type":"message","channel":"C9"}}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn stale_timestamp_returns_401() {
        let app = test_app(test_registry(), SlackClient::new("xoxb-test"));
        let stale = (chrono::Utc::now().timestamp() - 301).to_string();
        let request = signed_request_at(&json!({ "event": { "type": "message" } }), &stale);

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // ─── Dispatch ───

    #[tokio::test]
    async fn event_reaches_its_handler() {
        let app = test_app(test_registry(), SlackClient::new("xoxb-test"));
        let request = signed_request(&json!({
            "event": { "type": "message", "channel": "C2147483705", "text": "hi" }
        }));

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["classification"]["category"], "Event");
        assert_eq!(body["classification"]["routing_key"], "message");
        assert_eq!(body["classification"]["conversation_id"], "C2147483705");
    }

    #[tokio::test]
    async fn shortcut_reaches_its_handler() {
        let app = test_app(test_registry(), SlackClient::new("xoxb-test"));
        let request = signed_request(&json!({
            "type": "message_action",
            "callback_id": "make_quote",
            "channel": { "id": "C7" }
        }));

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["classification"]["category"], "Shortcut");
        assert_eq!(body["classification"]["conversation_id"], "C7");
    }

    #[tokio::test]
    async fn unregistered_command_returns_404_no_handler() {
        let app = test_app(test_registry(), SlackClient::new("xoxb-test"));
        let request = signed_request(&json!({ "command": "/weather", "channel_id": "C1" }));

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(response).await,
            json!({ "ok": false, "no_handler": true })
        );
    }

    #[tokio::test]
    async fn unclassifiable_body_returns_404_no_handler() {
        let app = test_app(test_registry(), SlackClient::new("xoxb-test"));
        let request = signed_request(&json!({ "token": "abc" }));

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn handler_error_returns_400() {
        let app = test_app(test_registry(), SlackClient::new("xoxb-test"));
        let request = signed_request(&json!({
            "type": "view_submission",
            "view": { "callback_id": "quote_modal" }
        }));

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["ok"], false);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .contains("quote service unavailable")
        );
    }

    #[tokio::test]
    async fn handler_panic_returns_500_and_server_survives() {
        let app = test_app(test_registry(), SlackClient::new("xoxb-test"));
        let request = signed_request(&json!({ "type": "block_actions", "actions": [] }));

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let request = signed_request(&json!({ "event": { "type": "message" } }));
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn app_mention_posts_reply_through_slack() {
        let api = MockSlackApi::start(json!({ "ok": true, "ts": "1.2" })).await;
        let app = test_app(default_registry().unwrap(), api.client());
        let request = signed_request(&json!({
            "type": "event_callback",
            "event": { "type": "app_mention", "channel": "C55", "user": "U1", "text": "<@B1> hi" }
        }));

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "ok": true }));
        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "chat.postMessage");
        assert_eq!(calls[0].1.as_deref(), Some("Bearer xoxb-test"));
        assert_eq!(calls[0].2["channel"], "C55");
    }
}
