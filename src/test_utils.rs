//! Shared test utilities and arbitrary generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Value, json};

/// Which classification markers a generated body carries.
///
/// Markers are independent so generated bodies routinely satisfy several
/// shapes at once, which is what the priority properties need.
#[derive(Debug, Clone)]
pub struct ShapeFields {
    pub event: bool,
    pub command: bool,
    pub name: bool,
    pub actions: bool,
    pub type_value: Option<String>,
    pub callback_id: Option<String>,
    pub channel: Option<String>,
}

impl ShapeFields {
    /// Renders the markers as a JSON object body.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        if self.event {
            body.insert("event".into(), json!({ "type": "message", "channel": "C_EVT" }));
        }
        if self.command {
            body.insert("command".into(), json!("/cmd"));
        }
        if self.name {
            body.insert("name".into(), json!("menu"));
        }
        if self.actions {
            body.insert("actions".into(), json!([{ "action_id": "a" }]));
        }
        if let Some(ty) = &self.type_value {
            body.insert("type".into(), json!(ty));
        }
        if let Some(callback_id) = &self.callback_id {
            body.insert("callback_id".into(), json!(callback_id));
            body.insert("view".into(), json!({ "callback_id": callback_id }));
        }
        if let Some(channel) = &self.channel {
            body.insert("channel".into(), json!({ "id": channel }));
            body.insert("channel_id".into(), json!(channel));
        }
        Value::Object(body)
    }
}

/// Every `type` value the classifier distinguishes, plus one it does not.
pub fn arb_type_value() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("block_suggestion".to_string()),
        Just("dialog_submission".to_string()),
        Just("workflow_step_edit".to_string()),
        Just("shortcut".to_string()),
        Just("message_action".to_string()),
        Just("view_submission".to_string()),
        Just("view_closed".to_string()),
        Just("block_actions".to_string()),
        "[a-z_]{1,20}",
    ]
}

pub fn arb_shape_fields() -> impl Strategy<Value = ShapeFields> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        proptest::option::of(arb_type_value()),
        proptest::option::of("[a-z_]{0,12}"),
        proptest::option::of("C[A-Z0-9]{1,10}"),
    )
        .prop_map(
            |(event, command, name, actions, type_value, callback_id, channel)| ShapeFields {
                event,
                command,
                name,
                actions,
                type_value,
                callback_id,
                channel,
            },
        )
}

/// Arbitrary JSON leaf values, including the wrongly-typed ones.
pub fn arb_json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9_]{0,12}".prop_map(Value::String),
    ]
}

/// Bodies built from shape markers, with random junk layered into the
/// fields the classifier reads.
pub fn arb_shaped_body() -> impl Strategy<Value = Value> {
    (
        arb_shape_fields(),
        proptest::collection::vec(
            (
                prop_oneof![
                    Just("event"),
                    Just("channel"),
                    Just("channel_id"),
                    Just("callback_id"),
                    Just("view"),
                    Just("type"),
                    Just("user"),
                ],
                arb_json_leaf(),
            ),
            0..3,
        ),
    )
        .prop_map(|(fields, junk)| {
            let mut body = fields.to_body();
            if let Value::Object(map) = &mut body {
                for (key, value) in junk {
                    map.insert(key.to_string(), value);
                }
            }
            body
        })
}

// ============================================================================
// Local stand-in for the Slack Web API
// ============================================================================

/// One recorded Web API call: method, `Authorization` header, JSON body.
pub type RecordedCall = (String, Option<String>, Value);

/// A Web API stand-in bound to an ephemeral local port.
pub struct MockSlackApi {
    pub base: String,
    calls: std::sync::Arc<std::sync::Mutex<Vec<RecordedCall>>>,
}

impl MockSlackApi {
    /// Starts the stand-in; every method answers with `reply`.
    pub async fn start(reply: Value) -> Self {
        use axum::extract::Path;
        use axum::http::HeaderMap;
        use axum::{Json, routing::post};

        let calls: std::sync::Arc<std::sync::Mutex<Vec<RecordedCall>>> = Default::default();
        let recorded = calls.clone();

        let app = axum::Router::new().route(
            "/{method}",
            post(
                move |Path(method): Path<String>, headers: HeaderMap, Json(body): Json<Value>| {
                    let recorded = recorded.clone();
                    let reply = reply.clone();
                    async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(String::from);
                        recorded.lock().unwrap().push((method, auth, body));
                        Json(reply)
                    }
                },
            ),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        MockSlackApi {
            base: format!("http://{addr}"),
            calls,
        }
    }

    /// A client pointed at this stand-in.
    pub fn client(&self) -> crate::slack::SlackClient {
        crate::slack::SlackClient::with_api_base("xoxb-test", self.base.clone())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}
