//! Integration tests for the storefront Klaviyo router and dispatcher.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-klaviyo-integration-tests
//! ```
//!
//! No network access is needed: Klaviyo is replaced by [`MockKlaviyo`], an
//! axum server on an ephemeral port that records every request it receives.
//!
//! # Test Categories
//!
//! - `router` - Subscription router driven in-process with `oneshot`
//! - `end_to_end` - Dispatcher -> router -> mock Klaviyo over real sockets

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use storefront_klaviyo_api::accounts::Accounts;
use storefront_klaviyo_api::config::{ApiConfig, KlaviyoConfig};
use storefront_klaviyo_api::routes;
use storefront_klaviyo_api::state::AppState;
use tower::ServiceExt;

/// One request as Klaviyo received it.
#[derive(Debug, Clone)]
pub struct Received {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub api_key: Option<String>,
    pub body: Bytes,
}

impl Received {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// Decoded `data=` parameter of identify/track calls.
    pub fn data(&self) -> Value {
        use base64::{Engine as _, engine::general_purpose::STANDARD};

        let query = self.query.as_deref().unwrap();
        let (_, encoded) = url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "data")
            .unwrap();
        serde_json::from_slice(&STANDARD.decode(encoded.as_bytes()).unwrap()).unwrap()
    }
}

#[derive(Clone, Default)]
struct MockState {
    received: Arc<Mutex<Vec<Received>>>,
    responses: Arc<Mutex<HashMap<String, (u16, String)>>>,
}

/// Stand-in for Klaviyo's list, identify and track APIs.
pub struct MockKlaviyo {
    pub base: String,
    state: MockState,
}

impl MockKlaviyo {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new().fallback(receive).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            state,
        }
    }

    /// Answer requests to `path` with a status and a raw body.
    pub fn respond(&self, path: &str, status: u16, body: impl Into<String>) {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.into()));
    }

    pub fn received(&self) -> Vec<Received> {
        self.state.received.lock().unwrap().clone()
    }

    pub fn received_at(&self, path: &str) -> Vec<Received> {
        self.received().into_iter().filter(|r| r.path == path).collect()
    }
}

async fn receive(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    state.received.lock().unwrap().push(Received {
        method,
        path: path.clone(),
        query: uri.query().map(String::from),
        api_key: headers
            .get("api-key")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body,
    });

    let configured = state.responses.lock().unwrap().get(&path).cloned();
    match configured {
        Some((status, body)) => (StatusCode::from_u16(status).unwrap(), body).into_response(),
        None => (StatusCode::OK, Json(json!([]))).into_response(),
    }
}

/// Two stores: `default` with a default and an `sms` list, and `de` with its
/// own endpoint override.
pub fn accounts_json(klaviyo_base: &str) -> String {
    json!({
        "default": {
            "private_key": "pk_default_0123456789",
            "public_key": "PubKey",
            "lists": {"default": "ListDefault", "sms": "ListSms"}
        },
        "de": {
            "private_key": "pk_de_0123456789",
            "endpoint": format!("{klaviyo_base}/de-api/"),
            "lists": {"default": "ListDe"}
        }
    })
    .to_string()
}

/// Router configuration pointing at the mock.
pub fn api_config(klaviyo_base: &str) -> ApiConfig {
    ApiConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        klaviyo: KlaviyoConfig {
            endpoint: format!("{klaviyo_base}/api"),
            accounts: Accounts::from_json(&accounts_json(klaviyo_base)).unwrap(),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// The full router application against the mock.
pub fn app(klaviyo: &MockKlaviyo) -> Router {
    routes::app(AppState::new(api_config(&klaviyo.base)).unwrap())
}

/// Serve the router on an ephemeral port; returns its base URL.
pub async fn spawn_router(klaviyo: &MockKlaviyo) -> String {
    let app = app(klaviyo);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Send one request through the router in-process.
///
/// Returns the status and the parsed JSON body (`Null` when not JSON).
pub async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}
