//! Recording HTTP server standing in for Klaviyo and the subscription router.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::cache::MemoryCache;
use crate::config::ClientConfig;

use super::Klaviyo;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub body: Bytes,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// Decoded `data=` parameter of identify/track calls.
    pub fn data(&self) -> Value {
        use base64::{Engine as _, engine::general_purpose::STANDARD};

        let query = self.query.as_deref().unwrap();
        let (_, encoded) = url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == "data")
            .unwrap();
        serde_json::from_slice(&STANDARD.decode(encoded.as_bytes()).unwrap()).unwrap()
    }
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    responses: Arc<Mutex<HashMap<String, (u16, Value)>>>,
}

pub struct MockServer {
    pub base: String,
    state: MockState,
}

impl MockServer {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new().fallback(record).with_state(state.clone());

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

    /// Answer requests to `path` with this status and JSON body.
    pub fn respond(&self, path: &str, status: u16, body: Value) {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }

    /// Config pointing every endpoint at this server.
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::new("PubKey");
        config.api_endpoint = format!("{}/api", self.base);
        config.subscribe_url = format!("{}/subscribe", self.base);
        config.subscribe_advanced_url = format!("{}/subscribe-advanced", self.base);
        config.back_in_stock_url = format!("{}/back-in-stock", self.base);
        config
    }

    pub fn dispatcher(&self) -> Klaviyo<MemoryCache> {
        Klaviyo::new(self.config(), MemoryCache::new()).unwrap()
    }
}

async fn record(State(state): State<MockState>, method: Method, uri: Uri, body: Bytes) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().unwrap().push(Recorded {
        method,
        path: path.clone(),
        query: uri.query().map(String::from),
        body,
    });

    let configured = state.responses.lock().unwrap().get(&path).cloned();
    let (status, body) = configured.unwrap_or_else(|| (200, json!({"code": 200, "result": []})));
    (StatusCode::from_u16(status).unwrap(), Json(body)).into_response()
}
