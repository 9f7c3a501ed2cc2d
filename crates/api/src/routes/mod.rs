//! HTTP route handlers for the subscription router.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Liveness check
//!
//! # Lists
//! GET    /subscribe            - Membership lookup (?email=&storeCode=&list=)
//! POST   /subscribe            - Subscribe an email or profiles
//! DELETE /subscribe            - Unsubscribe an email or emails
//! POST   /subscribe-advanced   - Subscribe with phone number and SMS consent
//! ```

pub mod subscribe;

use axum::{
    Router,
    http::{HeaderName, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::{REQUEST_ID_HEADER, request_id_middleware};
use crate::state::AppState;

/// Create the list subscription routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/subscribe",
            get(subscribe::status)
                .post(subscribe::subscribe)
                .delete(subscribe::unsubscribe),
        )
        .route("/subscribe-advanced", post(subscribe::subscribe_advanced))
}

/// Build the full application: routes, health check and middleware.
///
/// Sentry layers are added by the binary so tests can drive this router directly.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)]);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request| {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace)
        .layer(cors)
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not call Klaviyo.
async fn health() -> &'static str {
    "ok"
}
