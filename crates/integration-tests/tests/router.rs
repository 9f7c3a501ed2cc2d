//! Integration tests for the subscription router.
//!
//! The router runs in-process via `oneshot`; Klaviyo is the recording mock.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use serde_json::json;
use storefront_klaviyo_integration_tests::{MockKlaviyo, app, call};

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_missing_email_is_rejected_on_every_route() {
    let klaviyo = MockKlaviyo::start().await;

    let cases = [
        (Method::GET, "/subscribe", None),
        (Method::POST, "/subscribe", Some(json!({}))),
        (Method::POST, "/subscribe", Some(json!({"email": ""}))),
        (Method::DELETE, "/subscribe", Some(json!({"storeCode": "default"}))),
        (Method::POST, "/subscribe-advanced", Some(json!({"phoneNumber": "+15555550100"}))),
        (Method::POST, "/subscribe", Some(json!({"profiles": [{"phone_number": "+1"}]}))),
        (Method::POST, "/subscribe", Some(json!({"email": "   "}))),
        (Method::DELETE, "/subscribe", Some(json!({"email": "   "}))),
        (Method::POST, "/subscribe", None),
        (Method::DELETE, "/subscribe", None),
        (Method::POST, "/subscribe-advanced", None),
    ];

    for (method, uri, body) in cases {
        let (status, envelope) = call(app(&klaviyo), method.clone(), uri, body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{method} {uri}");
        assert_eq!(
            envelope,
            json!({"code": 422, "result": "Email must be provided."})
        );
    }

    assert!(klaviyo.received().is_empty(), "nothing may reach Klaviyo");
}

#[tokio::test]
async fn test_unknown_store_is_bad_request() {
    let klaviyo = MockKlaviyo::start().await;

    let (status, envelope) = call(
        app(&klaviyo),
        Method::POST,
        "/subscribe",
        Some(json!({"email": "jo@example.com", "storeCode": "fr"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope["code"], 400);
    assert!(klaviyo.received().is_empty());
}

// =============================================================================
// Payload shapes
// =============================================================================

#[tokio::test]
async fn test_subscribe_forwards_profiles() {
    let klaviyo = MockKlaviyo::start().await;

    let (status, _) = call(
        app(&klaviyo),
        Method::POST,
        "/subscribe",
        Some(json!({"email": "jo@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let sent = &klaviyo.received_at("/api/v2/list/ListDefault/subscribe")[0];
    assert_eq!(sent.method, Method::POST);
    assert_eq!(sent.api_key.as_deref(), Some("pk_default_0123456789"));
    assert_eq!(sent.json(), json!({"profiles": [{"email": "jo@example.com"}]}));
}

#[tokio::test]
async fn test_subscribe_advanced_grants_sms_consent() {
    let klaviyo = MockKlaviyo::start().await;

    call(
        app(&klaviyo),
        Method::POST,
        "/subscribe-advanced",
        Some(json!({"email": "jo@example.com", "phoneNumber": "+15555550100", "list": "sms"})),
    )
    .await;

    let sent = &klaviyo.received_at("/api/v2/list/ListSms/subscribe")[0];
    assert_eq!(
        sent.json(),
        json!({"profiles": [{
            "email": "jo@example.com",
            "phone_number": "+15555550100",
            "sms_consent": true
        }]})
    );
}

#[tokio::test]
async fn test_subscribe_advanced_without_phone_is_email_only() {
    let klaviyo = MockKlaviyo::start().await;

    call(
        app(&klaviyo),
        Method::POST,
        "/subscribe-advanced",
        Some(json!({"email": "jo@example.com", "phoneNumber": ""})),
    )
    .await;

    let sent = &klaviyo.received_at("/api/v2/list/ListDefault/subscribe")[0];
    assert_eq!(sent.json(), json!({"profiles": [{"email": "jo@example.com"}]}));
}

#[tokio::test]
async fn test_status_sends_emails_body() {
    let klaviyo = MockKlaviyo::start().await;

    call(
        app(&klaviyo),
        Method::GET,
        "/subscribe?email=jo%40example.com&storeCode=default",
        None,
    )
    .await;

    let sent = &klaviyo.received_at("/api/v2/list/ListDefault/subscribe")[0];
    assert_eq!(sent.method, Method::GET);
    assert_eq!(sent.json(), json!({"emails": ["jo@example.com"]}));
}

#[tokio::test]
async fn test_status_accepts_repeated_emails() {
    let klaviyo = MockKlaviyo::start().await;

    let (status, _) = call(
        app(&klaviyo),
        Method::GET,
        "/subscribe?emails=jo%40example.com&emails=al%40example.com",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let sent = &klaviyo.received_at("/api/v2/list/ListDefault/subscribe")[0];
    assert_eq!(
        sent.json(),
        json!({"emails": ["jo@example.com", "al@example.com"]})
    );
}

#[tokio::test]
async fn test_unsubscribe_uses_store_endpoint_override() {
    let klaviyo = MockKlaviyo::start().await;

    let (status, _) = call(
        app(&klaviyo),
        Method::DELETE,
        "/subscribe",
        Some(json!({"email": "jo@example.com", "storeCode": "de"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let sent = &klaviyo.received_at("/de-api/v2/list/ListDe/subscribe")[0];
    assert_eq!(sent.method, Method::DELETE);
    assert_eq!(sent.api_key.as_deref(), Some("pk_de_0123456789"));
    assert_eq!(sent.json(), json!({"emails": ["jo@example.com"]}));
}

#[tokio::test]
async fn test_unknown_list_falls_back_to_default() {
    let klaviyo = MockKlaviyo::start().await;

    call(
        app(&klaviyo),
        Method::POST,
        "/subscribe",
        Some(json!({"email": "jo@example.com", "list": "vip"})),
    )
    .await;

    assert_eq!(
        klaviyo.received_at("/api/v2/list/ListDefault/subscribe").len(),
        1
    );
}

// =============================================================================
// Relay
// =============================================================================

#[tokio::test]
async fn test_upstream_status_and_body_are_relayed() {
    let klaviyo = MockKlaviyo::start().await;
    klaviyo.respond(
        "/api/v2/list/ListDefault/subscribe",
        200,
        r#"[{"email": "jo@example.com", "id": "01H"}]"#,
    );

    let (status, envelope) = call(
        app(&klaviyo),
        Method::GET,
        "/subscribe?email=jo%40example.com",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        envelope,
        json!({"code": 200, "result": [{"email": "jo@example.com", "id": "01H"}]})
    );
}

#[tokio::test]
async fn test_upstream_error_is_relayed() {
    let klaviyo = MockKlaviyo::start().await;
    klaviyo.respond(
        "/api/v2/list/ListDefault/subscribe",
        403,
        r#"{"detail": "invalid api key"}"#,
    );

    let (status, envelope) = call(
        app(&klaviyo),
        Method::POST,
        "/subscribe",
        Some(json!({"email": "jo@example.com"})),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(envelope["code"], 403);
    assert_eq!(envelope["result"]["detail"], "invalid api key");
}

#[tokio::test]
async fn test_non_json_upstream_body_is_relayed_as_text() {
    let klaviyo = MockKlaviyo::start().await;
    klaviyo.respond("/api/v2/list/ListDefault/subscribe", 502, "Bad Gateway");

    let (status, envelope) = call(
        app(&klaviyo),
        Method::POST,
        "/subscribe",
        Some(json!({"email": "jo@example.com"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(envelope, json!({"code": 502, "result": "Bad Gateway"}));
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let klaviyo = MockKlaviyo::start().await;
    let base = storefront_klaviyo_integration_tests::spawn_router(&klaviyo).await;

    let response = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
    assert!(klaviyo.received().is_empty());
}
