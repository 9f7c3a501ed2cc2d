//! End-to-end tests: dispatcher -> subscription router -> Klaviyo.
//!
//! The router is served on a real socket so the dispatcher talks to it over
//! HTTP exactly as a storefront would.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::Method;
use serde_json::{Map, json};
use storefront_klaviyo_client::{ClientConfig, Klaviyo, KlaviyoError, MemoryCache, SubscribeForm};
use storefront_klaviyo_core::{Product, User};
use storefront_klaviyo_integration_tests::{MockKlaviyo, spawn_router};

const LIST_PATH: &str = "/api/v2/list/ListDefault/subscribe";

async fn dispatcher(klaviyo: &MockKlaviyo) -> Klaviyo<MemoryCache> {
    let router = spawn_router(klaviyo).await;

    let mut config = ClientConfig::new("PubKey");
    config.api_endpoint = format!("{}/api", klaviyo.base);
    config.subscribe_url = format!("{router}/subscribe");
    config.subscribe_advanced_url = format!("{router}/subscribe-advanced");
    config.back_in_stock_url = format!("{}/back-in-stock", klaviyo.base);

    Klaviyo::new(config, MemoryCache::new()).unwrap()
}

#[tokio::test]
async fn test_subscribe_reaches_klaviyo_and_identifies() {
    let klaviyo = MockKlaviyo::start().await;
    let client = dispatcher(&klaviyo).await;

    let envelope = client.subscribe("jo@example.com").await.unwrap().unwrap();
    assert_eq!(envelope.code, 200);

    let list = &klaviyo.received_at(LIST_PATH)[0];
    assert_eq!(list.method, Method::POST);
    assert_eq!(list.json(), json!({"profiles": [{"email": "jo@example.com"}]}));

    let identify = &klaviyo.received_at("/api/identify")[0];
    assert_eq!(
        identify.data(),
        json!({"token": "PubKey", "properties": {"$email": "jo@example.com"}})
    );
    assert_eq!(client.state().await.is_subscribed, Some(true));
}

#[tokio::test]
async fn test_router_validation_surfaces_as_api_error() {
    let klaviyo = MockKlaviyo::start().await;
    let client = dispatcher(&klaviyo).await;

    let err = client.subscribe("").await.unwrap_err();
    assert!(matches!(err, KlaviyoError::Api { status: 422, .. }));
    assert!(klaviyo.received().is_empty());
}

#[tokio::test]
async fn test_status_then_unsubscribe() {
    let klaviyo = MockKlaviyo::start().await;
    klaviyo.respond(LIST_PATH, 200, r#"[{"email": "jo@example.com"}]"#);
    let client = dispatcher(&klaviyo).await;

    assert!(client.status("jo@example.com").await.unwrap());
    client.unsubscribe("jo@example.com").await.unwrap().unwrap();

    let methods: Vec<_> = klaviyo
        .received_at(LIST_PATH)
        .into_iter()
        .map(|r| r.method)
        .collect();
    assert_eq!(methods, vec![Method::GET, Method::DELETE]);
    assert_eq!(client.state().await.is_subscribed, Some(false));
}

#[tokio::test]
async fn test_form_advanced_subscription() {
    let klaviyo = MockKlaviyo::start().await;
    let client = dispatcher(&klaviyo).await;

    let form = SubscribeForm {
        email: "jo@example.com".to_string(),
        phone_number: Some("+15555550100".to_string()),
    };
    form.subscribe_advanced(&client).await.unwrap();

    assert_eq!(
        klaviyo.received_at(LIST_PATH)[0].json()["profiles"][0]["sms_consent"],
        true
    );
}

#[tokio::test]
async fn test_events_before_identify_are_replayed() {
    let klaviyo = MockKlaviyo::start().await;
    let client = dispatcher(&klaviyo).await;

    let product = Product {
        id: 7,
        sku: "SOAP".to_string(),
        name: "Bar Soap".to_string(),
        ..Product::default()
    };
    client.product_viewed(&product).await;
    client.product_added_to_cart(&product).await;
    assert!(klaviyo.received().is_empty());

    client
        .identify(User::with_email("jo@example.com").into(), true, Map::new())
        .await
        .unwrap();

    let events: Vec<_> = klaviyo
        .received_at("/api/track")
        .iter()
        .map(|r| r.data()["event"].clone())
        .collect();
    assert_eq!(events, vec![json!("Viewed Product"), json!("Added to Cart Product")]);
}
