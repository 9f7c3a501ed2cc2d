//! Newsletter list membership through the subscription router.

use reqwest::Method;
use serde::Serialize;
use serde_json::Map;
use storefront_klaviyo_core::{ApiStatus, ListKey, Profile, StoreCode, User};

use super::Klaviyo;
use crate::cache::CacheStorage;
use crate::error::Result;

/// Input of [`Klaviyo::subscribe_advanced`].
///
/// Either a single email (plus optional phone and name), or explicit profiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSubscription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiles: Option<Vec<Profile>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<ListKey>,
}

impl AdvancedSubscription {
    /// The subscriber as a storefront user, when an email was given.
    fn user(&self) -> Option<User> {
        let email = self.email.as_ref().filter(|email| !email.is_empty())?;
        Some(User {
            id: None,
            email: email.clone(),
            firstname: self.firstname.clone(),
            lastname: self.lastname.clone(),
            telephone: self.phone_number.clone(),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailRequest<'a> {
    email: &'a str,
    store_code: &'a StoreCode,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdvancedRequest<'a> {
    #[serde(flatten)]
    subscription: &'a AdvancedSubscription,
    store_code: &'a StoreCode,
}

impl<S: CacheStorage> Klaviyo<S> {
    /// Look up whether `email` is on the store's default list.
    ///
    /// # Errors
    ///
    /// Returns error if the router call fails or answers non-2xx.
    pub async fn status(&self, email: &str) -> Result<bool> {
        let response = self
            .inner
            .http
            .get(&self.inner.config.subscribe_url)
            .query(&[
                ("email", email),
                ("storeCode", self.inner.config.store_code.as_str()),
            ])
            .send()
            .await?;
        let envelope = super::read_envelope(response).await?;

        let subscribed = envelope.has_results();
        self.inner.state.write().await.is_subscribed = Some(subscribed);
        Ok(subscribed)
    }

    /// Subscribe `email` to the store's default list.
    ///
    /// Returns `None` without a request when already subscribed. Identifies the
    /// subscriber when no customer is known yet.
    ///
    /// # Errors
    ///
    /// Returns error if the router call, or the follow-up identify, fails.
    pub async fn subscribe(&self, email: &str) -> Result<Option<ApiStatus>> {
        if self.inner.state.read().await.is_subscribed == Some(true) {
            return Ok(None);
        }

        let body = EmailRequest {
            email,
            store_code: &self.inner.config.store_code,
        };
        let envelope = self
            .send_router(Method::POST, &self.inner.config.subscribe_url, &body)
            .await?;

        self.inner.state.write().await.is_subscribed = Some(true);
        tracing::info!("Newsletter subscription sent");

        self.maybe_identify(User::with_email(email).into(), true)
            .await?;
        Ok(Some(envelope))
    }

    /// Subscribe with phone number and name, or with explicit profiles.
    ///
    /// # Errors
    ///
    /// Returns error if the router call, or the follow-up identify, fails.
    pub async fn subscribe_advanced(&self, subscription: &AdvancedSubscription) -> Result<ApiStatus> {
        let body = AdvancedRequest {
            subscription,
            store_code: &self.inner.config.store_code,
        };
        let envelope = self
            .send_router(Method::POST, &self.inner.config.subscribe_advanced_url, &body)
            .await?;

        if let Some(user) = subscription.user() {
            if self.customer().await.is_none() {
                self.identify(user.into(), true, Map::new()).await?;
            }
        }

        Ok(envelope)
    }

    /// Remove `email` from the store's default list.
    ///
    /// Returns `None` without a request unless currently subscribed. A visitor
    /// without a logged-in session is forgotten afterwards.
    ///
    /// # Errors
    ///
    /// Returns error if the router call fails or answers non-2xx.
    pub async fn unsubscribe(&self, email: &str) -> Result<Option<ApiStatus>> {
        if self.inner.state.read().await.is_subscribed != Some(true) {
            return Ok(None);
        }

        let body = EmailRequest {
            email,
            store_code: &self.inner.config.store_code,
        };
        let envelope = self
            .send_router(Method::DELETE, &self.inner.config.subscribe_url, &body)
            .await?;

        let mut state = self.inner.state.write().await;
        state.is_subscribed = Some(false);
        if !state.has_session_email() {
            state.customer = None;
        }
        drop(state);

        Ok(Some(envelope))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::customer::CustomerDetails;
    use crate::dispatcher::testing::MockServer;
    use crate::error::KlaviyoError;
    use axum::http::Method as HttpMethod;
    use serde_json::json;

    #[tokio::test]
    async fn test_status_sets_subscription_flag() {
        let server = MockServer::start().await;
        server.respond("/subscribe", 200, json!({"code": 200, "result": [{"email": "jo@example.com"}]}));
        let klaviyo = server.dispatcher();

        assert!(klaviyo.status("jo@example.com").await.unwrap());
        assert_eq!(klaviyo.state().await.is_subscribed, Some(true));

        let request = &server.requests_to("/subscribe")[0];
        assert_eq!(request.method, HttpMethod::GET);
        assert_eq!(
            request.query.as_deref(),
            Some("email=jo%40example.com&storeCode=default")
        );
    }

    #[tokio::test]
    async fn test_subscribe_identifies_new_visitor() {
        let server = MockServer::start().await;
        let klaviyo = server.dispatcher();

        let envelope = klaviyo.subscribe("jo@example.com").await.unwrap().unwrap();
        assert_eq!(envelope.code, 200);

        let subscribe = &server.requests_to("/subscribe")[0];
        assert_eq!(subscribe.method, HttpMethod::POST);
        assert_eq!(
            subscribe.json(),
            json!({"email": "jo@example.com", "storeCode": "default"})
        );

        let identify = &server.requests_to("/api/identify")[0];
        assert_eq!(
            identify.data(),
            json!({"token": "PubKey", "properties": {"$email": "jo@example.com"}})
        );
        assert_eq!(
            klaviyo.customer().await.unwrap().email(),
            Some("jo@example.com")
        );
    }

    #[tokio::test]
    async fn test_subscribe_keeps_known_customer() {
        let server = MockServer::start().await;
        let klaviyo = server.dispatcher();
        klaviyo.inner.state.write().await.customer =
            Some(CustomerDetails::from(User::with_email("al@example.com")).to_customer());

        klaviyo.subscribe("jo@example.com").await.unwrap().unwrap();

        assert_eq!(server.requests_to("/subscribe").len(), 1);
        assert!(server.requests_to("/api/identify").is_empty());
        assert_eq!(
            klaviyo.customer().await.unwrap().email(),
            Some("al@example.com")
        );
    }

    #[tokio::test]
    async fn test_subscribe_advanced_keeps_known_customer() {
        let server = MockServer::start().await;
        let klaviyo = server.dispatcher();
        klaviyo.inner.state.write().await.customer =
            Some(CustomerDetails::from(User::with_email("al@example.com")).to_customer());

        let subscription = AdvancedSubscription {
            email: Some("jo@example.com".to_string()),
            ..AdvancedSubscription::default()
        };
        klaviyo.subscribe_advanced(&subscription).await.unwrap();

        assert_eq!(server.requests_to("/subscribe-advanced").len(), 1);
        assert!(server.requests_to("/api/identify").is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_skips_when_subscribed() {
        let server = MockServer::start().await;
        let klaviyo = server.dispatcher();
        klaviyo.inner.state.write().await.is_subscribed = Some(true);

        assert_eq!(klaviyo.subscribe("jo@example.com").await.unwrap(), None);
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_validation_error_surfaces() {
        let server = MockServer::start().await;
        server.respond(
            "/subscribe",
            422,
            json!({"code": 422, "result": "Email must be provided."}),
        );
        let klaviyo = server.dispatcher();

        let err = klaviyo.subscribe("").await.unwrap_err();
        match err {
            KlaviyoError::Api { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Email must be provided.");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(klaviyo.state().await.is_subscribed, None);
    }

    #[tokio::test]
    async fn test_subscribe_advanced_payload() {
        let server = MockServer::start().await;
        let klaviyo = server.dispatcher();

        let subscription = AdvancedSubscription {
            email: Some("jo@example.com".to_string()),
            phone_number: Some("+15555550100".to_string()),
            firstname: Some("Jo".to_string()),
            ..AdvancedSubscription::default()
        };
        klaviyo.subscribe_advanced(&subscription).await.unwrap();

        assert_eq!(
            server.requests_to("/subscribe-advanced")[0].json(),
            json!({
                "email": "jo@example.com",
                "phoneNumber": "+15555550100",
                "firstname": "Jo",
                "storeCode": "default"
            })
        );
        let identify = server.requests_to("/api/identify")[0].data();
        assert_eq!(identify["properties"]["$phone_number"], "+15555550100");
        assert_eq!(identify["properties"]["$first_name"], "Jo");
    }

    #[tokio::test]
    async fn test_unsubscribe_forgets_guest() {
        let server = MockServer::start().await;
        let klaviyo = server.dispatcher();
        klaviyo.subscribe("jo@example.com").await.unwrap();

        let envelope = klaviyo.unsubscribe("jo@example.com").await.unwrap();
        assert!(envelope.is_some());

        let delete = server
            .requests_to("/subscribe")
            .into_iter()
            .find(|r| r.method == HttpMethod::DELETE)
            .unwrap();
        assert_eq!(delete.json()["email"], "jo@example.com");

        let state = klaviyo.state().await;
        assert_eq!(state.is_subscribed, Some(false));
        assert_eq!(state.customer, None);
    }

    #[tokio::test]
    async fn test_unsubscribe_keeps_logged_in_customer() {
        let server = MockServer::start().await;
        let klaviyo = server.dispatcher();
        klaviyo
            .set_session_user(Some(User::with_email("jo@example.com")))
            .await;
        klaviyo.subscribe("jo@example.com").await.unwrap();

        klaviyo.unsubscribe("jo@example.com").await.unwrap();
        assert!(klaviyo.customer().await.is_some());
    }

    #[tokio::test]
    async fn test_unsubscribe_skips_unless_subscribed() {
        let server = MockServer::start().await;
        let klaviyo = server.dispatcher();

        assert_eq!(klaviyo.unsubscribe("jo@example.com").await.unwrap(), None);
        assert!(server.requests().is_empty());
    }
}
