//! List subscription route handlers.
//!
//! Each handler shapes the request into the body Klaviyo's list API expects,
//! resolves the store's account and list, and relays Klaviyo's answer. A
//! request without a usable email is rejected with 422 before anything is
//! looked up or sent.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reqwest::Method;
use serde::Deserialize;
use storefront_klaviyo_core::{ApiStatus, ListKey, Profile, StoreCode};
use tracing::{Span, field::Empty, instrument};

use crate::error::{AppError, Result};
use crate::services::{EmailsPayload, ProfilesPayload, Relay};
use crate::state::AppState;

/// Query of `GET /subscribe`.
///
/// `emails` may repeat (`emails=a&emails=b`, or `emails[]=`) and wins over a
/// single `email`.
#[derive(Debug, Default)]
pub struct StatusQuery {
    pub email: Option<String>,
    pub emails: Option<Vec<String>>,
    pub store_code: Option<StoreCode>,
    pub list: Option<ListKey>,
}

impl StatusQuery {
    /// Build from raw query pairs; unknown keys are ignored.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "email" => query.email = Some(value),
                "emails" | "emails[]" => query.emails.get_or_insert_with(Vec::new).push(value),
                "storeCode" => query.store_code = Some(StoreCode::new(value)),
                "list" => query.list = Some(ListKey::new(value)),
                _ => {}
            }
        }
        query
    }
}

/// Body of `POST /subscribe`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub email: Option<String>,
    pub profiles: Option<Vec<Profile>>,
    pub store_code: Option<StoreCode>,
    pub list: Option<ListKey>,
}

/// Body of `POST /subscribe-advanced`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSubscribeRequest {
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub profiles: Option<Vec<Profile>>,
    pub store_code: Option<StoreCode>,
    pub list: Option<ListKey>,
}

/// Body of `DELETE /subscribe`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsubscribeRequest {
    pub email: Option<String>,
    pub emails: Option<Vec<String>>,
    pub store_code: Option<StoreCode>,
    pub list: Option<ListKey>,
}

/// Look up whether an email is on a list.
#[instrument(skip_all, fields(email = Empty, store = Empty, list = Empty))]
pub async fn status(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response> {
    let query = StatusQuery::from_pairs(pairs);
    record_request(query.email.as_deref(), query.store_code.as_ref(), query.list.as_ref());

    let emails = email_list(query.email, query.emails)?;
    let target = state.list_target(query.store_code.as_ref(), query.list.as_ref())?;

    let relay = state
        .klaviyo()
        .forward(Method::GET, &target, &EmailsPayload { emails })
        .await?;

    Ok(relay_response(relay))
}

/// Subscribe one email, or a list of profiles, to a list.
#[instrument(skip_all, fields(email = Empty, store = Empty, list = Empty))]
pub async fn subscribe(
    State(state): State<AppState>,
    body: std::result::Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Response> {
    let request = json_body(body)?;
    record_request(request.email.as_deref(), request.store_code.as_ref(), request.list.as_ref());

    let profiles = request
        .profiles
        .unwrap_or_else(|| vec![Profile::with_email(request.email.unwrap_or_default())]);
    require_profile_emails(&profiles)?;

    let target = state.list_target(request.store_code.as_ref(), request.list.as_ref())?;

    let relay = state
        .klaviyo()
        .forward(Method::POST, &target, &ProfilesPayload { profiles })
        .await?;

    tracing::info!(status = relay.status, "List subscription forwarded");
    Ok(relay_response(relay))
}

/// Subscribe with an optional phone number, granting SMS consent.
#[instrument(skip_all, fields(email = Empty, store = Empty, list = Empty))]
pub async fn subscribe_advanced(
    State(state): State<AppState>,
    body: std::result::Result<Json<AdvancedSubscribeRequest>, JsonRejection>,
) -> Result<Response> {
    let request = json_body(body)?;
    record_request(request.email.as_deref(), request.store_code.as_ref(), request.list.as_ref());

    let profiles = request.profiles.unwrap_or_else(|| {
        let email = request.email.unwrap_or_default();
        match request.phone_number.filter(|phone| !phone.is_empty()) {
            Some(phone) => vec![Profile::with_sms(email, phone)],
            None => vec![Profile::with_email(email)],
        }
    });
    require_profile_emails(&profiles)?;

    let target = state.list_target(request.store_code.as_ref(), request.list.as_ref())?;

    let relay = state
        .klaviyo()
        .forward(Method::POST, &target, &ProfilesPayload { profiles })
        .await?;

    tracing::info!(status = relay.status, "Advanced list subscription forwarded");
    Ok(relay_response(relay))
}

/// Remove one or more emails from a list.
#[instrument(skip_all, fields(email = Empty, store = Empty, list = Empty))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    body: std::result::Result<Json<UnsubscribeRequest>, JsonRejection>,
) -> Result<Response> {
    let request = json_body(body)?;
    record_request(request.email.as_deref(), request.store_code.as_ref(), request.list.as_ref());

    let emails = email_list(request.email, request.emails)?;
    let target = state.list_target(request.store_code.as_ref(), request.list.as_ref())?;

    let relay = state
        .klaviyo()
        .forward(Method::DELETE, &target, &EmailsPayload { emails })
        .await?;

    tracing::info!(status = relay.status, "List unsubscription forwarded");
    Ok(relay_response(relay))
}

/// A missing or empty body carries no email; it is validated like `{}`.
fn json_body<T: Default>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match body {
        Ok(Json(request)) => Ok(request),
        Err(JsonRejection::MissingJsonContentType(_) | JsonRejection::JsonSyntaxError(_)) => {
            Ok(T::default())
        }
        Err(rejection) => Err(AppError::Validation(rejection.body_text())),
    }
}

fn record_request(email: Option<&str>, store: Option<&StoreCode>, list: Option<&ListKey>) {
    let span = Span::current();
    if let Some(email) = email {
        span.record("email", email);
    }
    if let Some(store) = store {
        span.record("store", tracing::field::display(store));
    }
    if let Some(list) = list {
        span.record("list", tracing::field::display(list));
    }
}

/// Explicit `emails` win; a single `email` is wrapped. Nothing, or any empty
/// entry, is a validation failure.
fn email_list(email: Option<String>, emails: Option<Vec<String>>) -> Result<Vec<String>> {
    let emails = emails.unwrap_or_else(|| email.into_iter().collect());

    if emails.is_empty() || emails.iter().any(|email| email.trim().is_empty()) {
        return Err(AppError::email_required());
    }

    Ok(emails)
}

fn require_profile_emails(profiles: &[Profile]) -> Result<()> {
    if profiles.is_empty() || !profiles.iter().all(Profile::has_email) {
        return Err(AppError::email_required());
    }
    Ok(())
}

/// Answer with Klaviyo's status and body inside the envelope.
fn relay_response(relay: Relay) -> Response {
    let status = StatusCode::from_u16(relay.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(ApiStatus::new(relay.status, relay.body))).into_response()
}
