//! Router error type with Sentry integration.
//!
//! Every failure is answered with the same `{code, result}` envelope the
//! router uses for relayed responses, so callers parse one shape. Server-side
//! failures are captured to Sentry before responding.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storefront_klaviyo_core::ApiStatus;
use thiserror::Error;

use crate::accounts::AccountError;
use crate::services::KlaviyoError;

/// Message returned when a request carries no usable email.
pub const EMAIL_REQUIRED: &str = "Email must be provided.";

/// Application-level error type for the subscription router.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request failed validation before any upstream call.
    #[error("{0}")]
    Validation(String),

    /// Store code or list key did not resolve against configuration.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// Klaviyo could not be reached.
    #[error(transparent)]
    Upstream(#[from] KlaviyoError),
}

impl AppError {
    /// Validation failure for a missing or empty email.
    #[must_use]
    pub fn email_required() -> Self {
        Self::Validation(EMAIL_REQUIRED.to_string())
    }

    /// HTTP status this error is answered with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Account(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Upstream(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Klaviyo request failed"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let status = self.status();
        let body = ApiStatus::new(status.as_u16(), self.to_string());

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
