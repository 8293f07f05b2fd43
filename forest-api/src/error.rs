//! HTTP error responses: `{ "error": <message>, "code": <CODE> }`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use growth::error::GrowthError;
use serde_json::json;
use tracing::warn;

#[derive(Debug)]
pub enum ApiError {
    /// Engine refusal or storage failure.
    Engine(GrowthError),
    /// Request lacks the `x-user-id` header.
    Unauthenticated,
    /// Malformed request body or parameters.
    Validation(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Engine(err) => match err {
                GrowthError::TreeNotFound
                | GrowthError::NoCurrentTree
                | GrowthError::StatsNotFound => StatusCode::NOT_FOUND,
                GrowthError::AlreadyAnswered(_)
                | GrowthError::DailyLimitReached
                | GrowthError::TreeNotReady { .. }
                | GrowthError::InvalidQuestion(_) => StatusCode::BAD_REQUEST,
                GrowthError::PersistenceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Engine(err) => err.code(),
            ApiError::Unauthenticated => "UNAUTHENTICATED",
            ApiError::Validation(_) => "VALIDATION_ERROR",
        }
    }

    fn message(&self) -> String {
        match self {
            // storage details stay in the server log
            ApiError::Engine(GrowthError::PersistenceUnavailable(_)) => {
                "storage temporarily unavailable, try again".to_string()
            }
            ApiError::Engine(err) => err.to_string(),
            ApiError::Unauthenticated => "missing x-user-id header".to_string(),
            ApiError::Validation(msg) => msg.clone(),
        }
    }
}

impl From<GrowthError> for ApiError {
    fn from(err: GrowthError) -> Self {
        ApiError::Engine(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Engine(GrowthError::PersistenceUnavailable(detail)) = &self {
            warn!(detail = %detail, "persistence unavailable");
        }
        let body = json!({ "error": self.message(), "code": self.code() });
        (self.status(), Json(body)).into_response()
    }
}
