//! API error responses

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::Error;

/// Errors returned by API handlers
///
/// Serialized as `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Service(Error),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self::Service(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Service(e @ Error::InvalidItem(_)) => {
                (StatusCode::BAD_REQUEST, "bad_request", e.to_string())
            }
            Self::Service(e @ Error::Audio(_)) => {
                (StatusCode::BAD_REQUEST, "audio_format", e.to_string())
            }
            Self::Service(e @ Error::Stt(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "speech_unavailable",
                e.to_string(),
            ),
            Self::Service(e) => {
                tracing::error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", e.to_string())
            }
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}
