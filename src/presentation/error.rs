// Mapping of service errors onto HTTP responses
use crate::application::error::ServiceError;
use crate::application::telemetry_repository::FetchError;
use crate::domain::error::{CoreError, ValidationError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    MissingIdentity,
    BadRequest(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Service(err.into())
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::MissingIdentity => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "missing or invalid x-user-id / x-user-role headers".to_string(),
            ),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "bad_request", message.clone())
            }
            ApiError::Service(ServiceError::Core(err)) => {
                let (status, kind) = match err {
                    CoreError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
                    CoreError::AccessDenied => (StatusCode::FORBIDDEN, "access_denied"),
                    CoreError::MalformedInput(_) => (StatusCode::BAD_GATEWAY, "malformed_input"),
                    CoreError::Selection(_) => (StatusCode::CONFLICT, "selection"),
                };
                (status, kind, err.to_string())
            }
            ApiError::Service(ServiceError::Fetch(err)) => {
                let (status, kind) = match err {
                    FetchError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                    FetchError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
                    FetchError::Network(_) => (StatusCode::BAD_GATEWAY, "network"),
                    FetchError::Status { .. } | FetchError::Decode(_) => {
                        (StatusCode::BAD_GATEWAY, "upstream")
                    }
                };
                (status, kind, err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = self.parts();
        if status.is_server_error() {
            tracing::error!("{}: {}", kind, message);
        } else {
            tracing::debug!("{}: {}", kind, message);
        }
        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}
