//! Response envelope shared by every endpoint.
//!
//! All bodies, successful or not, are wrapped as
//!
//! ```json
//! { "httpStatusCode": 200, "data": { ... } }
//! ```
//!
//! and the HTTP status line always matches `httpStatusCode`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Generic API response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub http_status_code: u16,
    pub data: T,
}

/// Payload carried by error envelopes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Error classification, e.g. `ValidationError` or `TokenExpiredError`
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn with_status(status: StatusCode, data: T) -> Self {
        Self {
            http_status_code: status.as_u16(),
            data,
        }
    }

    pub fn ok(data: T) -> Self {
        Self::with_status(StatusCode::OK, data)
    }

    pub fn created(data: T) -> Self {
        Self::with_status(StatusCode::CREATED, data)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl ApiResponse<ErrorBody> {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, ErrorBody::new("ValidationError", message))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED, ErrorBody::new("UnauthorizedError", message))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::FORBIDDEN, ErrorBody::new("Forbidden", message))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, ErrorBody::new("NotFound", message))
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::UNPROCESSABLE_ENTITY, ErrorBody::new("Unprocessable", message))
    }

    pub fn internal_error() -> Self {
        Self::with_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::new("InternalServerError", "Internal server error"),
        )
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Body returned by delete endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deleted<Id> {
    pub id: Id,
    pub deleted: bool,
}

impl<Id> Deleted<Id> {
    pub fn new(id: Id) -> Self {
        Self { id, deleted: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_serialises_camel_case() {
        let body = serde_json::to_value(ApiResponse::ok(json!({"name": "flour"}))).unwrap();
        assert_eq!(body, json!({"httpStatusCode": 200, "data": {"name": "flour"}}));
    }

    #[test]
    fn test_error_helpers() {
        let cases = [
            (ApiResponse::bad_request("x"), 400, "ValidationError"),
            (ApiResponse::unauthorized("x"), 401, "UnauthorizedError"),
            (ApiResponse::forbidden("x"), 403, "Forbidden"),
            (ApiResponse::not_found("x"), 404, "NotFound"),
            (ApiResponse::unprocessable("x"), 422, "Unprocessable"),
            (ApiResponse::internal_error(), 500, "InternalServerError"),
        ];
        for (resp, code, name) in cases {
            assert_eq!(resp.http_status_code, code);
            assert_eq!(resp.data.error, name);
        }
    }

    #[test]
    fn test_response_status_matches_envelope() {
        let response = ApiResponse::created(json!({})).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        let response = ApiResponse::not_found("gone").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
