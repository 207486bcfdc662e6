//! Application error types and Axum response conversion.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use orderdesk_core::{NormalizeError, UpstreamError};
use serde::Serialize;
use tracing::warn;

/// Application-level errors with HTTP status code mapping.
#[derive(Debug, PartialEq)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    BadGateway(String),
    ServiceUnavailable(String),
    GatewayTimeout(String),
    Internal(String),
}

impl AppError {
    /// Maps a collaborator failure to a caller-safe error naming `service`.
    pub fn upstream(service: &str, err: &UpstreamError) -> Self {
        match err {
            UpstreamError::Connectivity(_) => {
                AppError::ServiceUnavailable(format!("The {service} is currently unreachable."))
            }
            UpstreamError::Timeout => {
                AppError::GatewayTimeout(format!("The {service} did not respond in time."))
            }
            UpstreamError::ClientStatus { .. }
            | UpstreamError::ServerStatus { .. }
            | UpstreamError::Decode(_) => {
                AppError::BadGateway(format!("The {service} is currently unavailable."))
            }
            UpstreamError::RunFailed { .. } => {
                AppError::BadGateway(format!("The {service} failed to process the request."))
            }
            UpstreamError::Database(_) => {
                AppError::Internal("An internal server error occurred.".into())
            }
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<NormalizeError> for AppError {
    fn from(e: NormalizeError) -> Self {
        match e {
            NormalizeError::MissingIdentifier => {
                AppError::NotFound("No order found for that customer.".into())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body ({}): {}", rejection.status(), rejection.body_text());
        AppError::BadRequest("Request body must be a JSON object with a \"message\" string.".into())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        warn!("Rejected request path ({}): {}", rejection.status(), rejection.body_text());
        AppError::BadRequest("The customer name in the request path is not valid.".into())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (AppError::BadRequest(detail)
        | AppError::NotFound(detail)
        | AppError::BadGateway(detail)
        | AppError::ServiceUnavailable(detail)
        | AppError::GatewayTimeout(detail)
        | AppError::Internal(detail)) = self;
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_upstream_failure_has_distinct_mapping() {
        let service = "order status service";
        let cases = [
            (UpstreamError::Connectivity("refused".into()), StatusCode::SERVICE_UNAVAILABLE),
            (UpstreamError::Timeout, StatusCode::GATEWAY_TIMEOUT),
            (UpstreamError::from_status(403, "no"), StatusCode::BAD_GATEWAY),
            (UpstreamError::from_status(500, "boom"), StatusCode::BAD_GATEWAY),
            (UpstreamError::Decode("eof".into()), StatusCode::BAD_GATEWAY),
            (
                UpstreamError::RunFailed { status: "failed".into(), detail: String::new() },
                StatusCode::BAD_GATEWAY,
            ),
            (UpstreamError::Database("locked".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::upstream(service, &err).status(), expected, "{err}");
        }
    }

    #[test]
    fn test_upstream_detail_is_not_leaked() {
        let err = UpstreamError::ServerStatus { status: 500, body: "stack trace".into() };
        let AppError::BadGateway(detail) = AppError::upstream("AI agent", &err) else {
            panic!("expected bad gateway");
        };
        assert_eq!(detail, "The AI agent is currently unavailable.");
    }

    #[test]
    fn test_missing_identifier_is_not_found() {
        assert_eq!(
            AppError::from(NormalizeError::MissingIdentifier).status(),
            StatusCode::NOT_FOUND
        );
    }
}
