//! Error responses: `{"ok": false, "error": "..."}` with the mapped status.

use agenda_core::error::AgendaError;
use agenda_scheduler::CycleError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<AgendaError> for ApiError {
    fn from(err: AgendaError) -> Self {
        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::warn!(error = %err, kind = err.kind(), "upstream call failed");
        } else {
            tracing::debug!(error = %err, kind = err.kind(), "upstream call rejected");
        }
        Self::new(status, err.to_string())
    }
}

impl From<CycleError> for ApiError {
    fn from(err: CycleError) -> Self {
        let status = match &err {
            CycleError::AlreadyRunning => StatusCode::CONFLICT,
            CycleError::Auth(_) | CycleError::Query(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({"ok": false, "error": self.message}));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agenda_error_status_mapping() {
        let cases = [
            (AgendaError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AgendaError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AgendaError::AuthFailed("x".into()), StatusCode::UNAUTHORIZED),
            (AgendaError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AgendaError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AgendaError::Conflict("x".into()), StatusCode::CONFLICT),
            (AgendaError::upstream("x"), StatusCode::BAD_GATEWAY),
            (AgendaError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_cycle_error_mapping() {
        assert_eq!(ApiError::from(CycleError::AlreadyRunning).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::from(CycleError::Auth(AgendaError::AuthFailed("no".into()))).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
