//! Upstream response decoding.

use agenda_core::error::{AgendaError, Result};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

/// Translate a non-success status and its body into the error taxonomy.
pub fn error_from_status(status: StatusCode, body: &str) -> AgendaError {
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("no details").to_string()
    } else {
        body.trim().to_string()
    };

    match status {
        StatusCode::BAD_REQUEST => AgendaError::BadRequest(message),
        StatusCode::UNAUTHORIZED => AgendaError::Unauthorized(message),
        StatusCode::FORBIDDEN => AgendaError::Forbidden(message),
        StatusCode::NOT_FOUND => AgendaError::NotFound(message),
        StatusCode::CONFLICT => AgendaError::Conflict(message),
        _ => AgendaError::Upstream {
            status: Some(status.as_u16()),
            message,
        },
    }
}

/// Map a transport-level failure (connect, timeout, reset).
pub(crate) fn transport_error(operation: &str, err: reqwest::Error) -> AgendaError {
    AgendaError::upstream(format!("{operation}: {err}"))
}

/// Pass a successful response through, decode anything else.
pub(crate) async fn check(operation: &str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::debug!(operation, status = status.as_u16(), "upstream call rejected");
    Err(error_from_status(status, &body))
}

/// Check the status, then decode a JSON body.
pub(crate) async fn json<T: DeserializeOwned>(operation: &str, resp: Response) -> Result<T> {
    let resp = check(operation, resp).await?;
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| transport_error(operation, e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AgendaError::upstream(format!("{operation}: undecodable response body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            error_from_status(StatusCode::BAD_REQUEST, "bad status"),
            AgendaError::BadRequest(m) if m == "bad status"
        ));
        assert!(matches!(error_from_status(StatusCode::UNAUTHORIZED, ""), AgendaError::Unauthorized(_)));
        assert!(matches!(error_from_status(StatusCode::FORBIDDEN, ""), AgendaError::Forbidden(_)));
        assert!(matches!(error_from_status(StatusCode::NOT_FOUND, ""), AgendaError::NotFound(_)));
        assert!(matches!(error_from_status(StatusCode::CONFLICT, ""), AgendaError::Conflict(_)));
        assert!(matches!(
            error_from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            AgendaError::Upstream { status: Some(500), .. }
        ));
        assert!(matches!(
            error_from_status(StatusCode::SERVICE_UNAVAILABLE, ""),
            AgendaError::Upstream { status: Some(503), .. }
        ));
    }

    #[test]
    fn test_empty_body_uses_reason_phrase() {
        let err = error_from_status(StatusCode::NOT_FOUND, "  ");
        assert_eq!(err.to_string(), "Not found: Not Found");
    }
}
