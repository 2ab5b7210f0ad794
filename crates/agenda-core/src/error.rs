//! Error taxonomy for upstream calls and local setup.

use thiserror::Error;

/// Every failure an Agenda component can surface.
///
/// Upstream HTTP failures are decoded into the first six variants by the
/// client layer; callers never look at raw status codes.
#[derive(Debug, Error)]
pub enum AgendaError {
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// 5xx, unexpected statuses, transport errors and undecodable bodies.
    #[error("Upstream failure{}: {message}", status_suffix(.status))]
    Upstream { status: Option<u16>, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AgendaError>;

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl AgendaError {
    /// Shorthand for an upstream failure without an HTTP status.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            status: None,
            message: message.into(),
        }
    }

    /// HTTP status the gateway answers with when relaying this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::AuthFailed(_) | Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Upstream { .. } => 502,
            Self::Config(_) | Self::Io(_) => 500,
        }
    }

    /// Short stable name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthFailed(_) => "auth_failed",
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Upstream { .. } => "upstream",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_display_with_and_without_status() {
        let with = AgendaError::Upstream {
            status: Some(503),
            message: "down".into(),
        };
        assert_eq!(with.to_string(), "Upstream failure (503): down");
        assert_eq!(AgendaError::upstream("reset").to_string(), "Upstream failure: reset");
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(AgendaError::BadRequest(String::new()).http_status(), 400);
        assert_eq!(AgendaError::AuthFailed(String::new()).http_status(), 401);
        assert_eq!(AgendaError::Forbidden(String::new()).http_status(), 403);
        assert_eq!(AgendaError::NotFound(String::new()).http_status(), 404);
        assert_eq!(AgendaError::Conflict(String::new()).http_status(), 409);
        assert_eq!(AgendaError::upstream("x").http_status(), 502);
        assert_eq!(AgendaError::Config(String::new()).http_status(), 500);
    }
}
