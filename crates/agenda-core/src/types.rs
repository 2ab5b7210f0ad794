//! Wire types shared by the clients, the scheduler and the gateway.
//!
//! Field names on the wire follow the upstream services (`nomeTarefa`,
//! `emailUsuario`, ...); the Rust side uses plain English names.

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date-time encoding used by the task service.
pub mod wire_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Format the task service writes (`dd-MM-yyyy HH:mm:ss`).
    pub const WIRE_FORMAT: &str = "%d-%m-%Y %H:%M:%S";
    /// ISO-8601 local date-time, used for query parameters.
    pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    /// Parse either the wire format or ISO-8601 (fractional seconds allowed).
    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        NaiveDateTime::parse_from_str(s, WIRE_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
    }

    /// Render as an ISO-8601 query parameter.
    pub fn to_iso(t: &NaiveDateTime) -> String {
        t.format(ISO_FORMAT).to_string()
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(t) => serializer.serialize_str(&t.format(WIRE_FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(s) => parse(s)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid date-time: '{s}'"))),
            }
        }
    }
}

/// Notification state of a task, owned by the task service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NotificationStatus {
    #[default]
    #[serde(rename = "PENDENTE", alias = "PENDING")]
    Pending,
    #[serde(rename = "NOTIFICADO", alias = "NOTIFIED")]
    Notified,
    #[serde(rename = "CANCELADO", alias = "CANCELLED")]
    Cancelled,
    /// Any status this gateway does not know about.
    #[serde(other)]
    Unknown,
}

impl NotificationStatus {
    /// Value the task service expects in query parameters.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Pending => "PENDENTE",
            Self::Notified => "NOTIFICADO",
            Self::Cancelled => "CANCELADO",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// A scheduled task as returned by the task service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "nomeTarefa", default)]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(
        rename = "dataCriacao",
        default,
        with = "wire_time::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<NaiveDateTime>,
    #[serde(
        rename = "dataEvento",
        default,
        with = "wire_time::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_at: Option<NaiveDateTime>,
    #[serde(rename = "emailUsuario", default)]
    pub owner_email: String,
    #[serde(
        rename = "dataAlteracao",
        default,
        with = "wire_time::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(rename = "statusNotificacaoEnum", default)]
    pub status: NotificationStatus,
}

/// Body for creating or replacing a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    #[serde(rename = "nomeTarefa", default)]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(
        rename = "dataEvento",
        default,
        with = "wire_time::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_at: Option<NaiveDateTime>,
}

/// The part of a task the notification service needs to build an email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub id: String,
    #[serde(rename = "emailUsuario")]
    pub owner_email: String,
    #[serde(rename = "nomeTarefa")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(
        rename = "dataEvento",
        default,
        with = "wire_time::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_at: Option<NaiveDateTime>,
    #[serde(rename = "statusNotificacaoEnum")]
    pub status: NotificationStatus,
}

impl From<&Task> for NotificationRequest {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            owner_email: task.owner_email.clone(),
            name: task.name.clone(),
            description: task.description.clone(),
            event_at: task.event_at,
            status: task.status,
        }
    }
}

/// Credentials exchanged for a bearer token.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Opaque credential presented on every authenticated upstream call.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    /// Build from an incoming `Authorization` header value. Blank values are rejected.
    pub fn from_header(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            Some(Self::new(value))
        }
    }

    /// Value for the outgoing `Authorization` header.
    ///
    /// The user service already answers login with `Bearer <jwt>`; a bare
    /// token gets the scheme prepended.
    pub fn header_value(&self) -> String {
        let has_scheme = self
            .0
            .get(..7)
            .is_some_and(|p| p.eq_ignore_ascii_case("bearer "));
        if has_scheme {
            self.0.clone()
        } else {
            format!("Bearer {}", self.0)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Half-open interval `[start, end)` of local date-times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// The window `[now, now + ahead)`, with `now` rounded up to a whole second.
    ///
    /// Query parameters carry second precision, so the bounds are aligned to
    /// what the task service actually receives.
    pub fn lookahead(now: NaiveDateTime, ahead: Duration) -> Self {
        let nanos = now.nanosecond();
        let start = if nanos == 0 {
            now
        } else {
            now - Duration::nanoseconds(i64::from(nanos)) + Duration::seconds(1)
        };
        Self {
            start,
            end: start + ahead,
        }
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Postal address attached to a user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "rua", default)]
    pub street: String,
    #[serde(rename = "numero", default)]
    pub number: Option<i64>,
    #[serde(rename = "complemento", default)]
    pub complement: Option<String>,
    #[serde(rename = "cidade", default)]
    pub city: String,
    #[serde(rename = "estado", default)]
    pub state: String,
    #[serde(rename = "cep", default)]
    pub zip_code: String,
}

/// Phone number attached to a user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Phone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "numero", default)]
    pub number: String,
    #[serde(rename = "ddd", default)]
    pub area_code: String,
}

/// Body for registering or updating a user.
#[derive(Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserRequest {
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "senha", default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(rename = "enderecos", default)]
    pub addresses: Vec<Address>,
    #[serde(rename = "telefones", default)]
    pub phones: Vec<Phone>,
}

impl fmt::Debug for UserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("addresses", &self.addresses)
            .field("phones", &self.phones)
            .finish()
    }
}

/// A user as returned by the user service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserResponse {
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "enderecos", default)]
    pub addresses: Vec<Address>,
    #[serde(rename = "telefones", default)]
    pub phones: Vec<Phone>,
}
