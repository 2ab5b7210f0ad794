//! API route handlers for the gateway.
//!
//! Task and user endpoints forward to exactly one upstream call with the
//! caller's `Authorization` header and relay the result.

use std::sync::Arc;

use agenda_core::types::{
    Address, BearerToken, LoginRequest, NotificationStatus, Phone, Task, TaskRequest, TimeWindow,
    UserRequest, UserResponse, wire_time,
};
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use serde::Deserialize;

use crate::error::ApiError;
use crate::server::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// The caller's bearer token, forwarded upstream as-is.
/// Requests without one are answered 401 before any upstream call.
#[derive(Debug, Clone)]
pub struct CallerToken(pub BearerToken);

impl<S: Send + Sync> FromRequestParts<S> for CallerToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(BearerToken::from_header)
            .map(CallerToken)
            .ok_or_else(|| ApiError::unauthorized("missing Authorization header"))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    #[serde(alias = "dataInicial")]
    pub start: Option<String>,
    #[serde(alias = "dataFinal")]
    pub end: Option<String>,
}

fn required<'a>(value: &'a Option<String>, name: &str) -> ApiResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("missing query parameter '{name}'")))
}

fn required_id(value: &Option<String>) -> ApiResult<i64> {
    let raw = required(value, "id")?;
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("'{raw}' is not a valid id")))
}

fn parse_time(value: &Option<String>, name: &str) -> ApiResult<chrono::NaiveDateTime> {
    let raw = required(value, name)?;
    wire_time::parse(raw).ok_or_else(|| {
        ApiError::bad_request(format!(
            "'{raw}' is not a date-time (expected yyyy-MM-ddTHH:mm:ss or dd-MM-yyyy HH:mm:ss)"
        ))
    })
}

fn parse_status(raw: &str) -> ApiResult<NotificationStatus> {
    let value = serde_json::Value::String(raw.to_uppercase());
    match serde_json::from_value(value) {
        Ok(NotificationStatus::Unknown) | Err(_) => {
            Err(ApiError::bad_request(format!("unknown notification status '{raw}'")))
        }
        Ok(status) => Ok(status),
    }
}

// ---- Health ----

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let scheduler = match &state.cycle {
        Some(cycle) => serde_json::json!({
            "enabled": true,
            "running": cycle.is_running(),
            "last_run": cycle.history().latest(),
        }),
        None => serde_json::json!({"enabled": false}),
    };
    Json(serde_json::json!({
        "status": "ok",
        "service": "agenda-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "scheduler": scheduler,
    }))
}

// ---- Tasks ----

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    CallerToken(token): CallerToken,
    Json(body): Json<TaskRequest>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.tasks.create_task(&body, &token).await?))
}

/// Tasks with an event time in `[start, end)`.
pub async fn tasks_in_window(
    State(state): State<Arc<AppState>>,
    CallerToken(token): CallerToken,
    Query(query): Query<WindowQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let window = TimeWindow::new(parse_time(&query.start, "start")?, parse_time(&query.end, "end")?);
    if window.end < window.start {
        return Err(ApiError::bad_request("end must not be before start"));
    }
    Ok(Json(state.tasks.tasks_in_window(&window, &token).await?))
}

/// Tasks owned by the caller.
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    CallerToken(token): CallerToken,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.tasks.tasks_for_owner(&token).await?))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    CallerToken(token): CallerToken,
    Query(query): Query<IdQuery>,
) -> ApiResult<StatusCode> {
    state.tasks.delete_task(required(&query.id, "id")?, &token).await?;
    Ok(StatusCode::OK)
}

pub async fn update_task_status(
    State(state): State<Arc<AppState>>,
    CallerToken(token): CallerToken,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<Task>> {
    let status = parse_status(required(&query.status, "status")?)?;
    let id = required(&query.id, "id")?;
    Ok(Json(state.tasks.update_status(status, id, &token).await?))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    CallerToken(token): CallerToken,
    Query(query): Query<IdQuery>,
    Json(body): Json<TaskRequest>,
) -> ApiResult<Json<Task>> {
    let id = required(&query.id, "id")?;
    Ok(Json(state.tasks.update_task(&body, id, &token).await?))
}

// ---- Users ----

pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UserRequest>,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(state.users.register(&body).await?))
}

/// Exchange credentials for a token; the body is the raw `Bearer ...` text.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<String> {
    let token = state.users.login(&body).await?;
    Ok(token.header_value())
}

pub async fn find_user(
    State(state): State<Arc<AppState>>,
    CallerToken(token): CallerToken,
    Query(query): Query<EmailQuery>,
) -> ApiResult<Json<UserResponse>> {
    let email = required(&query.email, "email")?;
    Ok(Json(state.users.find_by_email(email, &token).await?))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    CallerToken(token): CallerToken,
    Path(email): Path<String>,
) -> ApiResult<StatusCode> {
    state.users.delete_by_email(&email, &token).await?;
    Ok(StatusCode::OK)
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    CallerToken(token): CallerToken,
    Json(body): Json<UserRequest>,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(state.users.update_user(&body, &token).await?))
}

pub async fn add_address(
    State(state): State<Arc<AppState>>,
    CallerToken(token): CallerToken,
    Json(body): Json<Address>,
) -> ApiResult<Json<Address>> {
    Ok(Json(state.users.add_address(&body, &token).await?))
}

pub async fn update_address(
    State(state): State<Arc<AppState>>,
    CallerToken(token): CallerToken,
    Query(query): Query<IdQuery>,
    Json(body): Json<Address>,
) -> ApiResult<Json<Address>> {
    let id = required_id(&query.id)?;
    Ok(Json(state.users.update_address(id, &body, &token).await?))
}

pub async fn add_phone(
    State(state): State<Arc<AppState>>,
    CallerToken(token): CallerToken,
    Json(body): Json<Phone>,
) -> ApiResult<Json<Phone>> {
    Ok(Json(state.users.add_phone(&body, &token).await?))
}

pub async fn update_phone(
    State(state): State<Arc<AppState>>,
    CallerToken(token): CallerToken,
    Query(query): Query<IdQuery>,
    Json(body): Json<Phone>,
) -> ApiResult<Json<Phone>> {
    let id = required_id(&query.id)?;
    Ok(Json(state.users.update_phone(id, &body, &token).await?))
}

// ---- Scheduler ----

/// Recent notification cycle runs, oldest first.
pub async fn scheduler_runs(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    match &state.cycle {
        Some(cycle) => Json(serde_json::json!({
            "ok": true,
            "enabled": true,
            "running": cycle.is_running(),
            "runs": cycle.history().snapshot(),
        })),
        None => Json(serde_json::json!({
            "ok": true,
            "enabled": false,
            "running": false,
            "runs": [],
        })),
    }
}

/// Run one notification cycle now. Answers 409 if one is already running.
///
/// The caller's token is checked against the task service first; the gateway
/// holds no credentials of its own to judge it by.
pub async fn scheduler_run_now(
    State(state): State<Arc<AppState>>,
    CallerToken(token): CallerToken,
) -> ApiResult<Json<serde_json::Value>> {
    let cycle = state
        .cycle
        .clone()
        .ok_or_else(|| ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "scheduler is disabled"))?;
    state.tasks.tasks_for_owner(&token).await?;
    tracing::info!("manual notification cycle requested");

    // detached so a dropped request cannot cut a run short and lose its history entry
    let run = tokio::spawn(async move { cycle.run_cycle().await });
    let report = run.await.map_err(|e| {
        tracing::error!(error = %e, "manual notification cycle task failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "notification cycle aborted")
    })??;
    Ok(Json(serde_json::json!({"ok": true, "report": report})))
}
