//! HTTP server implementation using Axum.

use std::future::Future;
use std::sync::Arc;

use agenda_core::config::GatewayConfig;
use agenda_core::traits::{TaskService, UserService};
use agenda_scheduler::NotificationCycle;
use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<dyn TaskService>,
    pub users: Arc<dyn UserService>,
    /// Notification cycle, when the scheduler is enabled.
    pub cycle: Option<Arc<NotificationCycle>>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(tasks: Arc<dyn TaskService>, users: Arc<dyn UserService>) -> Self {
        Self {
            tasks,
            users,
            cycle: None,
            start_time: std::time::Instant::now(),
        }
    }

    pub fn with_cycle(mut self, cycle: Arc<NotificationCycle>) -> Self {
        self.cycle = Some(cycle);
        self
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    build_router_from_arc(Arc::new(state))
}

pub fn build_router_from_arc(shared: Arc<AppState>) -> Router {
    // Task service pass-through
    let tasks = Router::new()
        .route(
            "/tasks",
            get(routes::list_tasks)
                .post(routes::create_task)
                .put(routes::update_task)
                .patch(routes::update_task_status)
                .delete(routes::delete_task),
        )
        .route("/tasks/events", get(routes::tasks_in_window));

    // User service pass-through; register and login are public upstream too
    let users = Router::new()
        .route(
            "/users",
            get(routes::find_user)
                .post(routes::register_user)
                .put(routes::update_user),
        )
        .route("/users/login", post(routes::login))
        .route("/users/{email}", delete(routes::delete_user))
        .route(
            "/users/address",
            post(routes::add_address).put(routes::update_address),
        )
        .route(
            "/users/phone",
            post(routes::add_phone).put(routes::update_phone),
        );

    let ops = Router::new()
        .route("/health", get(routes::health_check))
        .route("/api/v1/scheduler/runs", get(routes::scheduler_runs))
        .route("/api/v1/scheduler/run", post(routes::scheduler_run_now));

    tasks
        .merge(users)
        .merge(ops)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

fn cors_layer() -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    // Example: AGENDA_CORS_ORIGINS=https://agenda.example.com,https://admin.example.com
    if let Ok(origins_str) = std::env::var("AGENDA_CORS_ORIGINS") {
        let origins: Vec<_> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();
        cors.allow_origin(origins)
    } else {
        cors.allow_origin(Any)
    }
}

/// Start the HTTP server and serve until `shutdown` resolves.
pub async fn start(
    config: &GatewayConfig,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Gateway server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("Gateway server stopped");
    Ok(())
}
