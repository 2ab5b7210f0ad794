//! # Agenda Gateway
//!
//! Backend-for-frontend HTTP API. Task and user endpoints forward to the
//! upstream services with the caller's bearer token; scheduler endpoints
//! expose the notification cycle's run history and a manual trigger.

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, build_router, start};
