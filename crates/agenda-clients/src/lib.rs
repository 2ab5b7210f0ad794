//! # Agenda Clients
//!
//! reqwest implementations of the upstream contracts in `agenda_core::traits`:
//! - [`UsersClient`]: login and user management
//! - [`TasksClient`]: task CRUD, window queries and status patches
//! - [`EmailClient`]: reminder dispatch
//!
//! Non-success responses go through [`decode::error_from_status`], the single
//! place where HTTP statuses become [`agenda_core::AgendaError`] variants.

pub mod decode;
pub mod notify;
pub mod tasks;
pub mod users;

pub use notify::EmailClient;
pub use tasks::TasksClient;
pub use users::UsersClient;

use agenda_core::error::{AgendaError, Result};
use std::time::Duration;

/// Build the shared HTTP client for one upstream.
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|e| AgendaError::Config(format!("Failed to build HTTP client: {e}")))
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}
