//! # Agenda Core
//!
//! Shared building blocks for the Agenda gateway:
//! - `config`: TOML configuration with env overrides
//! - `error`: the error taxonomy every upstream call resolves to
//! - `types`: wire types exchanged with the user, task and notification services
//! - `traits`: async contracts for those services

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::AgendaConfig;
pub use error::{AgendaError, Result};
pub use traits::{AuthService, NotificationService, TaskService, UserService};
pub use types::{BearerToken, LoginRequest, NotificationRequest, NotificationStatus, Task, TimeWindow};
