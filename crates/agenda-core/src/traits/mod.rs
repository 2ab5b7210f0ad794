//! Async contracts for the upstream services.

pub mod upstream;

pub use self::upstream::{AuthService, NotificationService, TaskService, UserService};
