//! Upstream service traits: one per external collaborator.
//!
//! Implementations translate every failure into [`AgendaError`](crate::error::AgendaError)
//! before returning, so callers only ever see the typed taxonomy.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    Address, BearerToken, LoginRequest, NotificationRequest, NotificationStatus, Phone, Task,
    TaskRequest, TimeWindow, UserRequest, UserResponse,
};

/// Exchanges credentials for a bearer token.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, credentials: &LoginRequest) -> Result<BearerToken>;
}

/// The task service: owns task storage and the notification status field.
#[async_trait]
pub trait TaskService: Send + Sync {
    async fn create_task(&self, task: &TaskRequest, token: &BearerToken) -> Result<Task>;

    /// Tasks whose event time falls in `window`, in whatever order the service returns them.
    async fn tasks_in_window(&self, window: &TimeWindow, token: &BearerToken) -> Result<Vec<Task>>;

    /// Tasks owned by the user the token belongs to.
    async fn tasks_for_owner(&self, token: &BearerToken) -> Result<Vec<Task>>;

    async fn delete_task(&self, id: &str, token: &BearerToken) -> Result<()>;

    async fn update_status(
        &self,
        status: NotificationStatus,
        id: &str,
        token: &BearerToken,
    ) -> Result<Task>;

    async fn update_task(&self, task: &TaskRequest, id: &str, token: &BearerToken) -> Result<Task>;
}

/// Sends the reminder email for a task.
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn notify(&self, request: &NotificationRequest) -> Result<()>;
}

/// The user service. Login is inherited from [`AuthService`].
#[async_trait]
pub trait UserService: AuthService {
    async fn register(&self, user: &UserRequest) -> Result<UserResponse>;

    async fn find_by_email(&self, email: &str, token: &BearerToken) -> Result<UserResponse>;

    async fn delete_by_email(&self, email: &str, token: &BearerToken) -> Result<()>;

    async fn update_user(&self, user: &UserRequest, token: &BearerToken) -> Result<UserResponse>;

    async fn add_address(&self, address: &Address, token: &BearerToken) -> Result<Address>;

    async fn update_address(&self, id: i64, address: &Address, token: &BearerToken) -> Result<Address>;

    async fn add_phone(&self, phone: &Phone, token: &BearerToken) -> Result<Phone>;

    async fn update_phone(&self, id: i64, phone: &Phone, token: &BearerToken) -> Result<Phone>;
}
