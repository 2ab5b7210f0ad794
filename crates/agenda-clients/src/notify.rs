//! Notification service client: posts the task projection, the service renders and sends the email.

use async_trait::async_trait;
use agenda_core::config::UpstreamConfig;
use agenda_core::error::Result;
use agenda_core::traits::NotificationService;
use agenda_core::types::NotificationRequest;

use crate::build_http_client;
use crate::decode::{check, transport_error};

pub struct EmailClient {
    url: String,
    client: reqwest::Client,
}

impl EmailClient {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        Ok(Self::new(
            config.notifications_url.clone(),
            build_http_client(config.request_timeout_secs)?,
        ))
    }
}

#[async_trait]
impl NotificationService for EmailClient {
    async fn notify(&self, request: &NotificationRequest) -> Result<()> {
        const OP: &str = "send notification";
        let resp = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;
        check(OP, resp).await?;
        tracing::debug!(task_id = %request.id, "notification accepted");
        Ok(())
    }
}
