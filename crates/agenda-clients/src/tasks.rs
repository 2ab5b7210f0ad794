//! Task service client.

use async_trait::async_trait;
use agenda_core::config::UpstreamConfig;
use agenda_core::error::Result;
use agenda_core::traits::TaskService;
use agenda_core::types::{BearerToken, NotificationStatus, Task, TaskRequest, TimeWindow, wire_time};

use crate::decode::{check, json, transport_error};
use crate::{build_http_client, join_url};

/// Talks to the task service rooted at `base_url` (e.g. `http://host/tarefas`).
pub struct TasksClient {
    base_url: String,
    client: reqwest::Client,
}

impl TasksClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        Ok(Self::new(
            config.tasks_url.clone(),
            build_http_client(config.request_timeout_secs)?,
        ))
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    fn authed(&self, req: reqwest::RequestBuilder, token: &BearerToken) -> reqwest::RequestBuilder {
        req.header(reqwest::header::AUTHORIZATION, token.header_value())
    }
}

#[async_trait]
impl TaskService for TasksClient {
    async fn create_task(&self, task: &TaskRequest, token: &BearerToken) -> Result<Task> {
        const OP: &str = "create task";
        let resp = self
            .authed(self.client.post(self.url("")), token)
            .json(task)
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;
        json(OP, resp).await
    }

    async fn tasks_in_window(&self, window: &TimeWindow, token: &BearerToken) -> Result<Vec<Task>> {
        const OP: &str = "query tasks by period";
        let start = wire_time::to_iso(&window.start);
        let end = wire_time::to_iso(&window.end);
        tracing::debug!(%start, %end, "querying tasks in window");
        let resp = self
            .authed(self.client.get(self.url("eventos")), token)
            .query(&[("dataInicial", start.as_str()), ("dataFinal", end.as_str())])
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;
        json(OP, resp).await
    }

    async fn tasks_for_owner(&self, token: &BearerToken) -> Result<Vec<Task>> {
        const OP: &str = "list owner tasks";
        let resp = self
            .authed(self.client.get(self.url("")), token)
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;
        json(OP, resp).await
    }

    async fn delete_task(&self, id: &str, token: &BearerToken) -> Result<()> {
        const OP: &str = "delete task";
        let resp = self
            .authed(self.client.delete(self.url("")), token)
            .query(&[("id", id)])
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;
        check(OP, resp).await?;
        Ok(())
    }

    async fn update_status(
        &self,
        status: NotificationStatus,
        id: &str,
        token: &BearerToken,
    ) -> Result<Task> {
        const OP: &str = "patch task status";
        let resp = self
            .authed(self.client.patch(self.url("")), token)
            .query(&[("status", status.as_wire()), ("id", id)])
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;
        json(OP, resp).await
    }

    async fn update_task(&self, task: &TaskRequest, id: &str, token: &BearerToken) -> Result<Task> {
        const OP: &str = "update task";
        let resp = self
            .authed(self.client.put(self.url("")), token)
            .query(&[("id", id)])
            .json(task)
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;
        json(OP, resp).await
    }
}
