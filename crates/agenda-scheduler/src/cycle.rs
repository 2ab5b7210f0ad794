//! Notification cycle: one scan-and-notify pass over the tasks due soon.
//!
//! Per run:
//! 1. log in with the service account (failure aborts the run),
//! 2. query tasks with an event time in `[now, now + lookahead)`,
//! 3. for each task, in query order: send the notification, then patch its
//!    status to `NOTIFIED`.
//!
//! A failure on one task is recorded and the loop moves on to the next one.
//! Nothing is retried; the next scheduled run is the retry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use agenda_core::config::{MarkPolicy, SchedulerConfig, ServiceAccount};
use agenda_core::error::AgendaError;
use agenda_core::traits::{AuthService, NotificationService, TaskService};
use agenda_core::types::{BearerToken, LoginRequest, NotificationRequest, NotificationStatus, Task, TimeWindow};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

use crate::clock::{Clock, SystemClock};
use crate::history::{RunHistory, RunOutcome, RunRecord, RunTrigger};

/// Failures that end a run before any task is processed.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("service account login failed: {0}")]
    Auth(AgendaError),

    #[error("querying due tasks failed: {0}")]
    Query(AgendaError),

    #[error("a notification cycle is already running")]
    AlreadyRunning,
}

/// Step of the per-task pipeline that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStage {
    Dispatch,
    StatusUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskFailure {
    pub task_id: String,
    pub stage: TaskStage,
    pub kind: &'static str,
    pub error: String,
}

impl TaskFailure {
    fn new(task_id: &str, stage: TaskStage, err: &AgendaError) -> Self {
        Self {
            task_id: task_id.to_string(),
            stage,
            kind: err.kind(),
            error: err.to_string(),
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub started_at: NaiveDateTime,
    pub window: TimeWindow,
    /// Tasks returned by the window query.
    pub found: usize,
    /// Notifications accepted by the notification service.
    pub dispatched: usize,
    /// Tasks patched to `NOTIFIED`.
    pub marked: usize,
    pub failures: Vec<TaskFailure>,
}

impl CycleReport {
    fn new(started_at: NaiveDateTime, window: TimeWindow, found: usize) -> Self {
        Self {
            started_at,
            window,
            found,
            dispatched: 0,
            marked: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Clears the running flag when a run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The scheduled job. Owns its collaborators and settings; holds no per-run state
/// besides the re-entrancy flag.
pub struct NotificationCycle {
    auth: Arc<dyn AuthService>,
    tasks: Arc<dyn TaskService>,
    notifier: Arc<dyn NotificationService>,
    credentials: LoginRequest,
    lookahead: Duration,
    policy: MarkPolicy,
    clock: Arc<dyn Clock>,
    history: Arc<RunHistory>,
    running: AtomicBool,
}

impl NotificationCycle {
    /// A cycle with a one hour lookahead, the default mark policy and the system clock.
    pub fn new(
        auth: Arc<dyn AuthService>,
        tasks: Arc<dyn TaskService>,
        notifier: Arc<dyn NotificationService>,
        credentials: LoginRequest,
    ) -> Self {
        Self {
            auth,
            tasks,
            notifier,
            credentials,
            lookahead: Duration::hours(1),
            policy: MarkPolicy::default(),
            clock: Arc::new(SystemClock),
            history: Arc::new(RunHistory::default()),
            running: AtomicBool::new(false),
        }
    }

    /// Build from the `[scheduler]` and `[service_account]` config sections.
    pub fn from_config(
        config: &SchedulerConfig,
        account: &ServiceAccount,
        auth: Arc<dyn AuthService>,
        tasks: Arc<dyn TaskService>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        Self::new(
            auth,
            tasks,
            notifier,
            LoginRequest::new(account.email.clone(), account.password.clone()),
        )
        .with_lookahead(Duration::minutes(config.lookahead_minutes))
        .with_mark_policy(config.mark_policy)
    }

    pub fn with_lookahead(mut self, lookahead: Duration) -> Self {
        self.lookahead = lookahead;
        self
    }

    pub fn with_mark_policy(mut self, policy: MarkPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_history(mut self, history: Arc<RunHistory>) -> Self {
        self.history = history;
        self
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn history(&self) -> &Arc<RunHistory> {
        &self.history
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one cycle now (manual trigger).
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        self.run_with_trigger(RunTrigger::Manual).await
    }

    /// Run one cycle and append its outcome to the run history.
    pub async fn run_with_trigger(&self, trigger: RunTrigger) -> Result<CycleReport, CycleError> {
        let started_at = self.clock.now();
        let result = match self.try_start() {
            Some(_guard) => self.execute(started_at).await,
            None => {
                tracing::warn!("notification cycle skipped: previous run still in progress");
                Err(CycleError::AlreadyRunning)
            }
        };

        let outcome = match &result {
            Ok(report) => RunOutcome::Completed {
                window: report.window,
                found: report.found,
                dispatched: report.dispatched,
                marked: report.marked,
                failures: report.failures.clone(),
            },
            Err(CycleError::AlreadyRunning) => RunOutcome::Skipped,
            Err(e) => RunOutcome::Failed { error: e.to_string() },
        };
        self.history.record(RunRecord {
            trigger,
            started_at,
            finished_at: self.clock.now(),
            outcome,
        });
        result
    }

    fn try_start(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(&self.running))
    }

    async fn execute(&self, started_at: NaiveDateTime) -> Result<CycleReport, CycleError> {
        let token = self.auth.login(&self.credentials).await.map_err(|e| {
            tracing::error!(error = %e, kind = e.kind(), "notification cycle aborted: login failed");
            CycleError::Auth(e)
        })?;

        let window = TimeWindow::lookahead(self.clock.now(), self.lookahead);
        let due = self.tasks.tasks_in_window(&window, &token).await.map_err(|e| {
            tracing::error!(error = %e, kind = e.kind(), "notification cycle aborted: task query failed");
            CycleError::Query(e)
        })?;

        tracing::info!(
            found = due.len(),
            start = %window.start,
            end = %window.end,
            "notification cycle started"
        );

        let mut report = CycleReport::new(started_at, window, due.len());
        for task in &due {
            self.process(task, &token, &mut report).await;
        }

        tracing::info!(
            found = report.found,
            dispatched = report.dispatched,
            marked = report.marked,
            failed = report.failures.len(),
            "notification cycle finished"
        );
        Ok(report)
    }

    async fn process(&self, task: &Task, token: &BearerToken, report: &mut CycleReport) {
        let request = NotificationRequest::from(task);
        let dispatched = match self.notifier.notify(&request).await {
            Ok(()) => {
                tracing::debug!(task_id = %task.id, owner = %task.owner_email, "notification sent");
                report.dispatched += 1;
                true
            }
            Err(e) => {
                tracing::warn!(task_id = %task.id, error = %e, kind = e.kind(), "notification dispatch failed");
                report.failures.push(TaskFailure::new(&task.id, TaskStage::Dispatch, &e));
                false
            }
        };

        if !dispatched && self.policy == MarkPolicy::OnSuccess {
            return;
        }

        match self
            .tasks
            .update_status(NotificationStatus::Notified, &task.id, token)
            .await
        {
            Ok(_) => {
                tracing::debug!(task_id = %task.id, "task marked notified");
                report.marked += 1;
            }
            Err(e) => {
                tracing::warn!(task_id = %task.id, error = %e, kind = e.kind(), "status update failed");
                report.failures.push(TaskFailure::new(&task.id, TaskStage::StatusUpdate, &e));
            }
        }
    }
}
