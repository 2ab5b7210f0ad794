//! # Agenda Scheduler
//!
//! Periodic notification job for tasks that are about to happen.
//!
//! ```text
//! run_scheduler (cron timer)
//!   └── NotificationCycle::run_cycle
//!         ├── AuthService::login          (service account, once per run)
//!         ├── TaskService::tasks_in_window [now, now + lookahead)
//!         └── for each task, in order:
//!               ├── NotificationService::notify
//!               └── TaskService::update_status(NOTIFIED)
//! ```
//!
//! Every run is appended to an in-memory [`RunHistory`].

pub mod clock;
pub mod cron;
pub mod cycle;
pub mod engine;
pub mod history;

pub use clock::{Clock, FixedClock, SystemClock};
pub use cron::{CronError, CronSchedule};
pub use cycle::{CycleError, CycleReport, NotificationCycle, TaskFailure, TaskStage};
pub use engine::{run_scheduler, spawn_scheduler};
pub use history::{RunHistory, RunOutcome, RunRecord, RunTrigger};
