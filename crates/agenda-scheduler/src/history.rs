//! Run history: in-memory ring buffer of the last notification cycles.

use std::collections::VecDeque;
use std::sync::Mutex;

use agenda_core::types::TimeWindow;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::cycle::TaskFailure;

/// Records kept when no capacity is given.
pub const DEFAULT_CAPACITY: usize = 50;

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    Schedule,
    Manual,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed {
        window: TimeWindow,
        found: usize,
        dispatched: usize,
        marked: usize,
        failures: Vec<TaskFailure>,
    },
    Failed {
        error: String,
    },
    /// Another run was still in progress.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub trigger: RunTrigger,
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    #[serde(flatten)]
    pub outcome: RunOutcome,
}

/// Bounded history, oldest first.
#[derive(Debug)]
pub struct RunHistory {
    capacity: usize,
    records: Mutex<VecDeque<RunRecord>>,
}

impl RunHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn record(&self, record: RunRecord) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.push_back(record);
        while records.len() > self.capacity {
            records.pop_front();
        }
    }

    pub fn snapshot(&self) -> Vec<RunRecord> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<RunRecord> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.back().cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RunHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
