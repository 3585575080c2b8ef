//! Participant session: what the runners record into and what the report is
//! built from.

mod report;
mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::task::{ItemOutcome, TaskKind};

pub use report::{Report, ReportSummary, SessionInfo, TaskSummary};
pub use store::PersistentSession;

/// Collaborator a [`TaskRunner`](crate::task::TaskRunner) reports into.
///
/// Implementations must not fail the caller: persistence problems are
/// theirs to log and swallow.
pub trait SessionRecorder {
    fn start_task(&mut self, kind: TaskKind);

    fn record_response(&mut self, kind: TaskKind, outcome: ItemOutcome);

    fn complete_task(&mut self, kind: TaskKind);

    fn export_results(&self) -> Report;
}

/// Everything recorded for one task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// One outcome per item, in the order items resolved.
    pub outcomes: Vec<ItemOutcome>,
    pub is_completed: bool,
}

impl TaskRecord {
    pub fn total_attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn total_correct(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_correct).count()
    }

    /// 0.0 .. 100.0; 0 when nothing was attempted.
    pub fn accuracy_pct(&self) -> f64 {
        percentage(self.total_correct(), self.total_attempted())
    }

    pub fn mean_response_ms(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        let total: u64 = self.outcomes.iter().map(|o| o.response_time_ms).sum();
        total as f64 / self.outcomes.len() as f64
    }
}

pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// One participant's run through the assessment.
///
/// Created at assessment start and replaced on reset; runners receive it as
/// `&mut dyn SessionRecorder`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Task in progress, or the one to run next.
    pub current_task: Option<TaskKind>,
    pub tasks: BTreeMap<TaskKind, TaskRecord>,
    pub is_completed: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            session_id: format!("session_{}", uuid::Uuid::new_v4().simple()),
            started_at: Utc::now(),
            completed_at: None,
            current_task: Some(TaskKind::Math),
            tasks: TaskKind::ALL
                .iter()
                .map(|kind| (*kind, TaskRecord::default()))
                .collect(),
            is_completed: false,
        }
    }

    /// Record for `kind`. Sessions always carry all three.
    pub fn task(&self, kind: TaskKind) -> &TaskRecord {
        static EMPTY: TaskRecord = TaskRecord {
            started_at: None,
            ended_at: None,
            outcomes: Vec::new(),
            is_completed: false,
        };
        self.tasks.get(&kind).unwrap_or(&EMPTY)
    }

    fn task_mut(&mut self, kind: TaskKind) -> &mut TaskRecord {
        self.tasks.entry(kind).or_default()
    }

    /// First task, in session order, that hasn't been completed.
    pub fn next_task(&self) -> Option<TaskKind> {
        TaskKind::ALL
            .into_iter()
            .find(|kind| !self.task(*kind).is_completed)
    }

    pub fn completed_tasks(&self) -> usize {
        self.tasks.values().filter(|t| t.is_completed).count()
    }
}

impl SessionRecorder for Session {
    fn start_task(&mut self, kind: TaskKind) {
        self.current_task = Some(kind);
        self.task_mut(kind).started_at = Some(Utc::now());
    }

    /// Replaces an earlier outcome for the same item.
    fn record_response(&mut self, kind: TaskKind, outcome: ItemOutcome) {
        let record = self.task_mut(kind);
        match record
            .outcomes
            .iter_mut()
            .find(|o| o.item_id == outcome.item_id)
        {
            Some(existing) => *existing = outcome,
            None => record.outcomes.push(outcome),
        }
    }

    fn complete_task(&mut self, kind: TaskKind) {
        let now = Utc::now();
        let record = self.task_mut(kind);
        record.ended_at = Some(now);
        record.is_completed = true;

        self.current_task = self.next_task();
        if TaskKind::ALL.iter().all(|k| self.task(*k).is_completed) {
            self.is_completed = true;
            self.completed_at = Some(now);
        }
    }

    fn export_results(&self) -> Report {
        Report::from_session(self, Utc::now())
    }
}
