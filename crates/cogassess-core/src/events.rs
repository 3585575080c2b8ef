use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::penalty::TimeBudget;
use crate::task::{ItemOutcome, RunnerState, TaskKind};

/// Every state change in a task run produces an Event.
/// The front-end renders from these; nothing else reaches into the runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TaskStarted {
        task: TaskKind,
        total_items: usize,
        at: DateTime<Utc>,
    },
    ItemPresented {
        task: TaskKind,
        index: usize,
        item_id: String,
        prompt: String,
        budget: TimeBudget,
        at: DateTime<Utc>,
    },
    CountdownTick {
        task: TaskKind,
        index: usize,
        remaining_secs: u32,
    },
    /// Wrong answer; the item stays up and its countdown keeps running.
    AnswerIncorrect {
        task: TaskKind,
        index: usize,
        attempts: u32,
        at: DateTime<Utc>,
    },
    /// Item finished, by a correct answer or by timing out.
    ItemResolved {
        task: TaskKind,
        outcome: ItemOutcome,
        next_budget: TimeBudget,
        /// The resolution cleared a penalty inherited from the item before.
        recovered: bool,
    },
    TaskCompleted {
        task: TaskKind,
        at: DateTime<Utc>,
    },
    /// The task cannot continue.
    TaskHalted {
        task: TaskKind,
        reason: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        task: TaskKind,
        state: RunnerState,
        index: usize,
        total_items: usize,
        remaining_secs: u32,
        budget: TimeBudget,
        pending_penalty: bool,
        at: DateTime<Utc>,
    },
}
