use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::penalty::TimeBudget;

/// Recorded result of one item. Built once when the item resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub item_id: String,
    pub item_index: usize,
    pub prompt: String,
    pub correct_answer: String,
    /// Last submitted answer; `None` when the item timed out untouched.
    pub answer: Option<String>,
    pub is_correct: bool,
    pub response_time_ms: u64,
    pub timed_out: bool,
    /// Incorrect submissions before the item resolved.
    pub incorrect_attempts: u32,
    /// Budget the item ran under.
    pub budget: TimeBudget,
    pub recorded_at: DateTime<Utc>,
}
