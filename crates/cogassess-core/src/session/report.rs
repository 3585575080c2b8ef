//! Exported results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::{percentage, Session};
use crate::task::{ItemOutcome, TaskKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    /// Completion time, or the export time for an unfinished session.
    pub completed_at: DateTime<Utc>,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task: TaskKind,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub total_items: usize,
    pub total_correct: usize,
    pub total_attempted: usize,
    pub accuracy_pct: f64,
    pub mean_response_ms: f64,
    pub outcomes: Vec<ItemOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_items: usize,
    pub total_correct: usize,
    pub total_attempted: usize,
    pub overall_accuracy_pct: f64,
    /// Mean of the per-task mean response times across all three tasks.
    pub mean_response_ms: f64,
    pub completed_tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub session: SessionInfo,
    pub tasks: BTreeMap<TaskKind, TaskSummary>,
    pub summary: ReportSummary,
}

impl Report {
    pub fn from_session(session: &Session, exported_at: DateTime<Utc>) -> Self {
        let tasks: BTreeMap<TaskKind, TaskSummary> = TaskKind::ALL
            .iter()
            .map(|kind| {
                let record = session.task(*kind);
                let summary = TaskSummary {
                    task: *kind,
                    started_at: record.started_at,
                    ended_at: record.ended_at,
                    is_completed: record.is_completed,
                    total_items: record.outcomes.len(),
                    total_correct: record.total_correct(),
                    total_attempted: record.total_attempted(),
                    accuracy_pct: record.accuracy_pct(),
                    mean_response_ms: record.mean_response_ms(),
                    outcomes: record.outcomes.clone(),
                };
                (*kind, summary)
            })
            .collect();

        let total_items = tasks.values().map(|t| t.total_items).sum();
        let total_correct = tasks.values().map(|t| t.total_correct).sum();
        let total_attempted = tasks.values().map(|t| t.total_attempted).sum();
        let mean_response_ms =
            tasks.values().map(|t| t.mean_response_ms).sum::<f64>() / TaskKind::ALL.len() as f64;
        let completed_tasks = tasks.values().filter(|t| t.is_completed).count();

        Self {
            session: SessionInfo {
                session_id: session.session_id.clone(),
                started_at: session.started_at,
                completed_at: session.completed_at.unwrap_or(exported_at),
                is_completed: session.is_completed,
            },
            tasks,
            summary: ReportSummary {
                total_items,
                total_correct,
                total_attempted,
                overall_accuracy_pct: percentage(total_correct, total_attempted),
                mean_response_ms,
                completed_tasks,
            },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One row per recorded item, tasks in session order.
    pub fn to_csv(&self) -> String {
        let mut out = String::from(
            "session_id,task,item_index,item_id,prompt,answer,correct_answer,is_correct,timed_out,incorrect_attempts,budget_secs,response_time_ms,recorded_at\n",
        );
        for summary in self.tasks.values() {
            for o in &summary.outcomes {
                let _ = writeln!(
                    out,
                    "{},{},{},{},{},{},{},{},{},{},{},{},{}",
                    csv_field(&self.session.session_id),
                    summary.task,
                    o.item_index,
                    csv_field(&o.item_id),
                    csv_field(&o.prompt),
                    csv_field(o.answer.as_deref().unwrap_or("")),
                    csv_field(&o.correct_answer),
                    o.is_correct,
                    o.timed_out,
                    o.incorrect_attempts,
                    o.budget.secs,
                    o.response_time_ms,
                    o.recorded_at.to_rfc3339(),
                );
            }
        }
        out
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
