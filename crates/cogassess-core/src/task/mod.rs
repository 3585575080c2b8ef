//! Assessment tasks: item types, the built-in catalog, and the runner that
//! walks a participant through one task.

pub mod catalog;
mod item;
mod outcome;
mod runner;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TaskError;

pub use item::{Item, ItemKind};
pub use outcome::ItemOutcome;
pub use runner::{FeedbackDelays, RunnerState, Submission, TaskRunner, Verdict};

/// The three assessment tasks, in the order a session runs them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Math,
    Stroop,
    Captcha,
}

impl TaskKind {
    pub const ALL: [TaskKind; 3] = [TaskKind::Math, TaskKind::Stroop, TaskKind::Captcha];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Math => "math",
            TaskKind::Stroop => "stroop",
            TaskKind::Captcha => "captcha",
        }
    }

    /// Task that follows this one in a session, `None` after the last.
    pub fn next(&self) -> Option<TaskKind> {
        match self {
            TaskKind::Math => Some(TaskKind::Stroop),
            TaskKind::Stroop => Some(TaskKind::Captcha),
            TaskKind::Captcha => None,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "math" => Ok(TaskKind::Math),
            "stroop" => Ok(TaskKind::Stroop),
            "captcha" => Ok(TaskKind::Captcha),
            other => Err(TaskError::UnknownKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_run_in_fixed_order() {
        assert_eq!(TaskKind::Math.next(), Some(TaskKind::Stroop));
        assert_eq!(TaskKind::Stroop.next(), Some(TaskKind::Captcha));
        assert_eq!(TaskKind::Captcha.next(), None);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(" Stroop ".parse::<TaskKind>().unwrap(), TaskKind::Stroop);
        assert_eq!(
            "memory".parse::<TaskKind>(),
            Err(TaskError::UnknownKind("memory".into()))
        );
    }
}
