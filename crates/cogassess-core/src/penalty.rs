//! Timing penalty between items.
//!
//! After every item resolves the engine decides the next item's budget:
//!
//! | resolution                        | next budget | pending penalty |
//! |-----------------------------------|-------------|-----------------|
//! | correct on the first attempt      | full        | cleared         |
//! | correct after an incorrect answer | reduced     | set             |
//! | timed out                         | reduced     | set             |
//!
//! Only the presence of trouble on the item matters, not how much: an
//! incorrect attempt followed by a timeout is penalised once.

use serde::{Deserialize, Serialize};

/// Full and reduced budgets for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyRule {
    pub full_secs: u32,
    pub reduced_secs: u32,
}

impl PenaltyRule {
    pub const MATH: PenaltyRule = PenaltyRule::new(60, 50);
    pub const STROOP: PenaltyRule = PenaltyRule::new(15, 10);
    pub const CAPTCHA: PenaltyRule = PenaltyRule::new(15, 10);

    pub const fn new(full_secs: u32, reduced_secs: u32) -> Self {
        Self {
            full_secs,
            reduced_secs,
        }
    }

    pub fn full(&self) -> TimeBudget {
        TimeBudget {
            secs: self.full_secs,
            kind: BudgetKind::Full,
        }
    }

    pub fn reduced(&self) -> TimeBudget {
        TimeBudget {
            secs: self.reduced_secs,
            kind: BudgetKind::Reduced,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetKind {
    Full,
    Reduced,
}

/// Time allotted to one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBudget {
    pub secs: u32,
    pub kind: BudgetKind,
}

impl TimeBudget {
    pub fn is_reduced(&self) -> bool {
        self.kind == BudgetKind::Reduced
    }

    /// Short label for status lines.
    pub fn label(&self) -> &'static str {
        match self.kind {
            BudgetKind::Full => "Full Time",
            BudgetKind::Reduced => "Penalty Time",
        }
    }
}

/// How an item ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Resolution {
    Correct { incorrect_attempts: u32 },
    TimedOut { incorrect_attempts: u32 },
}

impl Resolution {
    /// True when the item needed a retry or ran out of time.
    pub fn had_trouble(&self) -> bool {
        match *self {
            Resolution::Correct { incorrect_attempts } => incorrect_attempts > 0,
            Resolution::TimedOut { .. } => true,
        }
    }

    pub fn incorrect_attempts(&self) -> u32 {
        match *self {
            Resolution::Correct { incorrect_attempts }
            | Resolution::TimedOut { incorrect_attempts } => incorrect_attempts,
        }
    }
}

/// Per-task penalty state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyEngine {
    rule: PenaltyRule,
    pending_penalty: bool,
    /// Set when the last resolution cleared an inherited penalty.
    recovered: bool,
}

impl PenaltyEngine {
    pub fn new(rule: PenaltyRule) -> Self {
        Self {
            rule,
            pending_penalty: false,
            recovered: false,
        }
    }

    pub fn rule(&self) -> PenaltyRule {
        self.rule
    }

    pub fn pending_penalty(&self) -> bool {
        self.pending_penalty
    }

    pub fn recovered(&self) -> bool {
        self.recovered
    }

    /// Forget all history; the next item gets the full budget.
    pub fn reset(&mut self) {
        self.pending_penalty = false;
        self.recovered = false;
    }

    /// Budget for the first item of a task.
    pub fn initial_budget(&self) -> TimeBudget {
        self.rule.full()
    }

    /// Budget the next item will receive given the current state.
    pub fn next_budget(&self) -> TimeBudget {
        if self.pending_penalty {
            self.rule.reduced()
        } else {
            self.rule.full()
        }
    }

    /// Fold one resolved item into the state and return the next budget.
    pub fn resolve(&mut self, resolution: Resolution) -> TimeBudget {
        let inherited = self.pending_penalty;
        self.pending_penalty = resolution.had_trouble();
        self.recovered = inherited && !self.pending_penalty;
        self.next_budget()
    }
}
