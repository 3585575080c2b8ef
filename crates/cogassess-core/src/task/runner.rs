//! Per-task state machine.
//!
//! ## State Transitions
//!
//! ```text
//! NotStarted -> PresentingItem -> AwaitingNext -> PresentingItem -> ... -> Completed
//!                  |    ^
//!                  +----+  incorrect answer (same item, countdown keeps running)
//!
//! any state -> Halted   (item sequence empty or index out of range)
//! ```
//!
//! Like the countdown it owns, the runner has no thread. The front-end calls
//! `tick()` periodically and `submit()` when the participant answers; both
//! return the [`Event`]s describing what changed.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Item, ItemOutcome, TaskKind};
use crate::error::TaskError;
use crate::events::Event;
use crate::penalty::{PenaltyEngine, PenaltyRule, Resolution, TimeBudget};
use crate::session::SessionRecorder;
use crate::timer::{datetime_from_ms, Countdown, CountdownEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerState {
    NotStarted,
    PresentingItem,
    AwaitingNext,
    Completed,
    Halted,
}

/// Pause between an item resolving and the next one appearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackDelays {
    pub correct_ms: u64,
    pub timeout_ms: u64,
}

impl Default for FeedbackDelays {
    fn default() -> Self {
        Self {
            correct_ms: 1000,
            timeout_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect { attempts: u32 },
    /// Arrived after the countdown expired or outside an item.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub verdict: Verdict,
    pub events: Vec<Event>,
}

/// Walks a participant through one task's items.
#[derive(Debug, Clone)]
pub struct TaskRunner {
    kind: TaskKind,
    items: Vec<Item>,
    index: usize,
    state: RunnerState,
    penalty: PenaltyEngine,
    countdown: Countdown,
    delays: FeedbackDelays,
    /// Budget of the item on screen.
    budget: TimeBudget,
    /// Budget decided for the next item while awaiting it.
    next_budget: Option<TimeBudget>,
    item_started_ms: u64,
    incorrect_attempts: u32,
    last_answer: Option<String>,
    advance_at_ms: Option<u64>,
    halt_reason: Option<String>,
    /// `TaskHalted` not yet handed to the front-end.
    unreported_halt: Option<Event>,
}

impl TaskRunner {
    pub fn new(kind: TaskKind, items: Vec<Item>, rule: PenaltyRule, delays: FeedbackDelays) -> Self {
        Self {
            kind,
            items,
            index: 0,
            state: RunnerState::NotStarted,
            penalty: PenaltyEngine::new(rule),
            countdown: Countdown::new(),
            delays,
            budget: rule.full(),
            next_budget: None,
            item_started_ms: 0,
            incorrect_attempts: 0,
            last_answer: None,
            advance_at_ms: None,
            halt_reason: None,
            unreported_halt: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, RunnerState::Completed | RunnerState::Halted)
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    /// Item on screen, if one is being presented.
    pub fn current_item(&self) -> Option<&Item> {
        match self.state {
            RunnerState::PresentingItem => self.items.get(self.index),
            _ => None,
        }
    }

    pub fn current_budget(&self) -> TimeBudget {
        self.budget
    }

    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining_secs()
    }

    pub fn incorrect_attempts(&self) -> u32 {
        self.incorrect_attempts
    }

    pub fn pending_penalty(&self) -> bool {
        self.penalty.pending_penalty()
    }

    pub fn halt_reason(&self) -> Option<&str> {
        self.halt_reason.as_deref()
    }

    pub fn snapshot(&self, now_ms: u64) -> Event {
        Event::StateSnapshot {
            task: self.kind,
            state: self.state,
            index: self.index,
            total_items: self.items.len(),
            remaining_secs: self.countdown.remaining_secs(),
            budget: self.budget,
            pending_penalty: self.penalty.pending_penalty(),
            at: datetime_from_ms(now_ms),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin the task with the first item on the full budget.
    ///
    /// # Errors
    /// [`TaskError::AlreadyStarted`] on a second call; [`TaskError::NoItems`]
    /// (runner halted) when there is nothing to present.
    pub fn start(
        &mut self,
        recorder: &mut dyn SessionRecorder,
        now_ms: u64,
    ) -> Result<Vec<Event>, TaskError> {
        if self.state != RunnerState::NotStarted {
            return Err(TaskError::AlreadyStarted { kind: self.kind });
        }

        recorder.start_task(self.kind);
        self.penalty.reset();
        info!(task = %self.kind, items = self.items.len(), "task started");

        if self.items.is_empty() {
            let err = TaskError::NoItems { kind: self.kind };
            self.halt(&err, now_ms);
            return Err(err);
        }

        let mut events = vec![Event::TaskStarted {
            task: self.kind,
            total_items: self.items.len(),
            at: datetime_from_ms(now_ms),
        }];
        let budget = self.penalty.initial_budget();
        events.extend(self.present(recorder, 0, budget, now_ms)?);
        Ok(events)
    }

    /// Call periodically. Delivers countdown ticks, settles expiry, and moves
    /// on once the feedback delay has passed.
    pub fn tick(
        &mut self,
        recorder: &mut dyn SessionRecorder,
        now_ms: u64,
    ) -> Result<Vec<Event>, TaskError> {
        match self.state {
            RunnerState::PresentingItem => {
                let due = self.countdown.poll(now_ms);
                self.on_countdown(recorder, due, now_ms)
            }
            RunnerState::AwaitingNext => match self.advance_at_ms {
                Some(at) if now_ms >= at => self.advance(recorder, now_ms),
                _ => Ok(Vec::new()),
            },
            RunnerState::Halted => Ok(self.unreported_halt.take().into_iter().collect()),
            RunnerState::NotStarted | RunnerState::Completed => Ok(Vec::new()),
        }
    }

    /// Check `answer` against the current item.
    ///
    /// # Errors
    /// [`TaskError::EmptyAnswer`] for blank input; nothing changes.
    pub fn submit(
        &mut self,
        answer: &str,
        recorder: &mut dyn SessionRecorder,
        now_ms: u64,
    ) -> Result<Submission, TaskError> {
        if answer.trim().is_empty() {
            return Err(TaskError::EmptyAnswer);
        }
        let correct = self
            .current_item()
            .map(|item| item.check(answer))
            .unwrap_or(false);
        self.accept(answer, correct, recorder, now_ms)
    }

    /// Like [`submit`](Self::submit) but with correctness decided elsewhere,
    /// e.g. by a CAPTCHA verifier.
    pub fn submit_judged(
        &mut self,
        answer: &str,
        correct: bool,
        recorder: &mut dyn SessionRecorder,
        now_ms: u64,
    ) -> Result<Submission, TaskError> {
        if answer.trim().is_empty() {
            return Err(TaskError::EmptyAnswer);
        }
        self.accept(answer, correct, recorder, now_ms)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn accept(
        &mut self,
        answer: &str,
        correct: bool,
        recorder: &mut dyn SessionRecorder,
        now_ms: u64,
    ) -> Result<Submission, TaskError> {
        // Settle whatever the countdown owes first: an answer racing the
        // expiry loses.
        let mut events = if self.state == RunnerState::PresentingItem {
            let due = self.countdown.poll(now_ms);
            self.on_countdown(recorder, due, now_ms)?
        } else {
            Vec::new()
        };

        if self.state != RunnerState::PresentingItem || !self.countdown.is_running() {
            debug!(task = %self.kind, state = ?self.state, "late submission ignored");
            return Ok(Submission {
                verdict: Verdict::Ignored,
                events,
            });
        }

        self.last_answer = Some(answer.trim().to_string());

        if correct {
            let resolution = Resolution::Correct {
                incorrect_attempts: self.incorrect_attempts,
            };
            events.push(self.resolve(recorder, resolution, now_ms)?);
            Ok(Submission {
                verdict: Verdict::Correct,
                events,
            })
        } else {
            self.incorrect_attempts += 1;
            debug!(task = %self.kind, index = self.index, attempts = self.incorrect_attempts, "incorrect answer");
            events.push(Event::AnswerIncorrect {
                task: self.kind,
                index: self.index,
                attempts: self.incorrect_attempts,
                at: datetime_from_ms(now_ms),
            });
            Ok(Submission {
                verdict: Verdict::Incorrect {
                    attempts: self.incorrect_attempts,
                },
                events,
            })
        }
    }

    fn present(
        &mut self,
        recorder: &mut dyn SessionRecorder,
        index: usize,
        budget: TimeBudget,
        now_ms: u64,
    ) -> Result<Vec<Event>, TaskError> {
        self.countdown.stop();

        if index >= self.items.len() {
            let err = TaskError::ItemOutOfRange {
                kind: self.kind,
                index,
                len: self.items.len(),
            };
            self.halt(&err, now_ms);
            return Err(err);
        }

        self.index = index;
        self.state = RunnerState::PresentingItem;
        self.budget = budget;
        self.next_budget = None;
        self.item_started_ms = now_ms;
        self.incorrect_attempts = 0;
        self.last_answer = None;
        self.advance_at_ms = None;

        let item = &self.items[index];
        debug!(task = %self.kind, index, item = %item.id, secs = budget.secs, "presenting item");
        let mut events = vec![Event::ItemPresented {
            task: self.kind,
            index,
            item_id: item.id.clone(),
            prompt: item.prompt.clone(),
            budget,
            at: datetime_from_ms(now_ms),
        }];

        let due = self.countdown.start(budget.secs, now_ms)?;
        events.extend(self.on_countdown(recorder, due, now_ms)?);
        Ok(events)
    }

    fn on_countdown(
        &mut self,
        recorder: &mut dyn SessionRecorder,
        due: Vec<CountdownEvent>,
        now_ms: u64,
    ) -> Result<Vec<Event>, TaskError> {
        let mut events = Vec::with_capacity(due.len());
        for event in due {
            match event {
                CountdownEvent::Tick { remaining_secs } => events.push(Event::CountdownTick {
                    task: self.kind,
                    index: self.index,
                    remaining_secs,
                }),
                CountdownEvent::Expired => {
                    let resolution = Resolution::TimedOut {
                        incorrect_attempts: self.incorrect_attempts,
                    };
                    events.push(self.resolve(recorder, resolution, now_ms)?);
                }
            }
        }
        Ok(events)
    }

    fn resolve(
        &mut self,
        recorder: &mut dyn SessionRecorder,
        resolution: Resolution,
        now_ms: u64,
    ) -> Result<Event, TaskError> {
        self.countdown.stop();

        if self.index >= self.items.len() {
            let err = TaskError::ItemOutOfRange {
                kind: self.kind,
                index: self.index,
                len: self.items.len(),
            };
            self.halt(&err, now_ms);
            return Err(err);
        }

        let item = &self.items[self.index];
        let timed_out = matches!(resolution, Resolution::TimedOut { .. });
        let outcome = ItemOutcome {
            item_id: item.id.clone(),
            item_index: self.index,
            prompt: item.prompt.clone(),
            correct_answer: item.answer.clone(),
            answer: self.last_answer.clone(),
            is_correct: !timed_out,
            response_time_ms: now_ms.saturating_sub(self.item_started_ms),
            timed_out,
            incorrect_attempts: resolution.incorrect_attempts(),
            budget: self.budget,
            recorded_at: datetime_from_ms(now_ms),
        };
        recorder.record_response(self.kind, outcome.clone());

        let next_budget = self.penalty.resolve(resolution);
        let delay = if timed_out {
            self.delays.timeout_ms
        } else {
            self.delays.correct_ms
        };
        self.next_budget = Some(next_budget);
        self.advance_at_ms = Some(now_ms.saturating_add(delay));
        self.state = RunnerState::AwaitingNext;

        debug!(
            task = %self.kind,
            index = self.index,
            timed_out,
            next_secs = next_budget.secs,
            "item resolved"
        );
        Ok(Event::ItemResolved {
            task: self.kind,
            outcome,
            next_budget,
            recovered: self.penalty.recovered(),
        })
    }

    fn advance(
        &mut self,
        recorder: &mut dyn SessionRecorder,
        now_ms: u64,
    ) -> Result<Vec<Event>, TaskError> {
        let next_index = self.index + 1;
        if next_index >= self.items.len() {
            self.countdown.stop();
            self.state = RunnerState::Completed;
            self.advance_at_ms = None;
            recorder.complete_task(self.kind);
            info!(task = %self.kind, "task completed");
            return Ok(vec![Event::TaskCompleted {
                task: self.kind,
                at: datetime_from_ms(now_ms),
            }]);
        }

        let budget = self
            .next_budget
            .take()
            .unwrap_or_else(|| self.penalty.next_budget());
        self.present(recorder, next_index, budget, now_ms)
    }

    /// The error goes back to the caller; the matching event is delivered by
    /// the next `tick()`.
    fn halt(&mut self, err: &TaskError, now_ms: u64) {
        warn!(task = %self.kind, error = %err, "task halted");
        self.countdown.stop();
        self.state = RunnerState::Halted;
        self.advance_at_ms = None;
        self.halt_reason = Some(err.to_string());
        self.unreported_halt = Some(Event::TaskHalted {
            task: self.kind,
            reason: err.to_string(),
            at: datetime_from_ms(now_ms),
        });
    }
}
