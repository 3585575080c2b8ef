//! # cogassess core library
//!
//! Core logic for a timed cognitive assessment: arithmetic, Stroop
//! colour-naming and CAPTCHA recognition tasks run one after another, each
//! item under a countdown whose length depends on how the previous item went.
//! The `cogassess` binary is a thin terminal front-end over this crate.
//!
//! ## Architecture
//!
//! - **Countdown**: a wall-clock state machine; the caller polls it and gets
//!   back the ticks and expiry that happened since the last poll
//! - **Penalty engine**: picks the full or reduced budget for the next item
//! - **Task runner**: presents items, judges answers, records outcomes
//! - **Session**: collects outcomes per task and builds the exported report
//! - **Storage**: SQLite key-value store for the session, TOML configuration
//!
//! ## Key Components
//!
//! - [`TaskRunner`]: per-task state machine driven by `tick()` and `submit()`
//! - [`PenaltyEngine`]: full/reduced budget selection
//! - [`SessionRecorder`]: what runners report into
//! - [`Report`]: JSON and CSV results export
//! - [`CaptchaVerifier`]: judges verification-challenge tokens

pub mod captcha;
pub mod error;
pub mod events;
pub mod penalty;
pub mod session;
pub mod storage;
pub mod task;
pub mod timer;

pub use captcha::{CaptchaVerifier, ConfiguredVerifier, LocalTokenCheck, SiteVerifyClient, Verification};
pub use error::{ConfigError, CoreError, Result, StorageError, TaskError, TimerError, VerifyError};
pub use events::Event;
pub use penalty::{BudgetKind, PenaltyEngine, PenaltyRule, Resolution, TimeBudget};
pub use session::{PersistentSession, Report, Session, SessionRecorder};
pub use storage::{Config, Database};
pub use task::{Item, ItemKind, ItemOutcome, RunnerState, Submission, TaskKind, TaskRunner, Verdict};
pub use timer::{Clock, Countdown, CountdownEvent, CountdownTimer, ManualClock, SystemClock, TimerState};
