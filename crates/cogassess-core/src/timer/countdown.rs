//! Whole-second countdown.
//!
//! The countdown is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `poll()`
//! periodically with the current time.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Expired
//!           |          |
//!           +-> Idle <-+   (stop)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut countdown = Countdown::new();
//! countdown.start(5, clock.now_ms())?;   // [Tick(5)]
//! // In a loop:
//! countdown.poll(clock.now_ms());         // [Tick(4)], ..., [Tick(0), Expired]
//! ```
//!
//! [`CountdownTimer`] wraps the same machine behind `on_tick`/`on_expire`
//! closures for callers that prefer callbacks.

use serde::{Deserialize, Serialize};

use super::clock::{Clock, SystemClock};
use crate::error::TimerError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    #[default]
    Idle,
    Running,
    Expired,
}

/// Notification produced by [`Countdown::start`] and [`Countdown::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CountdownEvent {
    Tick { remaining_secs: u32 },
    Expired,
}

/// Core countdown.
///
/// Operates on wall-clock deltas -- no internal thread.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Countdown {
    state: TimerState,
    duration_secs: u32,
    /// Timestamp (ms since epoch) of the last `start`.
    started_at_ms: Option<u64>,
    /// Last value handed out as a tick.
    last_reported: Option<u32>,
    /// Bumped on every `start`; events from an earlier generation are stale.
    generation: u64,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Seconds left as of the last reported tick.
    pub fn remaining_secs(&self) -> u32 {
        match self.state {
            TimerState::Running => self.last_reported.unwrap_or(self.duration_secs),
            TimerState::Idle | TimerState::Expired => 0,
        }
    }

    /// Milliseconds since the last `start`, or 0 when never started.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        self.started_at_ms
            .map(|start| now_ms.saturating_sub(start))
            .unwrap_or(0)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin counting down from `duration_secs`.
    ///
    /// Returns the immediate tick carrying the starting value. A zero
    /// duration expires on the spot.
    ///
    /// # Errors
    /// [`TimerError::AlreadyRunning`] if a countdown is in progress.
    pub fn start(
        &mut self,
        duration_secs: u32,
        now_ms: u64,
    ) -> Result<Vec<CountdownEvent>, TimerError> {
        if self.state == TimerState::Running {
            return Err(TimerError::AlreadyRunning {
                remaining_secs: self.remaining_secs(),
            });
        }

        self.state = TimerState::Running;
        self.duration_secs = duration_secs;
        self.started_at_ms = Some(now_ms);
        self.last_reported = Some(duration_secs);
        self.generation += 1;

        let mut events = vec![CountdownEvent::Tick {
            remaining_secs: duration_secs,
        }];
        if duration_secs == 0 {
            self.state = TimerState::Expired;
            events.push(CountdownEvent::Expired);
        }
        Ok(events)
    }

    /// Cancel any countdown in progress. Returns `true` if one was running.
    ///
    /// Idempotent: after the first call the machine is `Idle` and further
    /// calls change nothing.
    pub fn stop(&mut self) -> bool {
        let was_running = self.state == TimerState::Running;
        self.state = TimerState::Idle;
        self.last_reported = None;
        was_running
    }

    /// Call periodically. Emits one tick per whole second elapsed since the
    /// previous report, then `Expired` once zero is reached.
    ///
    /// Late polls still report every skipped value, in order.
    pub fn poll(&mut self, now_ms: u64) -> Vec<CountdownEvent> {
        if self.state != TimerState::Running {
            return Vec::new();
        }
        let Some(last) = self.last_reported else {
            return Vec::new();
        };

        let elapsed_secs = u32::try_from(self.elapsed_ms(now_ms) / 1000).unwrap_or(u32::MAX);
        let remaining = self.duration_secs.saturating_sub(elapsed_secs);

        let mut events: Vec<CountdownEvent> = (remaining..last)
            .rev()
            .map(|remaining_secs| CountdownEvent::Tick { remaining_secs })
            .collect();
        self.last_reported = Some(remaining);

        if remaining == 0 {
            self.state = TimerState::Expired;
            events.push(CountdownEvent::Expired);
        }
        events
    }
}

type TickFn = Box<dyn FnMut(u32)>;
type ExpireFn = Box<dyn FnOnce()>;

/// Callback-style countdown over a [`Clock`].
///
/// `on_tick` and `on_expire` are owned by the running countdown and dropped
/// by `stop()` or restart, so a cancelled countdown can never call back.
pub struct CountdownTimer<C: Clock = SystemClock> {
    clock: C,
    inner: Countdown,
    on_tick: Option<TickFn>,
    on_expire: Option<ExpireFn>,
}

impl Default for CountdownTimer<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> CountdownTimer<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            inner: Countdown::new(),
            on_tick: None,
            on_expire: None,
        }
    }

    pub fn state(&self) -> TimerState {
        self.inner.state()
    }

    pub fn remaining_secs(&self) -> u32 {
        self.inner.remaining_secs()
    }

    /// Start counting down; `on_tick` fires immediately with `duration_secs`.
    ///
    /// # Errors
    /// [`TimerError::AlreadyRunning`] if a countdown is in progress.
    pub fn start(
        &mut self,
        duration_secs: u32,
        on_tick: impl FnMut(u32) + 'static,
        on_expire: impl FnOnce() + 'static,
    ) -> Result<(), TimerError> {
        let events = self.inner.start(duration_secs, self.clock.now_ms())?;
        self.on_tick = Some(Box::new(on_tick));
        self.on_expire = Some(Box::new(on_expire));
        self.dispatch(events);
        Ok(())
    }

    pub fn stop(&mut self) {
        self.inner.stop();
        self.on_tick = None;
        self.on_expire = None;
    }

    /// Deliver any ticks (and the expiry) due as of the clock's current time.
    pub fn poll(&mut self) {
        let events = self.inner.poll(self.clock.now_ms());
        self.dispatch(events);
    }

    fn dispatch(&mut self, events: Vec<CountdownEvent>) {
        for event in events {
            match event {
                CountdownEvent::Tick { remaining_secs } => {
                    if let Some(on_tick) = self.on_tick.as_mut() {
                        on_tick(remaining_secs);
                    }
                }
                CountdownEvent::Expired => {
                    self.on_tick = None;
                    if let Some(on_expire) = self.on_expire.take() {
                        on_expire();
                    }
                }
            }
        }
    }
}
