//! Interactive timed task in the terminal.
//!
//! A current-thread Tokio runtime drives everything: a 100 ms interval polls
//! the runner, and a reader task forwards stdin lines over a channel.

use std::time::Duration;

use clap::Args;
use cogassess_core::task::catalog;
use cogassess_core::{
    CaptchaVerifier, Clock, Config, ConfiguredVerifier, Database, Event, ItemOutcome,
    PersistentSession, RunnerState, Submission, SystemClock, TaskError, TaskKind, TaskRunner,
    Verdict,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::CommandResult;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Args)]
pub struct RunArgs {
    /// math, stroop or captcha
    pub task: TaskKind,
    /// Present only the first N items
    #[arg(long)]
    pub limit: Option<usize>,
    /// CAPTCHA only: use verification challenges judged by the verifier
    #[arg(long)]
    pub verify: bool,
    /// Print events as JSON lines instead of text
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: RunArgs) -> CommandResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run_task(args));
    // The stdin reader may still be parked on a blocking read.
    runtime.shutdown_background();
    result
}

/// `--verify` only has challenges to offer for the CAPTCHA task.
fn check_args(args: &RunArgs) -> Result<(), String> {
    if args.verify && args.task != TaskKind::Captcha {
        return Err(format!("--verify only applies to the captcha task, not {}", args.task));
    }
    Ok(())
}

async fn run_task(args: RunArgs) -> CommandResult {
    check_args(&args)?;
    let config = Config::load()?;
    let mut session = PersistentSession::load(Database::open()?);
    let verifier = ConfiguredVerifier::from_config(&config.verify);

    let mut items = if args.verify {
        catalog::verification_challenges()
    } else {
        catalog::builtin(args.task)
    };
    if let Some(limit) = args.limit {
        items.truncate(limit);
    }

    let mut runner = TaskRunner::new(args.task, items, config.rule(args.task), config.delays());
    let clock = SystemClock;
    let render = Renderer { json: args.json };

    let events = runner.start(&mut session, clock.now_ms())?;
    render.all(&events)?;

    let (tx, mut rx) = mpsc::channel::<String>(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "failed to read stdin");
                    break;
                }
            }
        }
    });

    let mut interval = tokio::time::interval(POLL_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // After stdin closes the loop keeps ticking: an answered item still
    // advances and an open one runs out its countdown.
    let mut stdin_open = true;
    while !runner.is_finished() {
        tokio::select! {
            _ = interval.tick() => {
                let events = runner.tick(&mut session, clock.now_ms())?;
                render.all(&events)?;
            }
            line = rx.recv(), if stdin_open => {
                let Some(line) = line else {
                    debug!("stdin closed");
                    stdin_open = false;
                    if runner.state() == RunnerState::PresentingItem {
                        render.note("input closed; remaining items will time out")?;
                    }
                    continue;
                };
                match answer(&mut runner, &verifier, &line, &mut session, &clock).await {
                    Ok(submission) => {
                        render.all(&submission.events)?;
                        render.verdict(submission.verdict)?;
                    }
                    Err(TaskError::EmptyAnswer) => render.note("  (type an answer first)")?,
                    Err(err) => return Err(err.into()),
                }
            }
        }
    }

    if !args.json {
        let record = session.session().task(args.task).clone();
        println!(
            "{}: {}/{} correct ({:.1}%), mean response {:.0} ms",
            args.task,
            record.total_correct(),
            record.total_attempted(),
            record.accuracy_pct(),
            record.mean_response_ms(),
        );
        if let Some(next) = session.session().next_task() {
            println!("next task: {next}");
        } else {
            println!("all tasks complete; export with `cogassess session export`");
        }
    }
    Ok(())
}

async fn answer(
    runner: &mut TaskRunner,
    verifier: &ConfiguredVerifier,
    line: &str,
    session: &mut PersistentSession,
    clock: &SystemClock,
) -> Result<Submission, TaskError> {
    let needs_verification = runner
        .current_item()
        .is_some_and(|item| item.needs_verification());
    if !needs_verification {
        return runner.submit(line, session, clock.now_ms());
    }
    if line.trim().is_empty() {
        return Err(TaskError::EmptyAnswer);
    }

    let passed = match verifier.verify(line).await {
        Ok(verification) => verification.success,
        Err(err) => {
            warn!(error = %err, "verification failed");
            false
        }
    };
    runner.submit_judged(line, passed, session, clock.now_ms())
}

struct Renderer {
    json: bool,
}

impl Renderer {
    fn all(&self, events: &[Event]) -> Result<(), serde_json::Error> {
        for event in events {
            if self.json {
                println!("{}", serde_json::to_string(event)?);
            } else if let Some(line) = describe(event) {
                println!("{line}");
            }
        }
        Ok(())
    }

    fn verdict(&self, verdict: Verdict) -> Result<(), serde_json::Error> {
        if self.json {
            println!("{}", serde_json::to_string(&verdict)?);
        } else if verdict == Verdict::Ignored {
            println!("  (too late)");
        }
        Ok(())
    }

    fn note(&self, message: &str) -> Result<(), serde_json::Error> {
        if self.json {
            println!("{}", serde_json::json!({ "type": "Note", "message": message }));
        } else {
            println!("{message}");
        }
        Ok(())
    }
}

/// Text line for an event, or `None` for events not worth a line.
fn describe(event: &Event) -> Option<String> {
    match event {
        Event::TaskStarted {
            task, total_items, ..
        } => Some(format!("== {task}: {total_items} items ==")),
        Event::ItemPresented {
            index,
            prompt,
            budget,
            ..
        } => Some(format!(
            "\n[{}] {prompt}\n  {} ({}s)",
            index + 1,
            budget.label(),
            budget.secs
        )),
        Event::CountdownTick { remaining_secs, .. } => {
            (*remaining_secs <= 5 || *remaining_secs % 10 == 0)
                .then(|| format!("  {remaining_secs}s left"))
        }
        Event::AnswerIncorrect { attempts, .. } => {
            Some(format!("  incorrect (attempt {attempts}), try again"))
        }
        Event::ItemResolved { outcome, .. } => Some(if outcome.is_correct {
            format!("  correct ({} ms)", outcome.response_time_ms)
        } else {
            format!("  time's up; answer was {}", shown_answer(outcome))
        }),
        Event::TaskCompleted { task, .. } => Some(format!("\n== {task} complete ==")),
        Event::TaskHalted { reason, .. } => Some(format!("task halted: {reason}")),
        Event::StateSnapshot { .. } => None,
    }
}

fn shown_answer(outcome: &ItemOutcome) -> &str {
    if outcome.correct_answer.is_empty() {
        "(verified remotely)"
    } else {
        &outcome.correct_answer
    }
}
