use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use cogassess_core::{Database, PersistentSession, Report, SessionRecorder, TaskKind};

use super::CommandResult;

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Show progress through the three tasks
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the results report
    Export {
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Discard the session and start a new one
    Reset,
}

pub fn run(action: SessionAction) -> CommandResult {
    let mut store = PersistentSession::load(Database::open()?);
    match action {
        SessionAction::Status { json } => {
            let report = store.export_results();
            if json {
                println!("{}", serde_json::to_string_pretty(&report.summary)?);
            } else {
                print!("{}", status_text(&report, store.session().next_task()));
            }
        }
        SessionAction::Export { format, out } => {
            let report = store.export_results();
            let body = match format {
                ExportFormat::Json => report.to_json()? + "\n",
                ExportFormat::Csv => report.to_csv(),
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, body)?;
                    eprintln!("report written to {}", path.display());
                }
                None => print!("{body}"),
            }
        }
        SessionAction::Reset => {
            store.reset();
            println!("session reset: {}", store.session().session_id);
        }
    }
    Ok(())
}

fn status_text(report: &Report, next: Option<TaskKind>) -> String {
    let mut out = format!("session {}\n", report.session.session_id);
    for (kind, task) in &report.tasks {
        let state = if task.is_completed {
            "done"
        } else if task.started_at.is_some() {
            "started"
        } else {
            "pending"
        };
        out.push_str(&format!(
            "  {kind:<8} {state:<8} {}/{} correct ({:.1}%)\n",
            task.total_correct, task.total_attempted, task.accuracy_pct
        ));
    }
    match next {
        Some(kind) => out.push_str(&format!("next: {kind}\n")),
        None => out.push_str("all tasks complete\n"),
    }
    out
}
