//! Report aggregation and export formats.

use chrono::{TimeZone, Utc};

use cogassess_core::session::Report;
use cogassess_core::{BudgetKind, ItemOutcome, Session, SessionRecorder, TaskKind, TimeBudget};

fn outcome(id: &str, index: usize, correct: bool, response_time_ms: u64) -> ItemOutcome {
    ItemOutcome {
        item_id: id.to_string(),
        item_index: index,
        prompt: format!("prompt {id}"),
        correct_answer: "x".to_string(),
        answer: correct.then(|| "x".to_string()),
        is_correct: correct,
        response_time_ms,
        timed_out: !correct,
        incorrect_attempts: 0,
        budget: TimeBudget {
            secs: 15,
            kind: BudgetKind::Full,
        },
        recorded_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
    }
}

fn sample_session() -> Session {
    let mut session = Session::new();
    session.start_task(TaskKind::Math);
    session.record_response(TaskKind::Math, outcome("math_1", 0, true, 2_000));
    session.record_response(TaskKind::Math, outcome("math_2", 1, false, 60_000));
    session.complete_task(TaskKind::Math);

    session.start_task(TaskKind::Stroop);
    session.record_response(TaskKind::Stroop, outcome("stroop_1", 0, true, 800));
    session.record_response(TaskKind::Stroop, outcome("stroop_2", 1, true, 1_200));
    session.complete_task(TaskKind::Stroop);

    session.start_task(TaskKind::Captcha);
    session.record_response(TaskKind::Captcha, outcome("captcha_1", 0, false, 15_000));
    session.complete_task(TaskKind::Captcha);
    session
}

#[test]
fn summary_sums_per_task_counts() {
    let report = sample_session().export_results();

    let per_task: usize = report.tasks.values().map(|t| t.total_correct).sum();
    assert_eq!(report.summary.total_correct, per_task);
    assert_eq!(report.summary.total_correct, 3);
    assert_eq!(report.summary.total_attempted, 5);
    assert!((report.summary.overall_accuracy_pct - 60.0).abs() < 1e-9);

    let math = &report.tasks[&TaskKind::Math];
    assert!((math.accuracy_pct - 50.0).abs() < 1e-9);
    assert!((math.mean_response_ms - 31_000.0).abs() < 1e-9);

    // (31000 + 1000 + 15000) / 3
    assert!((report.summary.mean_response_ms - 47_000.0 / 3.0).abs() < 1e-6);
    assert_eq!(report.summary.completed_tasks, 3);
    assert!(report.session.is_completed);
}

#[test]
fn nothing_attempted_gives_zero_accuracy() {
    let mut session = Session::new();
    session.start_task(TaskKind::Math);
    let report = session.export_results();
    assert_eq!(report.summary.total_attempted, 0);
    assert_eq!(report.summary.overall_accuracy_pct, 0.0);
    assert_eq!(report.tasks[&TaskKind::Math].accuracy_pct, 0.0);
    assert!(!report.session.is_completed);
}

#[test]
fn rerecorded_item_replaces_previous_outcome() {
    let mut session = Session::new();
    session.record_response(TaskKind::Math, outcome("math_1", 0, false, 60_000));
    session.record_response(TaskKind::Math, outcome("math_1", 0, true, 4_000));
    let report = session.export_results();
    assert_eq!(report.tasks[&TaskKind::Math].total_attempted, 1);
    assert_eq!(report.summary.total_correct, 1);
}

#[test]
fn json_export_parses_back() {
    let report = sample_session().export_results();
    let json = report.to_json().unwrap();
    let parsed: Report = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.session, report.session);
    assert_eq!(parsed.tasks[&TaskKind::Math].outcomes, report.tasks[&TaskKind::Math].outcomes);
    assert_eq!(parsed.summary.total_attempted, 5);

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["tasks"]["stroop"]["total_correct"], 2);
}

#[test]
fn csv_has_a_row_per_outcome_in_task_order() {
    let report = sample_session().export_results();
    let csv = report.to_csv();
    let rows: Vec<&str> = csv.lines().collect();

    assert_eq!(rows.len(), 6);
    assert!(rows[0].starts_with("session_id,task,item_index,item_id"));
    assert!(rows[1].contains(",math,0,math_1,"));
    assert!(rows[3].contains(",stroop,0,stroop_1,"));
    assert!(rows[5].contains(",captcha,0,captcha_1,"));
    assert!(rows[5].contains(",false,true,0,15,15000,"));
}
