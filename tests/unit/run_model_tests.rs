//! Unit tests for run options and run results.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use agent_signal::runner::codec::MAX_LINE_BYTES;
use agent_signal::{RunOptions, RunResult, Signal, SignalKind};

fn signal(kind: SignalKind, id: &str) -> Signal {
    let mut attributes = BTreeMap::new();
    attributes.insert("id".to_owned(), id.to_owned());
    Signal::new(kind, attributes, String::new())
}

fn result(exit_code: i32, timed_out: bool, signals: Vec<Signal>) -> RunResult {
    RunResult {
        exit_code,
        stdout: String::new(),
        signals,
        timed_out,
        duration: Duration::from_millis(5),
    }
}

#[test]
fn run_options_defaults() {
    let options = RunOptions::new("prompt");

    assert_eq!(options.prompt, "prompt");
    assert!(options.working_directory.is_none());
    assert!(options.env.is_empty());
    assert_eq!(options.timeout_ms, 0);
    assert_eq!(options.timeout(), None);
    assert_eq!(options.max_line_bytes, MAX_LINE_BYTES);
    assert!(options.on_signal.is_none());
    assert!(options.on_output.is_none());
}

#[test]
fn run_options_builders_set_fields() {
    let options = RunOptions::new("p")
        .working_directory("/tmp/work")
        .env("A", "1")
        .env("A", "2")
        .env("B", "3")
        .timeout_ms(1_500)
        .max_line_bytes(64)
        .on_signal(|_| {})
        .on_output(|_| {});

    assert_eq!(options.working_directory, Some(PathBuf::from("/tmp/work")));
    assert_eq!(options.env.get("A").map(String::as_str), Some("2"));
    assert_eq!(options.env.len(), 2);
    assert_eq!(options.timeout(), Some(Duration::from_millis(1_500)));
    assert_eq!(options.max_line_bytes, 64);
    assert!(options.on_signal.is_some());
    assert!(options.on_output.is_some());
}

#[test]
fn run_options_debug_hides_prompt_text() {
    let options = RunOptions::new("secret prompt").env("TOKEN", "hunter2");
    let debug = format!("{options:?}");

    assert!(!debug.contains("secret prompt"));
    assert!(!debug.contains("hunter2"));
    assert!(debug.contains("TOKEN"));
}

#[test]
fn success_requires_zero_exit_and_no_timeout() {
    assert!(result(0, false, Vec::new()).success());
    assert!(!result(1, false, Vec::new()).success());
    assert!(!result(0, true, Vec::new()).success());
}

#[test]
fn signal_queries_preserve_order() {
    let run = result(
        0,
        false,
        vec![
            signal(SignalKind::ReviewFinding, "F1"),
            signal(SignalKind::Progress, "P1"),
            signal(SignalKind::ReviewFinding, "F2"),
            signal(SignalKind::ReviewComplete, "R"),
        ],
    );

    let findings: Vec<_> = run
        .signals_of(&SignalKind::ReviewFinding)
        .filter_map(|s| s.attr("id"))
        .collect();
    assert_eq!(findings, vec!["F1", "F2"]);
    assert!(run.has_signal(&SignalKind::Progress));
    assert!(!run.has_signal(&SignalKind::Blocked));
    assert_eq!(run.last_signal().and_then(|s| s.attr("id")), Some("R"));
}

#[test]
fn empty_result_has_no_last_signal() {
    assert!(result(0, false, Vec::new()).last_signal().is_none());
}

#[test]
fn run_result_serializes_to_json() {
    let run = result(137, true, vec![signal(SignalKind::Blocked, "B1")]);

    let json = serde_json::to_value(&run).expect("serializable");

    assert_eq!(json["exit_code"], 137);
    assert_eq!(json["timed_out"], true);
    assert_eq!(json["signals"][0]["type"], "BLOCKED");
}
