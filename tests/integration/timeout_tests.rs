//! Integration tests for timeout-driven termination.

use std::time::{Duration, Instant};

use agent_signal::{run, RunOptions, SignalKind};

use super::test_helpers::{block_script, sh_adapter};

/// `128 + SIGKILL`.
const KILLED_EXIT_CODE: i32 = 137;

#[tokio::test]
async fn sleeping_agent_is_killed_at_timeout() {
    let adapter = sh_adapter("sleep 30");
    let started = Instant::now();

    let result = run(&adapter, RunOptions::new("go").timeout_ms(100))
        .await
        .expect("timeout must still produce a result");

    assert!(
        started.elapsed() < Duration::from_secs(10),
        "run must return shortly after the timeout, took {:?}",
        started.elapsed()
    );
    assert!(result.timed_out);
    assert_eq!(result.exit_code, KILLED_EXIT_CODE);
    assert!(!result.success());
}

/// A grandchild holding stdout open is killed with the process group, so
/// the stream drains and the run returns.
#[tokio::test]
async fn grandchildren_are_killed_with_the_group() {
    let adapter = sh_adapter("sleep 30 & sleep 30; echo unreachable");
    let started = Instant::now();

    let result = run(&adapter, RunOptions::new("go").timeout_ms(200))
        .await
        .expect("timeout must still produce a result");

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(result.timed_out);
    assert!(!result.stdout.contains("unreachable"));
}

/// Signals emitted before the kill are kept.
#[tokio::test]
async fn signals_before_timeout_are_returned() {
    let adapter = sh_adapter(&format!(
        "{}; sleep 30",
        block_script("PROGRESS", "step=\"1\"", "started")
    ));

    let result = run(&adapter, RunOptions::new("go").timeout_ms(500))
        .await
        .expect("timeout must still produce a result");

    assert!(result.timed_out);
    assert_eq!(result.signals.len(), 1);
    assert_eq!(result.signals[0].kind, SignalKind::Progress);
}

/// A process that finishes first is not flagged, and the timer does not
/// delay the result.
#[tokio::test]
async fn fast_exit_disarms_the_timer() {
    let adapter = sh_adapter("echo quick");
    let started = Instant::now();

    let result = run(&adapter, RunOptions::new("go").timeout_ms(30_000))
        .await
        .expect("run must succeed");

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!result.timed_out);
    assert_eq!(result.exit_code, 0);
}

/// `timeout_ms = 0` means no timeout at all.
#[tokio::test]
async fn zero_timeout_is_unbounded() {
    let adapter = sh_adapter("sleep 0.3; echo finished");

    let result = run(&adapter, RunOptions::new("go").timeout_ms(0))
        .await
        .expect("run must succeed");

    assert!(!result.timed_out);
    assert_eq!(result.stdout, "finished\n");
}
