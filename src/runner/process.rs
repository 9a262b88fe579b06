//! Agent process runner.
//!
//! Executes one agent command to completion or forced termination:
//! - the prompt is written to stdin and the pipe closed, or passed as an
//!   argument, per the [`AdapterDescriptor`];
//! - stdout is framed into lines, accumulated, passed to the output hook and
//!   fed to a run-local [`SignalParser`], strictly in stream order;
//! - stderr is framed independently and forwarded to the parent's stderr;
//! - an optional timeout kills the process (its whole process group on Unix).
//!
//! The call returns only after the process has exited and both streams have
//! reached EOF.

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::models::adapter::AdapterDescriptor;
use crate::models::run::{OutputHook, RunOptions, RunResult, SignalHook};
use crate::models::signal::Signal;
use crate::runner::codec::OutputCodec;
use crate::signal::SignalParser;
use crate::{AppError, Result};

/// Exit code reported when the platform gives neither a code nor a signal.
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// Run an agent to completion and collect its output and signals.
///
/// # Errors
///
/// - `AppError::Config`: the adapter has an empty argv.
/// - `AppError::Launch`: the process could not be started or its pipes
///   could not be captured. No partial result is produced.
/// - `AppError::Io`: waiting on the process failed after launch.
///
/// A non-zero exit or a timeout kill is reported through the returned
/// [`RunResult`], not as an error.
pub async fn run(adapter: &AdapterDescriptor, options: RunOptions<'_>) -> Result<RunResult> {
    let span = info_span!(
        "agent_run",
        run_id = %uuid::Uuid::new_v4(),
        adapter = %adapter.name
    );
    run_inner(adapter, options).instrument(span).await
}

async fn run_inner(adapter: &AdapterDescriptor, options: RunOptions<'_>) -> Result<RunResult> {
    let timeout = options.timeout();
    let RunOptions {
        prompt,
        working_directory,
        env,
        timeout_ms,
        max_line_bytes,
        on_signal,
        on_output,
    } = options;

    let (program, args) = adapter.command_line(&prompt)?;

    let mut cmd = Command::new(&program);
    cmd.args(&args)
        .envs(&env)
        .stdin(if adapter.stdin {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = &working_directory {
        cmd.current_dir(dir);
    }

    // Own process group: a timeout kill reaches grandchildren too.
    #[cfg(unix)]
    cmd.process_group(0);

    let started = Instant::now();
    let mut child = cmd
        .spawn()
        .map_err(|err| AppError::Launch(format!("failed to launch `{program}`: {err}")))?;

    info!(
        pid = child.id().unwrap_or(0),
        program = %program,
        stdin_prompt = adapter.stdin,
        timeout_ms,
        "agent process spawned"
    );

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Launch("failed to capture agent stdout".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AppError::Launch("failed to capture agent stderr".into()))?;

    let stdin_task = if adapter.stdin {
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Launch("failed to capture agent stdin".into()))?;
        Some(tokio::spawn(write_prompt(stdin, prompt).in_current_span()))
    } else {
        None
    };

    let stderr_task = tokio::spawn(forward_stderr(stderr, max_line_bytes).in_current_span());

    let mut collector = StdoutCollector::new(on_signal, on_output);

    let ((), exit) = tokio::join!(
        collector.consume(stdout, max_line_bytes),
        wait_for_exit(&mut child, timeout),
    );

    join_quietly(stderr_task, "stderr forwarder").await;
    if let Some(task) = stdin_task {
        // A grandchild may hold stdin open without reading it.
        if !task.is_finished() {
            debug!("agent finished with prompt partly unread, abandoning stdin writer");
            task.abort();
        }
        join_quietly(task, "stdin writer").await;
    }

    let (status, timed_out) = exit?;
    let duration = started.elapsed();
    let exit_code = exit_code_of(status);
    let StdoutCollector {
        output, signals, ..
    } = collector;

    info!(
        exit_code,
        timed_out,
        signals = signals.len(),
        duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        "agent process finished"
    );

    Ok(RunResult {
        exit_code,
        stdout: output,
        signals,
        timed_out,
        duration,
    })
}

// ── Stdout ───────────────────────────────────────────────────────────────────

/// Per-run stdout state: accumulated text, parser, hooks and signals.
struct StdoutCollector<'a> {
    parser: SignalParser,
    output: String,
    signals: Vec<Signal>,
    on_signal: Option<SignalHook<'a>>,
    on_output: Option<OutputHook<'a>>,
}

impl<'a> StdoutCollector<'a> {
    fn new(on_signal: Option<SignalHook<'a>>, on_output: Option<OutputHook<'a>>) -> Self {
        Self {
            parser: SignalParser::new(),
            output: String::new(),
            signals: Vec::new(),
            on_signal,
            on_output,
        }
    }

    /// Read `stdout` to EOF, handling each line before the next is decoded.
    async fn consume<R>(&mut self, stdout: R, max_line_bytes: usize)
    where
        R: AsyncRead + Unpin,
    {
        let mut framed = FramedRead::new(stdout, OutputCodec::with_max_length(max_line_bytes));

        while let Some(item) = framed.next().await {
            match item {
                Ok(line) => self.handle_line(&line),
                Err(err) => {
                    warn!(error = %err, "stdout read failed, stopping");
                    break;
                }
            }
        }

        if let Some(kind) = self.parser.pending_kind() {
            warn!(signal = %kind, "discarding unterminated signal block at end of output");
        }
    }

    fn handle_line(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');

        if let Some(hook) = self.on_output.as_mut() {
            hook(line);
        }

        if let Some(signal) = self.parser.feed(line) {
            debug!(
                signal = %signal.kind,
                attributes = signal.attributes.len(),
                "signal detected"
            );
            if let Some(hook) = self.on_signal.as_mut() {
                hook(&signal);
            }
            self.signals.push(signal);
        }
    }
}

// ── Stdin / stderr ───────────────────────────────────────────────────────────

/// Write the whole prompt, then close the pipe by dropping it.
async fn write_prompt(mut stdin: ChildStdin, prompt: String) {
    if let Err(err) = stdin.write_all(prompt.as_bytes()).await {
        // The agent may exit without reading its input.
        debug!(error = %err, "failed to write prompt to agent stdin");
        return;
    }
    if let Err(err) = stdin.shutdown().await {
        debug!(error = %err, "failed to close agent stdin");
    }
}

/// Forward every stderr line to the parent's stderr.
async fn forward_stderr<R>(stderr: R, max_line_bytes: usize)
where
    R: AsyncRead + Unpin,
{
    let mut framed = FramedRead::new(stderr, OutputCodec::with_max_length(max_line_bytes));
    let mut parent = tokio::io::stderr();

    while let Some(item) = framed.next().await {
        match item {
            Ok(mut line) => {
                debug!(line = %line, "agent stderr");
                line.push('\n');
                if let Err(err) = parent.write_all(line.as_bytes()).await {
                    debug!(error = %err, "failed to forward agent stderr");
                }
            }
            Err(err) => {
                warn!(error = %err, "stderr read failed, stopping");
                break;
            }
        }
    }

    parent.flush().await.ok();
}

async fn join_quietly(task: JoinHandle<()>, name: &str) {
    match task.await {
        Ok(()) => {}
        Err(err) if err.is_cancelled() => debug!(task = name, "run helper task aborted"),
        Err(err) => warn!(task = name, %err, "run helper task failed"),
    }
}

// ── Exit / timeout ───────────────────────────────────────────────────────────

/// Wait for the child, killing it if `timeout` elapses first.
///
/// Returns the exit status and whether the timeout fired.
async fn wait_for_exit(child: &mut Child, timeout: Option<Duration>) -> Result<(ExitStatus, bool)> {
    let Some(limit) = timeout else {
        return Ok((child.wait().await?, false));
    };

    match tokio::time::timeout(limit, child.wait()).await {
        Ok(status) => Ok((status?, false)),
        Err(_elapsed) => {
            warn!(timeout = ?limit, "agent run timed out, killing process");
            terminate(child);
            Ok((child.wait().await?, true))
        }
    }
}

/// Send `SIGKILL` to the child's process group.
#[cfg(unix)]
fn terminate(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal as OsSignal};
    use nix::unistd::Pid;

    if let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) {
        match killpg(Pid::from_raw(pid), OsSignal::SIGKILL) {
            Ok(()) => return,
            Err(err) => warn!(pid, %err, "failed to kill process group, killing child only"),
        }
    }

    if let Err(err) = child.start_kill() {
        warn!(%err, "failed to kill agent process");
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    if let Err(err) = child.start_kill() {
        warn!(%err, "failed to kill agent process");
    }
}

/// Numeric exit code, mapping signal deaths to `128 + signal` on Unix.
#[must_use]
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    UNKNOWN_EXIT_CODE
}
