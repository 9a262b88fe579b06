//! Per-run options and the aggregated run result.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::models::signal::{Signal, SignalKind};

/// Callback invoked for every completed signal, in detection order.
pub type SignalHook<'a> = Box<dyn FnMut(&Signal) + Send + 'a>;

/// Callback invoked for every raw stdout line, without its newline.
pub type OutputHook<'a> = Box<dyn FnMut(&str) + Send + 'a>;

/// Options scoped to a single agent run.
///
/// Built with [`RunOptions::new`] and the chained setters:
///
/// ```rust,ignore
/// let options = RunOptions::new("implement T1")
///     .working_directory("/work/repo")
///     .env("CI", "1")
///     .timeout_ms(600_000)
///     .on_signal(|signal| println!("{}", signal.kind));
/// ```
pub struct RunOptions<'a> {
    /// Prompt delivered on stdin or as an argument, per the adapter.
    pub prompt: String,
    /// Child working directory; `None` inherits the parent's.
    pub working_directory: Option<PathBuf>,
    /// Variables overlaid on the inherited parent environment.
    pub env: HashMap<String, String>,
    /// Forced-termination deadline in milliseconds; 0 means unbounded.
    pub timeout_ms: u64,
    /// Maximum accepted stdout/stderr line length in bytes.
    pub max_line_bytes: usize,
    /// Signal callback.
    pub on_signal: Option<SignalHook<'a>>,
    /// Raw output callback.
    pub on_output: Option<OutputHook<'a>>,
}

impl<'a> RunOptions<'a> {
    /// Options with the given prompt and every other field at its default.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            working_directory: None,
            env: HashMap::new(),
            timeout_ms: 0,
            max_line_bytes: crate::runner::codec::MAX_LINE_BYTES,
            on_signal: None,
            on_output: None,
        }
    }

    /// Set the child working directory.
    #[must_use]
    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Add one environment override.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the timeout in milliseconds; 0 disables it.
    #[must_use]
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the maximum line length.
    #[must_use]
    pub fn max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Register the signal callback, replacing any previous one.
    #[must_use]
    pub fn on_signal(mut self, hook: impl FnMut(&Signal) + Send + 'a) -> Self {
        self.on_signal = Some(Box::new(hook));
        self
    }

    /// Register the raw output callback, replacing any previous one.
    #[must_use]
    pub fn on_output(mut self, hook: impl FnMut(&str) + Send + 'a) -> Self {
        self.on_output = Some(Box::new(hook));
        self
    }

    /// The configured timeout, or `None` when unbounded.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl Debug for RunOptions<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOptions")
            .field("prompt_len", &self.prompt.len())
            .field("working_directory", &self.working_directory)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .field("timeout_ms", &self.timeout_ms)
            .field("max_line_bytes", &self.max_line_bytes)
            .field("on_signal", &self.on_signal.is_some())
            .field("on_output", &self.on_output.is_some())
            .finish()
    }
}

/// Aggregated outcome of one agent run, produced once after termination.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunResult {
    /// Process exit code; `128 + signal` when killed by a signal, `-1` if unknown.
    pub exit_code: i32,
    /// Every stdout line, each terminated by `\n`.
    ///
    /// Lines longer than [`RunOptions::max_line_bytes`] are dropped while
    /// reading and are absent here, as they are from parsing and the output hook.
    pub stdout: String,
    /// Completed signals in detection order.
    pub signals: Vec<Signal>,
    /// Whether the run timeout fired and the process was killed.
    pub timed_out: bool,
    /// Wall-clock time from launch to exit.
    pub duration: Duration,
}

impl RunResult {
    /// `true` when the process exited with code 0 before any timeout.
    #[must_use]
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }

    /// Signals of a single kind, in detection order.
    pub fn signals_of<'s>(&'s self, kind: &'s SignalKind) -> impl Iterator<Item = &'s Signal> + 's {
        self.signals.iter().filter(move |signal| &signal.kind == kind)
    }

    /// Whether at least one signal of `kind` was detected.
    #[must_use]
    pub fn has_signal(&self, kind: &SignalKind) -> bool {
        self.signals.iter().any(|signal| &signal.kind == kind)
    }

    /// The most recently detected signal.
    #[must_use]
    pub fn last_signal(&self) -> Option<&Signal> {
        self.signals.last()
    }
}
