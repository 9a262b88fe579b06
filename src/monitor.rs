//! Per-signal-type dispatch over the process runner.
//!
//! [`monitor`] composes onto the [`RunOptions`] hooks: raw output is echoed
//! to the parent's stdout (unless disabled), and each signal goes to the
//! catch-all handler, then the handler registered for its kind, then any
//! `on_signal` hook already present on the base options.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::io::Write;

use tracing::debug;

use crate::models::adapter::AdapterDescriptor;
use crate::models::run::{RunOptions, RunResult, SignalHook};
use crate::models::signal::{Signal, SignalKind};
use crate::runner;
use crate::Result;

/// Options for [`monitor`]: runner options plus signal handlers.
pub struct MonitorOptions<'a> {
    /// Underlying runner options.
    pub run: RunOptions<'a>,
    /// One handler per signal kind.
    pub handlers: HashMap<SignalKind, SignalHook<'a>>,
    /// Invoked for every signal before its kind-specific handler.
    pub on_any: Option<SignalHook<'a>>,
    /// Echo raw agent output to the parent's stdout.
    pub echo_output: bool,
}

impl<'a> MonitorOptions<'a> {
    /// Wrap runner options with no handlers and echo enabled.
    #[must_use]
    pub fn new(run: RunOptions<'a>) -> Self {
        Self {
            run,
            handlers: HashMap::new(),
            on_any: None,
            echo_output: true,
        }
    }

    /// Register the handler for `kind`, replacing any previous one.
    #[must_use]
    pub fn on(mut self, kind: SignalKind, handler: impl FnMut(&Signal) + Send + 'a) -> Self {
        self.handlers.insert(kind, Box::new(handler));
        self
    }

    /// Register the catch-all handler.
    #[must_use]
    pub fn on_any(mut self, handler: impl FnMut(&Signal) + Send + 'a) -> Self {
        self.on_any = Some(Box::new(handler));
        self
    }

    /// Enable or disable echoing raw output.
    #[must_use]
    pub fn echo_output(mut self, echo: bool) -> Self {
        self.echo_output = echo;
        self
    }
}

impl Debug for MonitorOptions<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorOptions")
            .field("run", &self.run)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("on_any", &self.on_any.is_some())
            .field("echo_output", &self.echo_output)
            .finish()
    }
}

/// Run an agent, dispatching each signal to its registered handlers.
///
/// # Errors
///
/// Same as [`runner::run`]; dispatch adds no failure modes.
pub async fn monitor(adapter: &AdapterDescriptor, options: MonitorOptions<'_>) -> Result<RunResult> {
    let MonitorOptions {
        mut run,
        mut handlers,
        mut on_any,
        echo_output,
    } = options;

    let mut base_signal = run.on_signal.take();
    run.on_signal = Some(Box::new(move |signal: &Signal| {
        if let Some(handler) = on_any.as_mut() {
            handler(signal);
        }
        if let Some(handler) = handlers.get_mut(&signal.kind) {
            handler(signal);
        }
        if let Some(hook) = base_signal.as_mut() {
            hook(signal);
        }
    }));

    if echo_output {
        let mut base_output = run.on_output.take();
        run.on_output = Some(Box::new(move |line: &str| {
            let mut stdout = std::io::stdout().lock();
            if let Err(err) = writeln!(stdout, "{line}").and_then(|()| stdout.flush()) {
                debug!(error = %err, "failed to echo agent output");
            }
            if let Some(hook) = base_output.as_mut() {
                hook(line);
            }
        }));
    }

    runner::run(adapter, run).await
}
