//! Adapter descriptors: how to invoke one specific agent program.

use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

/// Argument placeholder replaced by the prompt when it is not sent on stdin.
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// Minimal, immutable description of an agent command line.
///
/// ```toml
/// [adapters.claude]
/// argv = ["claude", "-p", "--dangerously-skip-permissions"]
/// stdin = true
///
/// [adapters.codex]
/// argv = ["codex", "exec", "{prompt}"]
/// stdin = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AdapterDescriptor {
    /// Display name; filled from the table key when loaded from config.
    #[serde(default)]
    pub name: String,
    /// Program followed by its arguments.
    pub argv: Vec<String>,
    /// Deliver the prompt on standard input instead of as an argument.
    #[serde(default)]
    pub stdin: bool,
}

impl AdapterDescriptor {
    /// Construct a descriptor from its parts.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, argv: I, stdin: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            argv: argv.into_iter().map(Into::into).collect(),
            stdin,
        }
    }

    /// Ensure the descriptor names a program to execute.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `argv` is empty or its first element is blank.
    pub fn validate(&self) -> Result<()> {
        match self.argv.first() {
            Some(program) if !program.trim().is_empty() => Ok(()),
            _ => Err(AppError::Config(format!(
                "adapter `{}` has an empty argv",
                self.name
            ))),
        }
    }

    /// Build the program and argument list for one run.
    ///
    /// With stdin delivery the argv is used as-is. Otherwise every argument
    /// equal to [`PROMPT_PLACEHOLDER`] is replaced by `prompt`, and if there
    /// is no placeholder the prompt becomes the final argument.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the descriptor fails [`validate`](Self::validate).
    pub fn command_line(&self, prompt: &str) -> Result<(String, Vec<String>)> {
        self.validate()?;

        let (program, rest) = match self.argv.split_first() {
            Some((program, rest)) => (program.clone(), rest),
            None => return Err(AppError::Config("adapter argv is empty".into())),
        };

        if self.stdin {
            return Ok((program, rest.to_vec()));
        }

        let mut substituted = false;
        let mut args: Vec<String> = rest
            .iter()
            .map(|arg| {
                if arg == PROMPT_PLACEHOLDER {
                    substituted = true;
                    prompt.to_owned()
                } else {
                    arg.clone()
                }
            })
            .collect();

        if !substituted {
            args.push(prompt.to_owned());
        }

        Ok((program, args))
    }
}
