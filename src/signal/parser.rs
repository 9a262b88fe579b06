//! Incremental parser for signal blocks embedded in agent output.
//!
//! Agents report progress by printing HTML-comment markers on stdout:
//!
//! ```text
//! <!-- SIGNAL:TASK_COMPLETE task="T1" -->
//! Done
//! <!-- /SIGNAL -->
//! ```
//!
//! Both markers may share one line, and the legacy literal
//! `<promise>COMPLETE</promise>` is still recognised. The parser never fails:
//! malformed markers degrade to fewer attributes or to no signal at all.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::signal::{Signal, SignalKind};

/// Legacy whole-run completion marker.
pub const LEGACY_COMPLETE_MARKER: &str = "<promise>COMPLETE</promise>";

#[allow(clippy::expect_used)]
static OPEN_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*SIGNAL:([A-Za-z0-9_]+)(.*?)-->").expect("open marker pattern is valid")
});

#[allow(clippy::expect_used)]
static CLOSE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*/SIGNAL\s*-->").expect("close marker pattern is valid")
});

#[allow(clippy::expect_used)]
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][A-Za-z0-9_-]*)\s*=\s*"([^"]*)""#).expect("attribute pattern is valid")
});

/// Open marker seen without its close marker yet.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingBlock {
    kind: SignalKind,
    attributes: BTreeMap<String, String>,
    body_lines: Vec<String>,
}

/// Line-at-a-time signal parser.
///
/// One instance belongs to exactly one run. A block is pending from its
/// open marker until its close marker; [`reset`](Self::reset) discards it.
#[derive(Debug, Clone, Default)]
pub struct SignalParser {
    pending: Option<PendingBlock>,
}

impl SignalParser {
    /// Create a parser with no pending block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one line (without its newline) and return a signal if it
    /// completes one.
    ///
    /// Checks run in priority order:
    /// 1. the legacy completion marker, regardless of state;
    /// 2. a close marker while a block is pending;
    /// 3. an open marker, emitted immediately when a close marker follows
    ///    on the same line;
    /// 4. body text while a block is pending.
    ///
    /// An open marker seen while a block is already pending is body text.
    pub fn feed(&mut self, line: &str) -> Option<Signal> {
        if line.contains(LEGACY_COMPLETE_MARKER) {
            if self.pending.is_some() {
                debug!("legacy completion marker inside an open signal block");
            }
            return Some(Signal::legacy_complete());
        }

        if let Some(mut block) = self.pending.take() {
            if CLOSE_MARKER.is_match(line) {
                let body = block.body_lines.join("\n").trim().to_owned();
                return Some(Signal::new(block.kind, block.attributes, body));
            }

            block.body_lines.push(line.to_owned());
            self.pending = Some(block);
            return None;
        }

        let open = OPEN_MARKER.captures(line)?;
        let (Some(whole), Some(tag)) = (open.get(0), open.get(1)) else {
            return None;
        };
        let kind = SignalKind::from_tag(tag.as_str());
        let attributes = parse_attributes(open.get(2).map_or("", |m| m.as_str()));

        let rest = &line[whole.end()..];
        if let Some(close) = CLOSE_MARKER.find(rest) {
            let body = rest[..close.start()].trim().to_owned();
            return Some(Signal::new(kind, attributes, body));
        }

        self.pending = Some(PendingBlock {
            kind,
            attributes,
            body_lines: Vec::new(),
        });
        None
    }

    /// Discard any in-progress block.
    pub fn reset(&mut self) {
        self.pending = None;
    }

    /// Whether an open marker is still waiting for its close marker.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Tag of the pending block, if any.
    #[must_use]
    pub fn pending_kind(&self) -> Option<&SignalKind> {
        self.pending.as_ref().map(|block| &block.kind)
    }
}

/// Extract `key="value"` pairs; later duplicates overwrite earlier ones.
fn parse_attributes(raw: &str) -> BTreeMap<String, String> {
    ATTRIBUTE
        .captures_iter(raw)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str().to_owned();
            let value = caps.get(2)?.as_str().to_owned();
            Some((key, value))
        })
        .collect()
}
