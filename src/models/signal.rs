//! Signals embedded by agents in their standard output.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Serialize, Serializer};

/// Signal type tag, as written after `SIGNAL:` in an open marker.
///
/// Known tags map to dedicated variants so consumers can match exhaustively;
/// anything else is preserved verbatim in [`SignalKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalKind {
    /// Whole-run completion; also produced by the legacy `<promise>` marker.
    Complete,
    /// A single task finished.
    TaskComplete,
    /// A planned phase finished.
    PhaseComplete,
    /// Intermediate progress report.
    Progress,
    /// The agent cannot continue without outside help.
    Blocked,
    /// One finding from a review pass.
    ReviewFinding,
    /// A review pass finished.
    ReviewComplete,
    /// Any tag not listed above.
    Other(String),
}

impl SignalKind {
    /// Map a raw marker tag to its kind.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "COMPLETE" => Self::Complete,
            "TASK_COMPLETE" => Self::TaskComplete,
            "PHASE_COMPLETE" => Self::PhaseComplete,
            "PROGRESS" => Self::Progress,
            "BLOCKED" => Self::Blocked,
            "REVIEW_FINDING" => Self::ReviewFinding,
            "REVIEW_COMPLETE" => Self::ReviewComplete,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Raw marker tag for this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Complete => "COMPLETE",
            Self::TaskComplete => "TASK_COMPLETE",
            Self::PhaseComplete => "PHASE_COMPLETE",
            Self::Progress => "PROGRESS",
            Self::Blocked => "BLOCKED",
            Self::ReviewFinding => "REVIEW_FINDING",
            Self::ReviewComplete => "REVIEW_COMPLETE",
            Self::Other(tag) => tag,
        }
    }
}

impl Display for SignalKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SignalKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One completed signal block.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Signal {
    /// Signal type.
    #[serde(rename = "type")]
    pub kind: SignalKind,
    /// `key="value"` attributes from the open marker; last duplicate wins.
    pub attributes: BTreeMap<String, String>,
    /// Trimmed text between the markers.
    pub body: String,
}

impl Signal {
    /// Construct a signal from its parts.
    #[must_use]
    pub fn new(kind: SignalKind, attributes: BTreeMap<String, String>, body: String) -> Self {
        Self {
            kind,
            attributes,
            body,
        }
    }

    /// The attribute-less `COMPLETE` signal emitted for `<promise>COMPLETE</promise>`.
    #[must_use]
    pub fn legacy_complete() -> Self {
        Self::new(SignalKind::Complete, BTreeMap::new(), String::new())
    }

    /// Look up a single attribute value.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}
