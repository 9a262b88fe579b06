//! Unit tests for signal kinds and signal records.

use std::collections::BTreeMap;

use agent_signal::{Signal, SignalKind};

const KNOWN_TAGS: [&str; 7] = [
    "COMPLETE",
    "TASK_COMPLETE",
    "PHASE_COMPLETE",
    "PROGRESS",
    "BLOCKED",
    "REVIEW_FINDING",
    "REVIEW_COMPLETE",
];

#[test]
fn known_tags_map_to_dedicated_variants() {
    for tag in KNOWN_TAGS {
        let kind = SignalKind::from_tag(tag);
        assert!(!matches!(kind, SignalKind::Other(_)), "{tag} must be known");
        assert_eq!(kind.as_str(), tag);
        assert_eq!(kind.to_string(), tag);
    }
}

#[test]
fn unknown_tag_is_kept_verbatim() {
    let kind = SignalKind::from_tag("SCREEN_DONE");

    assert_eq!(kind, SignalKind::Other("SCREEN_DONE".into()));
    assert_eq!(kind.as_str(), "SCREEN_DONE");
}

#[test]
fn tags_are_case_sensitive() {
    assert_eq!(
        SignalKind::from_tag("complete"),
        SignalKind::Other("complete".into())
    );
}

#[test]
fn legacy_complete_has_no_attributes_or_body() {
    let signal = Signal::legacy_complete();

    assert_eq!(signal.kind, SignalKind::Complete);
    assert!(signal.attributes.is_empty());
    assert!(signal.body.is_empty());
}

#[test]
fn attr_returns_value_or_none() {
    let mut attributes = BTreeMap::new();
    attributes.insert("task".to_owned(), "T7".to_owned());
    let signal = Signal::new(SignalKind::TaskComplete, attributes, "done".into());

    assert_eq!(signal.attr("task"), Some("T7"));
    assert_eq!(signal.attr("phase"), None);
}

#[test]
fn signal_serializes_kind_as_type_string() {
    let mut attributes = BTreeMap::new();
    attributes.insert("id".to_owned(), "F1".to_owned());
    let signal = Signal::new(SignalKind::ReviewFinding, attributes, "nit".into());

    let json = serde_json::to_value(&signal).expect("serializable");

    assert_eq!(
        json,
        serde_json::json!({
            "type": "REVIEW_FINDING",
            "attributes": { "id": "F1" },
            "body": "nit",
        })
    );
}

#[test]
fn other_kind_serializes_as_raw_tag() {
    let json = serde_json::to_value(SignalKind::Other("CUSTOM".into())).expect("serializable");
    assert_eq!(json, serde_json::json!("CUSTOM"));
}
