//! Versioned upgrades for the stored demo document.
//!
//! Invoked on the raw JSON value at load time, before deserialization, so
//! documents written by older builds keep loading.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use super::repository::default_school_term;

/// Current demo document schema version.
pub(super) const SCHEMA_VERSION: u32 = 2;

/// Term placeholder used by documents that predate term tracking.
const LEGACY_UNSET_TERM: &str = "未分期";

/// Upgrade a raw document to the current schema version.
pub(super) fn upgrade(mut document: Value) -> Value {
    let version = document
        .get("schema_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(1) as u32;

    if version < 2 {
        upgrade_v1_to_v2(&mut document);
    }

    document["schema_version"] = json!(SCHEMA_VERSION);
    document
}

/// v1 -> v2: every wrong question gets a real school term (derived from its
/// creation date when missing or still the legacy placeholder) and explicit
/// image fields.
fn upgrade_v1_to_v2(document: &mut Value) {
    let Some(questions) = document
        .get_mut("wrong_questions")
        .and_then(|v| v.as_array_mut())
    else {
        return;
    };

    for question in questions {
        let term_is_set = question
            .get("term")
            .and_then(|t| t.as_str())
            .map(|t| {
                let t = t.trim();
                !t.is_empty() && t != LEGACY_UNSET_TERM
            })
            .unwrap_or(false);

        if !term_is_set {
            let reference_date = ["created_at", "updated_at"]
                .iter()
                .find_map(|field| question.get(*field).and_then(|v| v.as_str()))
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|date| date.with_timezone(&Utc))
                .unwrap_or_else(Utc::now);
            question["term"] = json!(default_school_term(reference_date));
        }

        if question.get("image_data").is_none() {
            question["image_data"] = Value::Null;
        }
        if question.get("image_name").is_none() {
            question["image_name"] = Value::Null;
        }
    }
}
