//! Result row normalization.
//!
//! The engine returns a matched node in one of several shapes depending
//! on which operation produced it. An ordered list of shape matchers is
//! tried in priority order; each either yields the node's property bag
//! or passes. New engine shapes slot in as new matchers without touching
//! the existing ones.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{Metadata, MemoryRecord, RecordFields, RecordKind, now_ms, parse_metadata};
use crate::query::{NODE_ALIAS, RELATED_ALIAS};

/// A located node: its property map plus whatever labels came with it.
struct Bag {
    properties: Metadata,
    labels: Vec<String>,
}

type Matcher = fn(&Value) -> Option<Bag>;

/// Priority order matters: the aliased shape is the common case for
/// `RETURN <alias>` queries, the flat shape is a legacy fallback.
const MATCHERS: &[Matcher] = &[aliased_node, bare_node, flat_legacy];

/// Map a raw result row into a record.
///
/// Fails with `Error::Normalization` only when no matcher recognizes the
/// row. Field-level problems degrade instead: missing content becomes an
/// empty string, missing timestamps become now, bad metadata becomes `{}`.
pub fn normalize_record(row: &Value) -> Result<MemoryRecord> {
    let bag = MATCHERS
        .iter()
        .find_map(|matcher| matcher(row))
        .ok_or_else(|| Error::Normalization(format!("unrecognized row shape: {row}")))?;

    Ok(record_from_bag(bag))
}

// ---------------------------------------------------------------------------
// Shape matchers
// ---------------------------------------------------------------------------

/// `{"m": {"properties": {...}, "labels": [...]}}` — the node nested
/// under its result alias. Known aliases are tried first, then any other
/// entry that looks like a node.
fn aliased_node(row: &Value) -> Option<Bag> {
    let obj = row.as_object()?;
    for alias in [NODE_ALIAS, RELATED_ALIAS] {
        if let Some(value) = obj.get(alias)
            && let Some(bag) = node_shape(value)
        {
            return Some(bag);
        }
    }
    obj.values().find_map(node_shape)
}

/// `{"properties": {...}, "labels": [...]}` — the node itself.
fn bare_node(row: &Value) -> Option<Bag> {
    node_shape(row)
}

/// A flat property object that already carries an `id` and no nested
/// wrapper. The kind comes from its `type` property when present.
fn flat_legacy(row: &Value) -> Option<Bag> {
    let obj = row.as_object()?;
    if !obj.contains_key("id") || obj.contains_key("properties") {
        return None;
    }
    Some(Bag {
        properties: obj.clone(),
        labels: Vec::new(),
    })
}

fn node_shape(value: &Value) -> Option<Bag> {
    let obj = value.as_object()?;
    let properties = obj.get("properties")?.as_object()?.clone();
    let labels = obj
        .get("labels")
        .and_then(Value::as_array)
        .map(|labels| {
            labels
                .iter()
                .filter_map(|label| label.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    Some(Bag { properties, labels })
}

// ---------------------------------------------------------------------------
// Record assembly
// ---------------------------------------------------------------------------

fn record_from_bag(bag: Bag) -> MemoryRecord {
    let props = &bag.properties;

    let kind = bag
        .labels
        .iter()
        .find_map(|label| RecordKind::from_label(label))
        .or_else(|| {
            props
                .get("type")
                .and_then(Value::as_str)
                .and_then(RecordKind::from_label)
        })
        .unwrap_or(RecordKind::Conversation);

    let now = now_ms();
    let metadata = match props.get("metadata") {
        Some(Value::String(raw)) => parse_metadata(raw),
        // Some engines hand the map back already deserialized.
        Some(Value::Object(map)) => map.clone(),
        _ => Metadata::new(),
    };

    MemoryRecord {
        id: text(props, "id").unwrap_or_default(),
        kind,
        content: text(props, "content").unwrap_or_default(),
        created: props.get("created").and_then(Value::as_i64).unwrap_or(now),
        updated: props.get("updated").and_then(Value::as_i64).unwrap_or(now),
        metadata,
        // Permissive copy-through: any recognized field present on the
        // node lands on the record, whatever its kind.
        fields: RecordFields {
            name: text(props, "name"),
            title: text(props, "title"),
            description: text(props, "description"),
            summary: text(props, "summary"),
            status: text(props, "status"),
            severity: text(props, "severity"),
            key: text(props, "key"),
            value: text(props, "value"),
            environment: text(props, "environment"),
            category: text(props, "category"),
            amount: props.get("amount").and_then(Value::as_f64),
            currency: text(props, "currency"),
            completed: props.get("completed").and_then(Value::as_bool),
            priority: text(props, "priority"),
            due_date: text(props, "dueDate"),
        },
    }
}

/// String property, tolerating numeric values (a priority stored as a
/// number reads back as its decimal form).
fn text(props: &Metadata, name: &str) -> Option<String> {
    match props.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_props() -> Value {
        json!({
            "id": "rec-1",
            "type": "Task",
            "content": "file the report",
            "created": 1_700_000_000_000i64,
            "updated": 1_700_000_000_500i64,
            "metadata": "{\"person\":\"kelly\"}",
            "title": "Quarterly report",
            "status": "open"
        })
    }

    #[test]
    fn aliased_shape_is_recognized() {
        let row = json!({ "m": { "properties": task_props(), "labels": ["Task"] } });
        let record = normalize_record(&row).unwrap();

        assert_eq!(record.id, "rec-1");
        assert_eq!(record.kind, RecordKind::Task);
        assert_eq!(record.content, "file the report");
        assert_eq!(record.metadata["person"], json!("kelly"));
        assert_eq!(record.fields.title.as_deref(), Some("Quarterly report"));
    }

    #[test]
    fn related_alias_is_recognized() {
        let row = json!({ "related": { "properties": task_props(), "labels": ["Task"] } });
        assert_eq!(normalize_record(&row).unwrap().id, "rec-1");
    }

    #[test]
    fn bare_node_shape_is_recognized() {
        let row = json!({ "properties": task_props(), "labels": ["Task"] });
        let record = normalize_record(&row).unwrap();
        assert_eq!(record.kind, RecordKind::Task);
    }

    #[test]
    fn flat_legacy_shape_reads_kind_from_type() {
        let record = normalize_record(&task_props()).unwrap();
        assert_eq!(record.kind, RecordKind::Task);
        assert_eq!(record.id, "rec-1");
    }

    #[test]
    fn flat_legacy_shape_defaults_to_conversation() {
        let row = json!({ "id": "rec-2", "content": "hello" });
        let record = normalize_record(&row).unwrap();
        assert_eq!(record.kind, RecordKind::Conversation);
    }

    #[test]
    fn unrecognized_shape_is_an_error() {
        assert!(normalize_record(&json!("just a string")).is_err());
        assert!(normalize_record(&json!({ "rows": 3 })).is_err());
        assert!(normalize_record(&json!(null)).is_err());
    }

    #[test]
    fn missing_fields_fall_back_safely() {
        let row = json!({ "m": { "properties": { "id": "rec-3" }, "labels": ["Topic"] } });
        let record = normalize_record(&row).unwrap();

        assert_eq!(record.content, "");
        assert!(record.metadata.is_empty());
        assert!(record.created > 0);
        assert!(record.updated > 0);
    }

    #[test]
    fn malformed_metadata_degrades_to_empty() {
        let row = json!({
            "m": {
                "properties": { "id": "rec-4", "metadata": "not json {{{" },
                "labels": ["Config"]
            }
        });
        let record = normalize_record(&row).unwrap();
        assert!(record.metadata.is_empty());
    }

    #[test]
    fn unexpected_fields_are_copied_through() {
        // A Task node carrying a severity it was never supposed to have.
        let row = json!({
            "m": {
                "properties": { "id": "rec-5", "type": "Task", "severity": "high" },
                "labels": ["Task"]
            }
        });
        let record = normalize_record(&row).unwrap();
        assert_eq!(record.fields.severity.as_deref(), Some("high"));
    }

    #[test]
    fn label_wins_over_type_property() {
        let row = json!({
            "m": {
                "properties": { "id": "rec-6", "type": "Task" },
                "labels": ["Issue"]
            }
        });
        assert_eq!(normalize_record(&row).unwrap().kind, RecordKind::Issue);
    }

    #[test]
    fn false_completed_survives_normalization() {
        let row = json!({
            "m": {
                "properties": { "id": "rec-7", "completed": false },
                "labels": ["Todo"]
            }
        });
        assert_eq!(normalize_record(&row).unwrap().fields.completed, Some(false));
    }
}
