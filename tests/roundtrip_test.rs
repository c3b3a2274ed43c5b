//! Write-path / read-path agreement.
//!
//! For every kind, the property set the create query binds must
//! normalize back into the record it was built from: id, kind, content,
//! timestamps, metadata, and each kind-specific field.

use mnemo_rs::model::{Metadata, MemoryRecord, NewRecord, RecordFields, RecordKind};
use mnemo_rs::normalize::normalize_record;
use mnemo_rs::query::create_record;
use pretty_assertions::assert_eq;
use serde_json::json;

/// The full legal field set for a kind, in non-falsy form (plus an
/// explicit false `completed`, which must survive on its own).
fn fields_for(kind: RecordKind) -> RecordFields {
    match kind {
        RecordKind::Conversation => RecordFields {
            summary: Some("talked about billing".into()),
            ..Default::default()
        },
        RecordKind::Topic => RecordFields::default(),
        RecordKind::Project => RecordFields {
            name: Some("atlas".into()),
            description: Some("migrate the billing stack".into()),
            status: Some("active".into()),
            ..Default::default()
        },
        RecordKind::Task => RecordFields {
            title: Some("file the report".into()),
            status: Some("open".into()),
            due_date: Some("2026-09-01".into()),
            ..Default::default()
        },
        RecordKind::Issue => RecordFields {
            title: Some("gateway timeout".into()),
            severity: Some("high".into()),
            status: Some("open".into()),
            ..Default::default()
        },
        RecordKind::Config => RecordFields {
            key: Some("max_retries".into()),
            value: Some("5".into()),
            environment: Some("prod".into()),
            ..Default::default()
        },
        RecordKind::Finance => RecordFields {
            category: Some("travel".into()),
            amount: Some(129.5),
            currency: Some("EUR".into()),
            ..Default::default()
        },
        RecordKind::Todo => RecordFields {
            title: Some("water the plants".into()),
            completed: Some(false),
            priority: Some("low".into()),
            ..Default::default()
        },
    }
}

/// Rebuild the row the engine would return for a freshly created node:
/// the exact bound parameters as properties, under the node alias.
fn as_row(record: &MemoryRecord) -> serde_json::Value {
    let query = create_record(record);
    json!({ "m": { "properties": query.params, "labels": [record.kind.as_label()] } })
}

#[test]
fn full_field_sets_round_trip_for_every_kind() {
    for kind in RecordKind::ALL {
        let mut metadata = Metadata::new();
        metadata.insert("person".into(), json!("kelly"));
        metadata.insert("count".into(), json!(3));

        let record = MemoryRecord::create(
            NewRecord::new(kind, format!("{kind} body"))
                .metadata(metadata)
                .fields(fields_for(kind)),
        );

        let normalized = normalize_record(&as_row(&record)).unwrap();
        assert_eq!(normalized, record, "kind {kind}");
    }
}

#[test]
fn bare_records_round_trip_for_every_kind() {
    for kind in RecordKind::ALL {
        let record = MemoryRecord::create(NewRecord::new(kind, "just a body"));
        let normalized = normalize_record(&as_row(&record)).unwrap();
        assert_eq!(normalized, record, "kind {kind}");
    }
}
