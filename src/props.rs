//! Kind-specific property extraction.
//!
//! Decides which of a record's optional fields are persisted as node
//! properties. One exhaustive match over the kind keeps each kind's
//! property list in a single place; adding a kind means adding one arm
//! here and one label in the model.

use serde_json::{Value, json};

use crate::model::{MemoryRecord, RecordKind};

/// The minimal kind-specific property set for a record, in persisted
/// property-name form.
///
/// Empty strings and a zero amount are treated as absent and omitted.
/// The one exception is `completed`: an explicit `false` on a Todo is
/// meaningful and must survive the falsy check.
pub fn kind_properties(record: &MemoryRecord) -> Vec<(&'static str, Value)> {
    let f = &record.fields;
    let mut props = Vec::new();

    match record.kind {
        RecordKind::Conversation => {
            push_text(&mut props, "summary", &f.summary);
        }
        RecordKind::Topic => {}
        RecordKind::Project => {
            push_text(&mut props, "name", &f.name);
            push_text(&mut props, "description", &f.description);
            push_text(&mut props, "status", &f.status);
        }
        RecordKind::Task => {
            push_text(&mut props, "title", &f.title);
            push_text(&mut props, "status", &f.status);
            push_text(&mut props, "dueDate", &f.due_date);
        }
        RecordKind::Issue => {
            push_text(&mut props, "title", &f.title);
            push_text(&mut props, "severity", &f.severity);
            push_text(&mut props, "status", &f.status);
        }
        RecordKind::Config => {
            push_text(&mut props, "key", &f.key);
            push_text(&mut props, "value", &f.value);
            push_text(&mut props, "environment", &f.environment);
        }
        RecordKind::Finance => {
            push_text(&mut props, "category", &f.category);
            if let Some(amount) = f.amount
                && amount != 0.0
            {
                props.push(("amount", json!(amount)));
            }
            push_text(&mut props, "currency", &f.currency);
        }
        RecordKind::Todo => {
            push_text(&mut props, "title", &f.title);
            if let Some(completed) = f.completed {
                props.push(("completed", json!(completed)));
            }
            push_text(&mut props, "priority", &f.priority);
        }
    }

    props
}

fn push_text(props: &mut Vec<(&'static str, Value)>, name: &'static str, value: &Option<String>) {
    if let Some(value) = value
        && !value.is_empty()
    {
        props.push((name, json!(value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewRecord, RecordFields};

    fn record(kind: RecordKind, fields: RecordFields) -> MemoryRecord {
        MemoryRecord::create(NewRecord::new(kind, "body").fields(fields))
    }

    fn names(record: &MemoryRecord) -> Vec<&'static str> {
        kind_properties(record).into_iter().map(|(n, _)| n).collect()
    }

    #[test]
    fn task_persists_only_task_fields() {
        let fields = RecordFields {
            title: Some("Ship it".into()),
            status: Some("open".into()),
            due_date: Some("2026-09-01".into()),
            // set but not a Task field, must not be persisted
            severity: Some("high".into()),
            ..Default::default()
        };
        assert_eq!(
            names(&record(RecordKind::Task, fields)),
            vec!["title", "status", "dueDate"]
        );
    }

    #[test]
    fn topic_has_no_specific_fields() {
        let fields = RecordFields {
            title: Some("ignored".into()),
            ..Default::default()
        };
        assert!(names(&record(RecordKind::Topic, fields)).is_empty());
    }

    #[test]
    fn empty_strings_are_omitted() {
        let fields = RecordFields {
            name: Some("".into()),
            description: Some("a project".into()),
            ..Default::default()
        };
        assert_eq!(
            names(&record(RecordKind::Project, fields)),
            vec!["description"]
        );
    }

    #[test]
    fn explicit_false_completed_is_kept() {
        let fields = RecordFields {
            title: Some("water plants".into()),
            completed: Some(false),
            ..Default::default()
        };
        let props = kind_properties(&record(RecordKind::Todo, fields));
        assert!(props.contains(&("completed", serde_json::json!(false))));
    }

    #[test]
    fn unset_completed_is_omitted() {
        let fields = RecordFields {
            title: Some("water plants".into()),
            ..Default::default()
        };
        assert_eq!(names(&record(RecordKind::Todo, fields)), vec!["title"]);
    }

    #[test]
    fn finance_amount_and_currency() {
        let fields = RecordFields {
            category: Some("travel".into()),
            amount: Some(129.5),
            currency: Some("EUR".into()),
            ..Default::default()
        };
        let props = kind_properties(&record(RecordKind::Finance, fields));
        assert_eq!(props.len(), 3);
        assert!(props.contains(&("amount", serde_json::json!(129.5))));
    }
}
