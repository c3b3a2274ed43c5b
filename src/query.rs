//! Cypher query construction.
//!
//! Every operation produces a `GraphQuery`: query text with named
//! placeholders plus the bound parameter map. Caller-controlled values
//! never reach the text — only enum-validated labels and relation types
//! and allow-listed order-by property names are interpolated.

use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::graph::Params;
use crate::model::{
    MemoryRecord, MemoryRelation, QueryOptions, RelationKind, SearchCriteria, serialize_metadata,
};
use crate::props::kind_properties;

/// Result alias for the matched record node.
pub const NODE_ALIAS: &str = "m";
/// Result alias for the target of an outgoing relation.
pub const RELATED_ALIAS: &str = "related";

/// Node properties that may appear in an ORDER BY clause.
const ORDERABLE_FIELDS: &[&str] = &[
    "id",
    "type",
    "content",
    "created",
    "updated",
    "name",
    "title",
    "description",
    "summary",
    "status",
    "severity",
    "key",
    "value",
    "environment",
    "category",
    "amount",
    "currency",
    "completed",
    "priority",
    "dueDate",
];

/// A parameterized query ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQuery {
    pub text: String,
    pub params: Params,
}

impl GraphQuery {
    fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Params::new(),
        }
    }

    fn param(&mut self, name: impl Into<String>, value: Value) {
        self.params.insert(name.into(), value);
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Node creation: label from the record's kind, core properties plus the
/// extracted kind-specific set. `RETURN m` lets the caller detect a write
/// that had no effect.
pub fn create_record(record: &MemoryRecord) -> GraphQuery {
    let props = record_properties(record);

    let clause = props
        .iter()
        .map(|(name, _)| format!("{name}: ${name}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut query = GraphQuery::new(format!(
        "CREATE ({NODE_ALIAS}:{label} {{{clause}}}) RETURN {NODE_ALIAS}",
        label = record.kind.as_label(),
    ));
    for (name, value) in props {
        query.param(name, value);
    }
    query
}

/// Directed edge creation between two existing-by-id nodes, labels
/// ignored. A missing endpoint yields zero rows and zero edges; the
/// returned count lets the caller observe that without failing.
pub fn create_relation(relation: &MemoryRelation) -> GraphQuery {
    let mut query = GraphQuery::new(format!(
        "MATCH (a {{id: $from}}), (b {{id: $to}}) \
         CREATE (a)-[r:{kind} {{properties: $properties}}]->(b) \
         RETURN count(r) AS created",
        kind = relation.kind.as_type(),
    ));
    query.param("from", json!(relation.from));
    query.param("to", json!(relation.to));
    query.param("properties", json!(serialize_metadata(&relation.properties)));
    query
}

/// Match any node by id, regardless of label.
pub fn fetch_by_id(id: &str) -> GraphQuery {
    let mut query = GraphQuery::new(format!(
        "MATCH ({NODE_ALIAS} {{id: $id}}) RETURN {NODE_ALIAS}"
    ));
    query.param("id", json!(id));
    query
}

/// Single SET clause over every field present in the merged record:
/// content, updated, metadata, title, and the extracted kind properties.
/// `id`, `type`, and `created` are immutable and never touched.
pub fn update_record(record: &MemoryRecord) -> GraphQuery {
    let props: Vec<_> = record_properties(record)
        .into_iter()
        .filter(|(name, _)| !matches!(*name, "id" | "type" | "created"))
        .collect();

    let clause = props
        .iter()
        .map(|(name, _)| format!("{NODE_ALIAS}.{name} = ${name}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut query = GraphQuery::new(format!(
        "MATCH ({NODE_ALIAS} {{id: $id}}) SET {clause} RETURN {NODE_ALIAS}"
    ));
    query.param("id", json!(record.id));
    for (name, value) in props {
        query.param(name, value);
    }
    query
}

/// Detach-delete by id: the node and all incident edges go in one atomic
/// operation. Returns the deleted-node count so the caller can report
/// whether anything was removed.
pub fn delete_record(id: &str) -> GraphQuery {
    let mut query = GraphQuery::new(format!(
        "MATCH ({NODE_ALIAS} {{id: $id}}) DETACH DELETE {NODE_ALIAS} \
         RETURN count({NODE_ALIAS}) AS deleted"
    ));
    query.param("id", json!(id));
    query
}

/// All targets of outgoing edges from a node, optionally restricted to
/// one relation type.
pub fn related_from(id: &str, kind: Option<RelationKind>) -> GraphQuery {
    let edge = match kind {
        Some(kind) => format!("[r:{}]", kind.as_type()),
        None => "[r]".to_string(),
    };
    let mut query = GraphQuery::new(format!(
        "MATCH ({NODE_ALIAS} {{id: $id}})-{edge}->({RELATED_ALIAS}) RETURN {RELATED_ALIAS}"
    ));
    query.param("id", json!(id));
    query
}

/// Conjunctive search: kind label, keyword containment, inclusive created
/// range, and per-entry metadata tests, joined with AND. Ordering defaults
/// to `created DESC`; pagination via SKIP/LIMIT parameters.
pub fn search(criteria: &SearchCriteria, options: &QueryOptions) -> Result<GraphQuery> {
    let mut query = GraphQuery::new(String::new());
    let mut clauses: Vec<String> = Vec::new();

    if let Some(kind) = criteria.kind {
        clauses.push(format!("{NODE_ALIAS}:{}", kind.as_label()));
    }

    if let Some(keyword) = criteria.keyword.as_deref() {
        let keyword = keyword.trim();
        if !keyword.is_empty() {
            clauses.push(keyword_clause(&mut query, keyword, criteria.fuzzy));
        }
    }

    if let Some(after) = criteria.created_after {
        clauses.push(format!("{NODE_ALIAS}.created >= $createdAfter"));
        query.param("createdAfter", json!(after));
    }
    if let Some(before) = criteria.created_before {
        clauses.push(format!("{NODE_ALIAS}.created <= $createdBefore"));
        query.param("createdBefore", json!(before));
    }

    // Metadata lives on the node as one serialized string, so each entry
    // becomes a containment test against its serialized "key":value form.
    // String values drop the closing quote: a partial value still matches
    // inside the stored string, keeping containment semantics.
    for (i, (key, value)) in criteria.metadata.iter().enumerate() {
        let name = format!("meta{i}");
        let mut fragment = format!(
            "{}:{}",
            serde_json::to_string(key).unwrap_or_default(),
            serde_json::to_string(value).unwrap_or_default(),
        );
        if value.is_string() {
            fragment.pop();
            clauses.push(format!(
                "toLower({NODE_ALIAS}.metadata) CONTAINS toLower(${name})"
            ));
        } else {
            clauses.push(format!("{NODE_ALIAS}.metadata CONTAINS ${name}"));
        }
        query.param(name, json!(fragment));
    }

    let mut text = format!("MATCH ({NODE_ALIAS})");
    if !clauses.is_empty() {
        text.push_str(" WHERE ");
        text.push_str(&clauses.join(" AND "));
    }
    text.push_str(&format!(" RETURN {NODE_ALIAS}"));

    let order_by = validate_order_field(options.order_by.as_deref().unwrap_or("created"))?;
    text.push_str(&format!(
        " ORDER BY {NODE_ALIAS}.{order_by} {}",
        options.direction.as_cypher()
    ));

    if let Some(offset) = options.offset {
        // Page-based offset: with a page size set, skip whole pages.
        let skip = match options.limit {
            Some(limit) if limit > 0 => offset * limit,
            _ => offset,
        };
        text.push_str(" SKIP $skip");
        query.param("skip", json!(skip));
    }
    if let Some(limit) = options.limit {
        text.push_str(" LIMIT $limit");
        query.param("limit", json!(limit));
    }

    query.text = text;
    Ok(query)
}

/// One idempotent id-index statement per kind label.
pub fn create_id_indexes() -> Vec<GraphQuery> {
    crate::model::RecordKind::ALL
        .iter()
        .map(|kind| {
            GraphQuery::new(format!(
                "CREATE INDEX {name} IF NOT EXISTS FOR (n:{label}) ON (n.id)",
                name = format!("idx_{}_id", kind.as_label().to_lowercase()),
                label = kind.as_label(),
            ))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Case-insensitive containment tests against content and title.
///
/// Fuzzy: one test per whitespace-split term, plus the whole phrase when
/// there is more than one term, all OR'ed. Exact: the whole phrase only.
fn keyword_clause(query: &mut GraphQuery, keyword: &str, fuzzy: bool) -> String {
    let mut tests = Vec::new();

    if fuzzy {
        let terms: Vec<&str> = keyword.split_whitespace().collect();
        for (i, term) in terms.iter().enumerate() {
            let name = format!("kw{i}");
            tests.push(containment_test(&name));
            query.param(name, json!(term));
        }
        if terms.len() > 1 {
            tests.push(containment_test("kwPhrase"));
            query.param("kwPhrase", json!(keyword));
        }
    } else {
        tests.push(containment_test("keyword"));
        query.param("keyword", json!(keyword));
    }

    format!("({})", tests.join(" OR "))
}

fn containment_test(param: &str) -> String {
    format!(
        "(toLower({NODE_ALIAS}.content) CONTAINS toLower(${param}) \
         OR toLower({NODE_ALIAS}.title) CONTAINS toLower(${param}))"
    )
}

fn validate_order_field(field: &str) -> Result<&str> {
    if ORDERABLE_FIELDS.contains(&field) {
        Ok(field)
    } else {
        Err(Error::Invalid {
            what: "order-by field",
            value: field.to_string(),
        })
    }
}

/// Full persisted property set for a record: the fixed core properties,
/// `title` whenever non-empty, then the kind-specific extraction. Order
/// is stable so the generated clause text is deterministic.
fn record_properties(record: &MemoryRecord) -> Vec<(&'static str, Value)> {
    let mut props = vec![
        ("id", json!(record.id)),
        ("type", json!(record.kind.as_label())),
        ("content", json!(record.content)),
        ("created", json!(record.created)),
        ("updated", json!(record.updated)),
        ("metadata", json!(serialize_metadata(&record.metadata))),
    ];

    // Title is kept on every kind that has one, even where it is not a
    // kind-specific field.
    if let Some(title) = &record.fields.title
        && !title.is_empty()
    {
        props.push(("title", json!(title)));
    }

    for (name, value) in kind_properties(record) {
        if !props.iter().any(|(existing, _)| *existing == name) {
            props.push((name, value));
        }
    }

    props
}
