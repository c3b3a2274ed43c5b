//! Core data model.
//!
//! A memory record is one unit of stored knowledge, persisted as a labeled
//! node in the graph. Its kind (the node label) determines which extra
//! fields it is expected to carry; relations are directed typed edges
//! between records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Open string→JSON mapping carried by records and relations.
///
/// Persisted as a single serialized string property on the node/edge.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Current time in epoch milliseconds. All record timestamps use this.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ---------------------------------------------------------------------------
// Record Kind
// ---------------------------------------------------------------------------

/// The closed set of record categories. Doubles as the node label,
/// which is why the set is enum-checked before ever reaching query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Conversation,
    Topic,
    Project,
    Task,
    Issue,
    Config,
    Finance,
    Todo,
}

impl RecordKind {
    /// All kinds, in declaration order. Used for index creation.
    pub const ALL: [RecordKind; 8] = [
        RecordKind::Conversation,
        RecordKind::Topic,
        RecordKind::Project,
        RecordKind::Task,
        RecordKind::Issue,
        RecordKind::Config,
        RecordKind::Finance,
        RecordKind::Todo,
    ];

    /// The node label used in query text. Closed set, safe to interpolate.
    pub fn as_label(self) -> &'static str {
        match self {
            RecordKind::Conversation => "Conversation",
            RecordKind::Topic => "Topic",
            RecordKind::Project => "Project",
            RecordKind::Task => "Task",
            RecordKind::Issue => "Issue",
            RecordKind::Config => "Config",
            RecordKind::Finance => "Finance",
            RecordKind::Todo => "Todo",
        }
    }

    /// Parse a label back into a kind. Returns None for anything outside
    /// the closed set, including attacker-controlled label strings.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_label() == label)
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

impl std::str::FromStr for RecordKind {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| crate::error::Error::Invalid {
            what: "record kind",
            value: s.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Relation Kind
// ---------------------------------------------------------------------------

/// The closed set of edge types between records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    Contains,
    RelatedTo,
    DependsOn,
    PartOf,
    ResolvedBy,
    CreatedAt,
    UpdatedAt,
}

impl RelationKind {
    pub const ALL: [RelationKind; 7] = [
        RelationKind::Contains,
        RelationKind::RelatedTo,
        RelationKind::DependsOn,
        RelationKind::PartOf,
        RelationKind::ResolvedBy,
        RelationKind::CreatedAt,
        RelationKind::UpdatedAt,
    ];

    /// The edge type used in query text. Closed set, safe to interpolate.
    pub fn as_type(self) -> &'static str {
        match self {
            RelationKind::Contains => "CONTAINS",
            RelationKind::RelatedTo => "RELATED_TO",
            RelationKind::DependsOn => "DEPENDS_ON",
            RelationKind::PartOf => "PART_OF",
            RelationKind::ResolvedBy => "RESOLVED_BY",
            RelationKind::CreatedAt => "CREATED_AT",
            RelationKind::UpdatedAt => "UPDATED_AT",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_type())
    }
}

impl std::str::FromStr for RelationKind {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_type() == s)
            .ok_or_else(|| crate::error::Error::Invalid {
                what: "relation kind",
                value: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Memory Record
// ---------------------------------------------------------------------------

/// A stored memory record.
///
/// `fields` holds the union of every kind's optional attributes. Which of
/// them is persisted is decided by the property extractor, not the model;
/// reads copy through whatever the node actually carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique across the whole store, regardless of kind. Immutable.
    pub id: String,

    /// Category of the record. Immutable after creation.
    pub kind: RecordKind,

    /// Free-text body. Empty string when not provided.
    pub content: String,

    /// Epoch milliseconds, set once at creation.
    pub created: i64,

    /// Epoch milliseconds, refreshed on every successful mutation.
    pub updated: i64,

    /// Open metadata map. Unparseable stored metadata degrades to `{}`.
    #[serde(default)]
    pub metadata: Metadata,

    /// Kind-specific optional attributes.
    #[serde(flatten)]
    pub fields: RecordFields,
}

impl MemoryRecord {
    /// Construct a fresh record with a generated id and current timestamps.
    pub fn create(new: NewRecord) -> Self {
        let now = now_ms();
        let mut fields = new.fields;
        if fields.title.is_none() {
            fields.title = new.title;
        }
        Self {
            id: Uuid::new_v4().to_string(),
            kind: new.kind,
            content: new.content,
            created: now,
            updated: now,
            metadata: new.metadata,
            fields,
        }
    }

    /// Merge a partial update over this record, refreshing `updated`.
    /// `id`, `kind`, and `created` never change.
    pub fn apply(&mut self, patch: RecordPatch) {
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(metadata) = patch.metadata {
            self.metadata = metadata;
        }
        self.fields.merge(patch.fields);
        self.updated = now_ms();
    }
}

/// Union of all kinds' optional attributes.
///
/// Property names on the node keep the original camelCase spelling
/// (`dueDate`), hence the serde rename.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(rename = "dueDate", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl RecordFields {
    /// Overlay `other` onto self: set fields win, unset fields keep the
    /// current value.
    pub fn merge(&mut self, other: RecordFields) {
        macro_rules! take {
            ($field:ident) => {
                if other.$field.is_some() {
                    self.$field = other.$field;
                }
            };
        }
        take!(name);
        take!(title);
        take!(description);
        take!(summary);
        take!(status);
        take!(severity);
        take!(key);
        take!(value);
        take!(environment);
        take!(category);
        take!(amount);
        take!(currency);
        take!(completed);
        take!(priority);
        take!(due_date);
    }
}

// ---------------------------------------------------------------------------
// Relation
// ---------------------------------------------------------------------------

/// A directed, typed edge between two records. Has no identity of its own;
/// relations are only traversed from a record, never fetched by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRelation {
    /// Source record id. Existence is not enforced — a relation whose
    /// endpoints are missing creates zero edges and is not an error.
    pub from: String,

    /// Target record id.
    pub to: String,

    /// Edge type.
    pub kind: RelationKind,

    /// Optional edge metadata, serialized like record metadata.
    #[serde(default)]
    pub properties: Metadata,
}

impl MemoryRelation {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
            properties: Metadata::new(),
        }
    }

    pub fn properties(mut self, properties: Metadata) -> Self {
        self.properties = properties;
        self
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Builder for creating new records. The store's public API for creation.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub(crate) kind: RecordKind,
    pub(crate) content: String,
    pub(crate) title: Option<String>,
    pub(crate) metadata: Metadata,
    pub(crate) fields: RecordFields,
}

impl NewRecord {
    pub fn new(kind: RecordKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            title: None,
            metadata: Metadata::new(),
            fields: RecordFields::default(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn fields(mut self, fields: RecordFields) -> Self {
        self.fields = fields;
        self
    }
}

/// Partial field set for update. Unset fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub content: Option<String>,
    pub metadata: Option<Metadata>,
    pub fields: RecordFields,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn fields(mut self, fields: RecordFields) -> Self {
        self.fields = fields;
        self
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// What to search for. All criteria are conjunctive; only the keyword
/// clause fans out into OR'ed per-term tests.
#[derive(Debug, Clone)]
pub struct SearchCriteria {
    /// Exact label match on kind.
    pub kind: Option<RecordKind>,

    /// Keyword phrase matched against content and title.
    pub keyword: Option<String>,

    /// Inclusive lower bound on `created` (epoch ms).
    pub created_after: Option<i64>,

    /// Inclusive upper bound on `created` (epoch ms).
    pub created_before: Option<i64>,

    /// Per-entry metadata tests: string values match case-insensitively
    /// via containment, other values by equality.
    pub metadata: Metadata,

    /// Multi-term containment matching with relevance ranking. On by default.
    pub fuzzy: bool,

    /// Keep only the N best results. None means the ranker default (10)
    /// when fuzzy, no truncation otherwise. A value <= 0 disables it.
    pub top_n: Option<i64>,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            kind: None,
            keyword: None,
            created_after: None,
            created_before: None,
            metadata: Metadata::new(),
            fuzzy: true,
            top_n: None,
        }
    }
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: RecordKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn created_between(mut self, after: Option<i64>, before: Option<i64>) -> Self {
        self.created_after = after;
        self.created_before = before;
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn fuzzy(mut self, fuzzy: bool) -> Self {
        self.fuzzy = fuzzy;
        self
    }

    pub fn top_n(mut self, n: i64) -> Self {
        self.top_n = Some(n);
        self
    }
}

/// Ordering and pagination for search.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Node property to order by. Defaults to `created`. Validated against
    /// the known property names before reaching query text.
    pub order_by: Option<String>,

    pub direction: SortDirection,

    /// Page size.
    pub limit: Option<i64>,

    /// Page index: `offset × limit` rows are skipped. Without a limit it
    /// degrades to a raw row skip.
    pub offset: Option<i64>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            order_by: None,
            direction: SortDirection::Desc,
            limit: None,
            offset: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_cypher(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

// ---------------------------------------------------------------------------
// Metadata serialization
// ---------------------------------------------------------------------------

/// Serialize a metadata map to its single-string stored form.
pub fn serialize_metadata(metadata: &Metadata) -> String {
    serde_json::to_string(metadata).unwrap_or_else(|_| "{}".to_string())
}

/// Parse stored metadata back into a map.
///
/// Unparseable input never fails a read — it degrades to an empty map,
/// with a structured warning so the data loss is visible to operators.
pub fn parse_metadata(raw: &str) -> Metadata {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!(stored = %other, "stored metadata is not an object, dropping");
            crate::telemetry::metrics::metadata_degraded().add(1, &[]);
            Metadata::new()
        }
        Err(err) => {
            tracing::warn!(error = %err, "stored metadata failed to parse, dropping");
            crate::telemetry::metrics::metadata_degraded().add(1, &[]);
            Metadata::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_round_trips() {
        let mut meta = Metadata::new();
        meta.insert("person".into(), json!("kelly"));
        meta.insert("count".into(), json!(3));
        meta.insert("nested".into(), json!({"a": [1, 2]}));

        let raw = serialize_metadata(&meta);
        assert_eq!(parse_metadata(&raw), meta);
    }

    #[test]
    fn malformed_metadata_degrades_to_empty() {
        assert!(parse_metadata("this is not valid json {{{").is_empty());
        assert!(parse_metadata("").is_empty());
        // valid JSON but not an object
        assert!(parse_metadata("[1, 2, 3]").is_empty());
    }

    #[test]
    fn apply_refreshes_updated_but_not_created() {
        let mut record = MemoryRecord::create(NewRecord::new(RecordKind::Task, "fix the thing"));
        let created = record.created;

        record.apply(RecordPatch::new().content("fix the other thing"));

        assert_eq!(record.created, created);
        assert!(record.updated >= created);
        assert_eq!(record.content, "fix the other thing");
    }

    #[test]
    fn apply_never_touches_id_or_kind() {
        let mut record = MemoryRecord::create(NewRecord::new(RecordKind::Issue, "broken"));
        let id = record.id.clone();

        let mut fields = RecordFields::default();
        fields.severity = Some("high".into());
        record.apply(RecordPatch::new().fields(fields));

        assert_eq!(record.id, id);
        assert_eq!(record.kind, RecordKind::Issue);
        assert_eq!(record.fields.severity.as_deref(), Some("high"));
    }

    #[test]
    fn unknown_labels_are_rejected() {
        assert!(RecordKind::from_label("Task) DETACH DELETE (n").is_none());
        assert!("NOT_A_RELATION".parse::<RelationKind>().is_err());
    }
}
