//! Memory store service.
//!
//! Orchestrates query building, execution, normalization, and ranking
//! against one graph handle. Every public operation is a single unit of
//! work: no internal retries, queueing, or cross-operation ordering —
//! isolation between concurrent calls is the graph engine's job.

use std::sync::Arc;

use opentelemetry::KeyValue;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::graph::GraphExecutor;
use crate::model::{
    MemoryRecord, MemoryRelation, NewRecord, QueryOptions, RecordPatch, RelationKind,
    SearchCriteria,
};
use crate::normalize::normalize_record;
use crate::query::{self, GraphQuery};
use crate::rank;
use crate::telemetry::metrics;

/// Graph-backed record store. Cheap to clone via the shared executor.
pub struct MemoryStore {
    graph: Arc<dyn GraphExecutor>,
}

impl MemoryStore {
    pub fn new(graph: Arc<dyn GraphExecutor>) -> Self {
        Self { graph }
    }

    /// Create the per-kind id indexes. Idempotent — safe to run on every
    /// startup. Expected to complete before the first operation, though
    /// operations do not verify it.
    pub async fn initialize(&self) -> Result<()> {
        for statement in query::create_id_indexes() {
            self.run(statement).await?;
        }
        info!("memory store initialized");
        Ok(())
    }

    /// Persist a new record and return it with its generated id and
    /// timestamps. A write the engine reports as row-less is an error.
    pub async fn create(&self, new: NewRecord) -> Result<MemoryRecord> {
        let record = MemoryRecord::create(new);
        let rows = self.run(query::create_record(&record)).await?;
        if rows.is_empty() {
            return Err(Error::Persistence(format!(
                "create of record {} reported no rows written",
                record.id
            )));
        }

        debug!(id = %record.id, kind = %record.kind, "record created");
        count_op("create");
        Ok(record)
    }

    /// Fetch any record by id, regardless of kind. Missing is None, not
    /// an error; a found-but-unparseable row is.
    pub async fn fetch_by_id(&self, id: &str) -> Result<Option<MemoryRecord>> {
        let rows = self.run(query::fetch_by_id(id)).await?;
        count_op("fetch");
        match rows.first() {
            None => Ok(None),
            Some(row) => normalize_record(row).map(Some),
        }
    }

    /// Conjunctive filtered search. Fuzzy keyword searches come back
    /// relevance-ranked; everything else keeps the engine's ordering.
    /// Rows that fail to normalize are skipped, never fatal.
    pub async fn search(
        &self,
        criteria: &SearchCriteria,
        options: &QueryOptions,
    ) -> Result<Vec<MemoryRecord>> {
        let rows = self.run(query::search(criteria, options)?).await?;
        let mut records = self.collect(rows, "search");
        count_op("search");

        let keyword = criteria
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty());

        if criteria.fuzzy
            && let Some(keyword) = keyword
            && !records.is_empty()
        {
            return Ok(rank::rank(
                records,
                keyword,
                criteria.top_n.unwrap_or(rank::DEFAULT_TOP_N),
            ));
        }

        if let Some(top_n) = criteria.top_n {
            rank::truncate(&mut records, top_n);
        }
        Ok(records)
    }

    /// Merge a partial field set over the stored record and write the
    /// result back in one SET clause. Returns the full merged record, or
    /// None when the id does not exist.
    pub async fn update(&self, id: &str, patch: RecordPatch) -> Result<Option<MemoryRecord>> {
        let Some(mut record) = self.fetch_by_id(id).await? else {
            return Ok(None);
        };

        record.apply(patch);
        self.run(query::update_record(&record)).await?;

        debug!(id = %record.id, "record updated");
        count_op("update");
        Ok(Some(record))
    }

    /// Detach-delete by id: the node and every incident edge. True iff
    /// at least one node was removed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let rows = self.run(query::delete_record(id)).await?;
        count_op("delete");
        Ok(scalar(&rows, "deleted") > 0)
    }

    /// Create a directed typed edge between two records. When either
    /// endpoint is missing the match is empty, zero edges are created,
    /// and the call still succeeds — observable only as a warning.
    pub async fn create_relation(&self, relation: &MemoryRelation) -> Result<()> {
        let rows = self.run(query::create_relation(relation)).await?;
        count_op("relate");

        if scalar(&rows, "created") == 0 {
            warn!(
                from = %relation.from,
                to = %relation.to,
                kind = %relation.kind,
                "relation created no edges; at least one endpoint is missing"
            );
            metrics::relations_without_effect().add(1, &[]);
        }
        Ok(())
    }

    /// Targets of all outgoing edges from a record, optionally filtered
    /// by relation type. Unparseable rows are skipped.
    pub async fn related_from(
        &self,
        id: &str,
        kind: Option<RelationKind>,
    ) -> Result<Vec<MemoryRecord>> {
        let rows = self.run(query::related_from(id, kind)).await?;
        count_op("related");
        Ok(self.collect(rows, "related"))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn run(&self, query: GraphQuery) -> Result<Vec<Value>> {
        self.graph.execute(&query.text, query.params).await
    }

    /// Normalize a multi-row result, dropping rows that fail to parse.
    /// One malformed record never fails a whole read.
    fn collect(&self, rows: Vec<Value>, operation: &'static str) -> Vec<MemoryRecord> {
        rows.iter()
            .filter_map(|row| match normalize_record(row) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(error = %err, operation, "skipping unparseable result row");
                    metrics::rows_skipped().add(1, &[KeyValue::new("operation", operation)]);
                    None
                }
            })
            .collect()
    }
}

/// Read a named integer column off the first row, treating anything
/// missing as zero.
fn scalar(rows: &[Value], column: &str) -> i64 {
    rows.first()
        .and_then(|row| row.get(column))
        .and_then(Value::as_i64)
        .unwrap_or(0)
}

fn count_op(operation: &'static str) {
    metrics::store_operations().add(1, &[KeyValue::new("operation", operation)]);
}
