//! Graph engine boundary.
//!
//! The store consumes exactly one primitive from the graph database:
//! execute a parameterized query and get rows back as JSON values.
//! `BoltGraph` is the live Neo4j implementation; `MockGraph` replays
//! scripted responses for tests.

pub mod bolt;
pub mod mock;

pub use bolt::BoltGraph;
pub use mock::MockGraph;

use async_trait::async_trait;

use crate::error::Result;

/// Named parameter bindings for a query.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Executes parameterized graph queries.
///
/// Each returned row is a JSON object keyed by result alias; matched
/// nodes appear as `{"properties": {...}, "labels": [...]}` under their
/// alias, scalar columns as plain values. Concurrency isolation between
/// in-flight queries is the engine's responsibility, not this trait's.
#[async_trait]
pub trait GraphExecutor: Send + Sync {
    async fn execute(&self, query: &str, params: Params) -> Result<Vec<serde_json::Value>>;
}
