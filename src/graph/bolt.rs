//! Live Neo4j executor over the Bolt protocol.
//!
//! Translates JSON parameter maps into Bolt values on the way out and
//! returned rows into the alias→`{properties, labels}` JSON shape the
//! normalizer consumes on the way back. Node columns get the full
//! properties/labels wrapper; scalar columns pass through as-is.

use async_trait::async_trait;
use neo4rs::{BoltList, BoltMap, BoltNull, BoltType, Graph, Node, Row, query};
use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::graph::{GraphExecutor, Params};

/// Graph handle backed by a Bolt connection pool.
pub struct BoltGraph {
    graph: Graph,
}

impl BoltGraph {
    /// Connect to a Neo4j-compatible server.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password).await?;
        Ok(Self { graph })
    }
}

#[async_trait]
impl GraphExecutor for BoltGraph {
    async fn execute(&self, text: &str, params: Params) -> Result<Vec<Value>> {
        let mut q = query(text);
        for (name, value) in params {
            q = q.param(&name, json_to_bolt(value));
        }

        let mut stream = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row_to_json(&row)?);
        }
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Value conversion
// ---------------------------------------------------------------------------

fn json_to_bolt(value: Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => b.into(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.into(),
            None => n.as_f64().unwrap_or(0.0).into(),
        },
        Value::String(s) => s.into(),
        Value::Array(items) => {
            let mut list = BoltList::new();
            for item in items {
                list.push(json_to_bolt(item));
            }
            BoltType::List(list)
        }
        Value::Object(map) => {
            let mut bolt = BoltMap::new();
            for (key, value) in map {
                bolt.put(key.into(), json_to_bolt(value));
            }
            BoltType::Map(bolt)
        }
    }
}

fn row_to_json(row: &Row) -> Result<Value> {
    let flat: Value = row
        .to()
        .map_err(|e| Error::Other(format!("bolt row decode: {e}")))?;

    let Value::Object(fields) = flat else {
        return Ok(flat);
    };

    let mut out = serde_json::Map::new();
    for (alias, value) in fields {
        // A node column gets re-read as a Node so its labels survive;
        // anything else (counts, scalars) passes through unchanged.
        match row.get::<Node>(&alias) {
            Ok(node) => {
                out.insert(alias, node_to_json(&node));
            }
            Err(_) => {
                out.insert(alias, value);
            }
        }
    }
    Ok(Value::Object(out))
}

fn node_to_json(node: &Node) -> Value {
    let mut properties = serde_json::Map::new();
    for key in node.keys() {
        if let Ok(value) = node.get::<Value>(key) {
            properties.insert(key.to_string(), value);
        }
    }
    json!({ "properties": properties, "labels": node.labels() })
}
