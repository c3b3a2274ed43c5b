//! # mnemo-rs
//!
//! Graph-backed memory record store: a small set of typed operations —
//! create, fetch, search, update, delete, relate — over polymorphic
//! memory records persisted as labeled nodes and typed edges in a
//! property graph (Neo4j over Bolt).
//!
//! The interesting parts live in the mapping and query layer: kind-aware
//! property extraction, parameterized Cypher construction, normalization
//! of the engine's heterogeneous result shapes, and fuzzy multi-keyword
//! search with relevance ranking.

pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod normalize;
pub mod props;
pub mod query;
pub mod rank;
pub mod store;
pub mod telemetry;

pub use error::{Error, Result};
pub use store::MemoryStore;
