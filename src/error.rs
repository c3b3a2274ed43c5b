//! Error types for mnemo-rs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A write reported no effect where one was expected.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A result row could not be mapped into a record.
    #[error("could not normalize result row: {0}")]
    Normalization(String),

    /// A label, relation type, or order-by field outside the allowed set.
    #[error("invalid {what}: {value}")]
    Invalid { what: &'static str, value: String },

    /// Transport or engine failure, propagated unmodified.
    #[error("graph error: {0}")]
    Graph(#[from] neo4rs::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
