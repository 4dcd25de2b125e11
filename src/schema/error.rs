//! Errors raised by schema lookups and persistence.

use thiserror::Error;

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Debug, Error)]
pub enum SchemaError {
    /// A table name matched neither a registered table nor a relationship endpoint.
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// The tables exist but no chain of active relationships connects them.
    #[error("No relationship path from '{from}' to '{to}'")]
    NoPath { from: String, to: String },

    #[error("Invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),
}
