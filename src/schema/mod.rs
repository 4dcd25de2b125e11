//! Schema context: tables, columns, relationships and filter state.
//!
//! [`SchemaContext`] resolves DAX table/column names to physical SQL names and
//! finds join paths between tables. [`FilterContext`] is the per-call
//! approximation of DAX filter context used by `CALCULATE`.

mod context;
mod error;
mod filter;
mod path;
mod sample;
mod types;

pub use context::SchemaContext;
pub use error::{SchemaError, SchemaResult};
pub use filter::FilterContext;
pub use sample::sample_retail_context;
pub use types::{Cardinality, Column, ColumnType, CrossFilterDirection, Relationship, Table};
