//! SQL output support.
//!
//! - [`dialect`] - target dialects for rendered SQL
//! - [`check`] - sqlparser-backed syntax checks

pub mod check;
pub mod dialect;

pub use dialect::{Dialect, SqlDialect, UnknownDialect};
