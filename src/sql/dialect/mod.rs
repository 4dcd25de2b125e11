//! SQL dialect definitions for translated output.
//!
//! Pattern templates are written in Snowflake SQL. Each dialect implements
//! `SqlDialect` to cover the differences that matter for translated DAX:
//!
//! - Identifier quoting: `"` (Snowflake/PG/DuckDB), `` ` `` (BigQuery), `[]` (T-SQL)
//! - Boolean literals: true/false vs 1/0
//! - String concatenation: `||` vs `+`
//! - Function names that differ from Snowflake (`LENGTH` → `LEN`, ...)
//! - Row limiting for execution tests: `LIMIT n` vs `TOP n`
//!
//! # Usage
//!
//! ```
//! use daxsql::sql::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::TSql;
//! assert_eq!(dialect.quote_identifier("Total Sales"), "[Total Sales]");
//! ```

mod bigquery;
mod duckdb;
pub mod helpers;
mod postgres;
mod snowflake;
mod tsql;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use bigquery::BigQuery;
pub use duckdb::DuckDb;
pub use postgres::Postgres;
pub use snowflake::Snowflake;
pub use tsql::TSql;

/// SQL dialect trait - defines how translated constructs are rendered.
///
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (measure alias, derived table name).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal with `''` escaping.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    fn format_bool(&self, b: bool) -> &'static str;

    fn format_null(&self) -> &'static str {
        "NULL"
    }

    // =========================================================================
    // Operators
    // =========================================================================

    /// String concatenation operator.
    fn concat_operator(&self) -> &'static str {
        "||"
    }

    /// Whether `concat_operator` is usable; otherwise `CONCAT(a, b)` is emitted.
    fn supports_concat_operator(&self) -> bool {
        true
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Remap a Snowflake function name for this dialect.
    ///
    /// Returns `Some(new_name)` if the function should be renamed, `None` to
    /// keep it. Matched case-insensitively.
    fn remap_function(&self, name: &str) -> Option<&'static str> {
        let _ = name;
        None
    }

    /// Do Snowflake-specific templates (DATEADD, DATE_TRUNC, TO_VARCHAR...) run as-is?
    fn runs_snowflake_templates(&self) -> bool {
        false
    }

    // =========================================================================
    // Row limiting
    // =========================================================================

    /// Wrap a query or expression so at most `limit` rows come back.
    fn wrap_with_limit(&self, sql: &str, limit: u64) -> String {
        format!("SELECT * FROM ({}) t LIMIT {}", sql, limit)
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Snowflake,
    Postgres,
    #[serde(rename = "duckdb")]
    DuckDb,
    #[serde(rename = "bigquery")]
    BigQuery,
    #[serde(rename = "tsql", alias = "mssql", alias = "sqlserver")]
    TSql,
}

impl Dialect {
    pub const ALL: [Dialect; 5] = [
        Dialect::Snowflake,
        Dialect::Postgres,
        Dialect::DuckDb,
        Dialect::BigQuery,
        Dialect::TSql,
    ];

    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Snowflake => &Snowflake,
            Dialect::Postgres => &Postgres,
            Dialect::DuckDb => &DuckDb,
            Dialect::BigQuery => &BigQuery,
            Dialect::TSql => &TSql,
        }
    }
}

/// Unrecognized dialect name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported SQL dialect: {0}")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "snowflake" => Ok(Dialect::Snowflake),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "duckdb" | "duck" => Ok(Dialect::DuckDb),
            "bigquery" | "bq" => Ok(Dialect::BigQuery),
            "tsql" | "mssql" | "sqlserver" => Ok(Dialect::TSql),
            other => Err(UnknownDialect(other.to_string())),
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn format_null(&self) -> &'static str {
        self.dialect().format_null()
    }

    fn concat_operator(&self) -> &'static str {
        self.dialect().concat_operator()
    }

    fn supports_concat_operator(&self) -> bool {
        self.dialect().supports_concat_operator()
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        self.dialect().remap_function(name)
    }

    fn runs_snowflake_templates(&self) -> bool {
        self.dialect().runs_snowflake_templates()
    }

    fn wrap_with_limit(&self, sql: &str, limit: u64) -> String {
        self.dialect().wrap_with_limit(sql, limit)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}
