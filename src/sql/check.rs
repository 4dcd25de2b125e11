//! Syntax checks for generated SQL.
//!
//! Uses sqlparser-rs to confirm that emitted SQL parses under the target
//! dialect. Translator output is usually a bare expression, so
//! [`check_expression`] wraps it in a `SELECT` first.

use sqlparser::dialect::{
    DuckDbDialect, GenericDialect, MsSqlDialect, PostgreSqlDialect, SnowflakeDialect,
};
use sqlparser::parser::Parser;

use super::dialect::Dialect;

/// SQL that sqlparser rejects for a dialect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid SQL for {dialect}: {message}\nSQL: {sql}")]
pub struct SyntaxError {
    pub dialect: Dialect,
    pub message: String,
    pub sql: String,
}

fn parser_dialect(dialect: Dialect) -> Box<dyn sqlparser::dialect::Dialect> {
    match dialect {
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::DuckDb => Box::new(DuckDbDialect {}),
        Dialect::TSql => Box::new(MsSqlDialect {}),
        Dialect::Snowflake => Box::new(SnowflakeDialect {}),
        Dialect::BigQuery => Box::new(GenericDialect {}),
    }
}

/// Validates that a SQL statement is syntactically valid for the given dialect.
///
/// # Example
///
/// ```
/// use daxsql::sql::{check::validate_sql, Dialect};
///
/// validate_sql("SELECT * FROM sales", Dialect::Postgres).unwrap();
/// assert!(validate_sql("SELEC * FORM sales", Dialect::Postgres).is_err());
/// ```
pub fn validate_sql(sql: &str, dialect: Dialect) -> Result<(), SyntaxError> {
    Parser::parse_sql(&*parser_dialect(dialect), sql)
        .map(|_| ())
        .map_err(|e| SyntaxError {
            dialect,
            message: e.to_string(),
            sql: sql.to_string(),
        })
}

/// Validates a scalar expression (or `expr AS alias`) by parsing `SELECT <expr>`.
pub fn check_expression(expr: &str, dialect: Dialect) -> Result<(), SyntaxError> {
    validate_sql(&format!("SELECT {}", expr), dialect)
}
