//! T-SQL (SQL Server / Azure SQL) dialect.
//!
//! T-SQL has significant differences from ANSI:
//! - Square bracket identifier quoting (`[name]`)
//! - No native boolean literal (1/0)
//! - TOP for simple limiting
//! - N'...' prefix for Unicode strings
//! - String concatenation with `+`

use super::helpers;
use super::SqlDialect;

/// T-SQL dialect (SQL Server, Azure SQL).
#[derive(Debug, Clone, Copy)]
pub struct TSql;

impl SqlDialect for TSql {
    fn name(&self) -> &'static str {
        "tsql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_bracket(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_unicode(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn concat_operator(&self) -> &'static str {
        "+"
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_tsql(name)
    }

    fn wrap_with_limit(&self, sql: &str, limit: u64) -> String {
        format!("SELECT TOP {} * FROM ({}) t", limit, sql)
    }
}
