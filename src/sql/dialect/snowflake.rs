//! Snowflake SQL dialect.
//!
//! Pattern templates are authored for Snowflake, so it runs them unchanged:
//! - ANSI identifier quoting (`"`)
//! - Native TRUE/FALSE
//! - `||` concatenation
//! - DATEADD/DATE_TRUNC/TO_VARCHAR/NVL available natively

use super::helpers;
use super::SqlDialect;

/// Snowflake SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Snowflake;

impl SqlDialect for Snowflake {
    fn name(&self) -> &'static str {
        "snowflake"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_snowflake(name)
    }

    fn runs_snowflake_templates(&self) -> bool {
        true
    }
}
