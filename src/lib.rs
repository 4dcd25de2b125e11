//! # daxsql
//!
//! Translates Power BI DAX expressions and measure definitions into SQL for
//! an analytic warehouse.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  DAX source text                         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [dax::lexer]
//! ┌─────────────────────────────────────────────────────────┐
//! │                     Tokens                               │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [dax::parser]
//! ┌─────────────────────────────────────────────────────────┐
//! │                      AST                                 │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [translate]  ◀── schema, patterns, sql::dialect
//! ┌─────────────────────────────────────────────────────────┐
//! │      SQL + confidence, warnings, tables, patterns        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [validate]
//! ┌─────────────────────────────────────────────────────────┐
//! │               Validation issues                          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use daxsql::prelude::*;
//!
//! let translator = Translator::new().with_context(sample_retail_context());
//! let result = translator
//!     .translate("CALCULATE(SUM(Sales[Amount]), Store[Region] = \"West\")")
//!     .unwrap();
//!
//! assert!(result.sql.starts_with("(SELECT SUM(sales.amount) FROM sales JOIN dim_store"));
//! assert!(SqlValidator::new().validate_expression(&result.sql).is_valid);
//! ```

pub mod config;
pub mod dax;
pub mod patterns;
pub mod schema;
pub mod sql;
pub mod translate;
pub mod validate;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{Settings, SettingsError};
    pub use crate::dax::{parse, parse_measure, tokenize, Expr, ParseResult};
    pub use crate::patterns::{DaxPattern, PatternCategory, PatternLibrary};
    pub use crate::schema::{
        sample_retail_context, Column, ColumnType, FilterContext, Relationship, SchemaContext,
        Table,
    };
    pub use crate::sql::{Dialect, SqlDialect};
    pub use crate::translate::{
        Confidence, EnhanceRequest, Enhancement, Enhancer, TranslateError, TranslationResult,
        Translator,
    };
    pub use crate::validate::{
        ExecutionBackend, IssueLevel, SqlValidator, ValidateOptions, ValidationResult,
    };
}
