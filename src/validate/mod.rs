//! Static checks for SQL text.
//!
//! [`SqlValidator::validate_expression`] runs purely lexical checks on a
//! scalar expression. [`SqlValidator::validate`] adds a sqlparser syntax
//! check and, when an [`ExecutionBackend`] is attached, a row-limited test
//! run. Only [`IssueLevel::Error`] makes a result invalid.

mod checks;

use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::sql::{check, Dialect, SqlDialect};

/// Severity of a [`ValidationIssue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueLevel {
    /// The SQL will not run.
    Error,
    /// The SQL may run but probably does not do what was meant.
    Warning,
    Info,
}

impl IssueLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueLevel::Error => "ERROR",
            IssueLevel::Warning => "WARNING",
            IssueLevel::Info => "INFO",
        }
    }
}

impl fmt::Display for IssueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub level: IssueLevel,
    pub message: String,
    /// Where the problem is, e.g. `Position 12`.
    pub location: Option<String>,
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    pub fn new(level: IssueLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            location: None,
            suggestion: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " ({})", location)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    /// Input with whitespace runs collapsed.
    pub normalized_sql: String,
    /// Rows returned by the execution test, if one ran and succeeded.
    pub execution_result: Option<Value>,
    pub execution_time_ms: Option<f64>,
}

impl ValidationResult {
    fn from_issues(normalized_sql: String, issues: Vec<ValidationIssue>) -> Self {
        Self {
            is_valid: !issues.iter().any(|i| i.level == IssueLevel::Error),
            issues,
            normalized_sql,
            execution_result: None,
            execution_time_ms: None,
        }
    }

    pub fn errors(&self) -> Vec<&ValidationIssue> {
        self.at_level(IssueLevel::Error)
    }

    pub fn warnings(&self) -> Vec<&ValidationIssue> {
        self.at_level(IssueLevel::Warning)
    }

    fn at_level(&self, level: IssueLevel) -> Vec<&ValidationIssue> {
        self.issues.iter().filter(|i| i.level == level).collect()
    }

    pub fn to_value(&self) -> Value {
        json!({
            "is_valid": self.is_valid,
            "issues": self.issues,
            "sql_normalized": self.normalized_sql,
            "execution_time_ms": self.execution_time_ms,
            "error_count": self.errors().len(),
            "warning_count": self.warnings().len(),
        })
    }
}

// ============================================================================
// Execution seam
// ============================================================================

/// What an [`ExecutionBackend`] reports for one test query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionOutcome {
    pub rows: Option<Value>,
    pub elapsed_ms: Option<f64>,
    pub error: Option<String>,
}

/// Runs SQL against a warehouse for the optional execution test.
///
/// Calls may block on network I/O; the validator makes them synchronously.
pub trait ExecutionBackend: Send + Sync {
    fn execute(&self, sql: &str, row_limit: u64) -> ExecutionOutcome;
}

/// Stages of [`SqlValidator::validate`] beyond the lexical checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Parse with sqlparser for the validator's dialect.
    pub syntax_check: bool,
    /// Run a row-limited query through the attached backend.
    pub execute: bool,
    pub row_limit: u64,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            syntax_check: true,
            execute: false,
            row_limit: 1,
        }
    }
}

// ============================================================================
// Validator
// ============================================================================

pub struct SqlValidator {
    dialect: Dialect,
    backend: Option<Box<dyn ExecutionBackend>>,
}

impl fmt::Debug for SqlValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlValidator")
            .field("dialect", &self.dialect)
            .field("backend", &self.backend.is_some())
            .finish()
    }
}

impl Default for SqlValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlValidator {
    pub fn new() -> Self {
        Self {
            dialect: Dialect::default(),
            backend: None,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_backend(mut self, backend: impl ExecutionBackend + 'static) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Lexical checks on a scalar SQL expression such as `SUM(amount)`.
    ///
    /// # Example
    ///
    /// ```
    /// use daxsql::validate::SqlValidator;
    ///
    /// let result = SqlValidator::new().validate_expression("SUM(amount");
    /// assert!(!result.is_valid);
    /// ```
    pub fn validate_expression(&self, sql: &str) -> ValidationResult {
        let normalized = checks::normalize(sql);
        let issues = lexical_issues(&normalized);
        log_counts(&issues);
        ValidationResult::from_issues(normalized, issues)
    }

    /// Lexical checks plus the stages enabled in `options`.
    ///
    /// sqlparser failures and execution failures are warnings: the lexical
    /// checks decide validity.
    pub fn validate(&self, sql: &str, options: &ValidateOptions) -> ValidationResult {
        let normalized = checks::normalize(sql);
        let mut issues = lexical_issues(&normalized);
        checks::check_line_comment(sql, &mut issues);

        let lexically_clean = !issues.iter().any(|i| i.level == IssueLevel::Error);
        if options.syntax_check && lexically_clean {
            self.check_syntax(&normalized, &mut issues);
        }

        let mut execution = None;
        if options.execute {
            execution = self.execute(&normalized, options.row_limit, &mut issues);
        }

        log_counts(&issues);
        let mut result = ValidationResult::from_issues(normalized, issues);
        if let Some(outcome) = execution {
            result.execution_result = outcome.rows;
            result.execution_time_ms = outcome.elapsed_ms;
        }
        result
    }

    fn check_syntax(&self, sql: &str, issues: &mut Vec<ValidationIssue>) {
        let upper = sql.trim_start().to_uppercase();
        let parsed = if upper.starts_with("SELECT") || upper.starts_with("WITH") {
            check::validate_sql(sql, self.dialect)
        } else {
            check::check_expression(sql, self.dialect)
        };
        if let Err(err) = parsed {
            debug!(dialect = %self.dialect, error = %err.message, "sqlparser rejected SQL");
            issues.push(ValidationIssue::new(
                IssueLevel::Warning,
                format!("{} parser rejected the SQL: {}", self.dialect, err.message),
            ));
        }
    }

    fn execute(
        &self,
        sql: &str,
        row_limit: u64,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<ExecutionOutcome> {
        let Some(backend) = &self.backend else {
            issues.push(ValidationIssue::new(
                IssueLevel::Info,
                "Execution test skipped: no backend attached",
            ));
            return None;
        };

        let test_sql = self.dialect.wrap_with_limit(sql, row_limit);
        let outcome = backend.execute(&test_sql, row_limit);
        if let Some(error) = &outcome.error {
            warn!(error = %error, "execution test failed");
            issues.push(
                ValidationIssue::new(IssueLevel::Warning, format!("Execution failed: {}", error))
                    .at(test_sql),
            );
        }
        Some(outcome)
    }
}

fn lexical_issues(sql: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if checks::check_empty(sql, &mut issues) {
        return issues;
    }
    checks::check_parens(sql, &mut issues);
    checks::check_quotes(sql, &mut issues);
    checks::check_incomplete(sql, &mut issues);
    checks::check_common_mistakes(sql, &mut issues);
    issues
}

fn log_counts(issues: &[ValidationIssue]) {
    let count = |level: IssueLevel| issues.iter().filter(|i| i.level == level).count();
    debug!(
        errors = count(IssueLevel::Error),
        warnings = count(IssueLevel::Warning),
        info = count(IssueLevel::Info),
        "validated SQL"
    );
}
