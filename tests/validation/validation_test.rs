use daxsql::sql::Dialect;
use daxsql::validate::{
    ExecutionBackend, ExecutionOutcome, IssueLevel, SqlValidator, ValidateOptions,
};
use serde_json::json;

fn messages(sql: &str) -> Vec<String> {
    SqlValidator::new()
        .validate_expression(sql)
        .issues
        .into_iter()
        .map(|i| i.message)
        .collect()
}

// ============================================================================
// Lexical checks
// ============================================================================

#[test]
fn test_well_formed_expression_is_valid() {
    let result = SqlValidator::new().validate_expression("SUM(sales.amount)");
    assert!(result.is_valid);
    assert!(result.issues.is_empty());
}

#[test]
fn test_unclosed_parenthesis() {
    let result = SqlValidator::new().validate_expression("SUM(amount");
    assert!(!result.is_valid);
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].message, "Unbalanced parentheses: 1 unclosed");
}

#[test]
fn test_extra_closing_parenthesis_has_position() {
    let result = SqlValidator::new().validate_expression("SUM(amount))");
    assert!(!result.is_valid);
    assert_eq!(result.errors()[0].location.as_deref(), Some("Position 11"));
}

#[test]
fn test_quotes_and_parens_inside_strings_are_ignored() {
    let result = SqlValidator::new().validate_expression("CONCAT(name, ' (', 'it''s', ')')");
    assert!(result.is_valid, "{:?}", result.issues);
}

#[test]
fn test_unbalanced_quotes() {
    assert_eq!(messages("region = 'West"), vec!["Unbalanced single quotes"]);
    assert_eq!(messages("SUM(x) AS \"Total"), vec!["Unbalanced double quotes"]);
}

#[test]
fn test_empty_expression() {
    let result = SqlValidator::new().validate_expression("   \n\t ");
    assert!(!result.is_valid);
    assert_eq!(result.normalized_sql, "");
    assert_eq!(messages(""), vec!["Empty SQL expression"]);
}

#[test]
fn test_incomplete_expressions() {
    assert!(!SqlValidator::new().validate_expression("a, b,").is_valid);
    assert!(!SqlValidator::new().validate_expression("x = 1 AND").is_valid);
    assert!(SqlValidator::new().validate_expression("brand = 'ANDROID'").is_valid);
}

#[test]
fn test_equals_null_is_warning_not_error() {
    let result = SqlValidator::new().validate_expression("email = NULL");
    assert!(result.is_valid);
    let warnings = result.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].message, "Using = NULL instead of IS NULL");
    assert!(warnings[0].suggestion.is_some());
}

#[test]
fn test_unguarded_division_is_info() {
    let result = SqlValidator::new().validate_expression("SUM(a) / SUM(b)");
    assert!(result.is_valid);
    assert!(result.warnings().is_empty());
    assert_eq!(result.issues[0].level, IssueLevel::Info);

    assert!(messages("SUM(a) / NULLIF(SUM(b), 0)").is_empty());
    assert!(messages("a / 100").is_empty());
}

#[test]
fn test_normalization_collapses_whitespace() {
    let result = SqlValidator::new().validate_expression("  SUM(\n  amount\n)  ");
    assert_eq!(result.normalized_sql, "SUM( amount )");
}

// ============================================================================
// Full validation
// ============================================================================

#[test]
fn test_syntax_stage_warns_but_does_not_invalidate() {
    let validator = SqlValidator::new().with_dialect(Dialect::Postgres);
    let result = validator.validate("SELECT * FROM sales WHERE", &ValidateOptions::default());
    assert!(result.is_valid);
    assert_eq!(result.warnings().len(), 1);
    assert!(result.warnings()[0]
        .message
        .starts_with("postgres parser rejected the SQL"));
}

#[test]
fn test_syntax_stage_accepts_expression_and_statement() {
    let validator = SqlValidator::new().with_dialect(Dialect::DuckDb);
    let options = ValidateOptions::default();
    assert!(validator.validate("SUM(sales.amount)", &options).issues.is_empty());
    assert!(validator
        .validate("SELECT region, SUM(amount) FROM sales GROUP BY region", &options)
        .issues
        .is_empty());
}

#[test]
fn test_syntax_stage_skipped_after_lexical_error() {
    let result = SqlValidator::new().validate("SUM(amount", &ValidateOptions::default());
    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].level, IssueLevel::Error);
}

#[test]
fn test_line_comment_flagged() {
    let result = SqlValidator::new().validate(
        "SUM(amount) -- net",
        &ValidateOptions {
            syntax_check: false,
            ..ValidateOptions::default()
        },
    );
    assert!(result.is_valid);
    assert_eq!(
        result.warnings()[0].message,
        "Line comment (--) may hide part of the expression"
    );
}

struct FakeWarehouse {
    fail: bool,
}

impl ExecutionBackend for FakeWarehouse {
    fn execute(&self, sql: &str, row_limit: u64) -> ExecutionOutcome {
        assert!(sql.starts_with("SELECT * FROM ("));
        assert!(sql.ends_with(&format!("LIMIT {}", row_limit)));
        if self.fail {
            ExecutionOutcome {
                error: Some("relation \"sales\" does not exist".to_string()),
                ..ExecutionOutcome::default()
            }
        } else {
            ExecutionOutcome {
                rows: Some(json!([{"total": 42}])),
                elapsed_ms: Some(3.5),
                error: None,
            }
        }
    }
}

#[test]
fn test_execution_without_backend_is_skipped() {
    let options = ValidateOptions {
        execute: true,
        ..ValidateOptions::default()
    };
    let result = SqlValidator::new().validate("SELECT 1", &options);
    assert!(result.is_valid);
    assert_eq!(result.issues[0].level, IssueLevel::Info);
    assert!(result.execution_result.is_none());
}

#[test]
fn test_execution_records_rows_and_timing() {
    let options = ValidateOptions {
        execute: true,
        row_limit: 5,
        ..ValidateOptions::default()
    };
    let validator = SqlValidator::new()
        .with_dialect(Dialect::Postgres)
        .with_backend(FakeWarehouse { fail: false });
    let result = validator.validate("SELECT amount FROM sales", &options);

    assert!(result.is_valid);
    assert!(result.issues.is_empty());
    assert_eq!(result.execution_result, Some(json!([{"total": 42}])));
    assert_eq!(result.execution_time_ms, Some(3.5));
}

#[test]
fn test_execution_failure_is_warning_with_test_sql() {
    let options = ValidateOptions {
        execute: true,
        ..ValidateOptions::default()
    };
    let validator = SqlValidator::new().with_backend(FakeWarehouse { fail: true });
    let result = validator.validate("SELECT amount FROM sales", &options);

    assert!(result.is_valid);
    let warnings = result.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.starts_with("Execution failed: relation"));
    assert_eq!(
        warnings[0].location.as_deref(),
        Some("SELECT * FROM (SELECT amount FROM sales) t LIMIT 1")
    );
}

#[test]
fn test_report_json() {
    let result = SqlValidator::new().validate_expression("email = NULL");
    let value = result.to_value();
    assert_eq!(value["is_valid"], true);
    assert_eq!(value["warning_count"], 1);
    assert_eq!(value["error_count"], 0);
    assert_eq!(value["sql_normalized"], "email = NULL");
    assert_eq!(value["issues"][0]["level"], "WARNING");
}
