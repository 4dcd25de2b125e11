//! Lexical checks shared by expression and statement validation.
//!
//! Each check appends to the issue list; none of them parse SQL.

use std::sync::LazyLock;

use regex::Regex;

use super::{IssueLevel, ValidationIssue};

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*$").unwrap());
static TRAILING_BOOLEAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(AND|OR)\s*$").unwrap());
static EQUALS_NULL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)=\s*NULL\b").unwrap());
/// A `/` whose right operand does not start with a numeric literal.
static VARIABLE_DIVISOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/\s*[^\s\d.]").unwrap());
static DIVISION_GUARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(NULLIF|CASE)\b").unwrap());

/// Collapse whitespace runs to one space and trim.
pub(super) fn normalize(sql: &str) -> String {
    WHITESPACE.replace_all(sql.trim(), " ").into_owned()
}

pub(super) fn check_empty(sql: &str, issues: &mut Vec<ValidationIssue>) -> bool {
    if sql.trim().is_empty() {
        issues.push(ValidationIssue::new(IssueLevel::Error, "Empty SQL expression"));
        return true;
    }
    false
}

/// Parentheses outside string literals and quoted identifiers.
pub(super) fn check_parens(sql: &str, issues: &mut Vec<ValidationIssue>) {
    let mut depth: usize = 0;
    let mut quote: Option<char> = None;

    for (pos, ch) in sql.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => {
                if depth == 0 {
                    issues.push(
                        ValidationIssue::new(
                            IssueLevel::Error,
                            "Unbalanced parentheses: extra closing parenthesis",
                        )
                        .at(format!("Position {}", pos)),
                    );
                    return;
                }
                depth -= 1;
            }
            (None, _) => {}
        }
    }

    if depth > 0 {
        issues.push(
            ValidationIssue::new(
                IssueLevel::Error,
                format!("Unbalanced parentheses: {} unclosed", depth),
            )
            .suggest("Add the missing closing parenthesis"),
        );
    }
}

/// Single and double quotes must pair up. A doubled quote inside a literal
/// (`'it''s'`) closes and reopens it, so it needs no special case.
pub(super) fn check_quotes(sql: &str, issues: &mut Vec<ValidationIssue>) {
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut escaped = false;

    for (pos, ch) in sql.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (None, '\'' | '"') => {
                quote = Some(ch);
                start = pos;
            }
            _ => {}
        }
    }

    match quote {
        Some('\'') => issues.push(
            ValidationIssue::new(IssueLevel::Error, "Unbalanced single quotes")
                .at(format!("Position {}", start)),
        ),
        Some(_) => issues.push(
            ValidationIssue::new(IssueLevel::Error, "Unbalanced double quotes")
                .at(format!("Position {}", start)),
        ),
        None => {}
    }
}

pub(super) fn check_incomplete(sql: &str, issues: &mut Vec<ValidationIssue>) {
    if TRAILING_COMMA.is_match(sql) {
        issues.push(
            ValidationIssue::new(IssueLevel::Error, "Trailing comma at end of expression")
                .suggest("Remove the trailing comma"),
        );
    }
    if TRAILING_BOOLEAN.is_match(sql) {
        issues.push(ValidationIssue::new(
            IssueLevel::Error,
            "Incomplete condition: trailing AND/OR",
        ));
    }
}

pub(super) fn check_common_mistakes(sql: &str, issues: &mut Vec<ValidationIssue>) {
    if EQUALS_NULL.is_match(sql) {
        issues.push(
            ValidationIssue::new(IssueLevel::Warning, "Using = NULL instead of IS NULL")
                .suggest("Use 'IS NULL' or 'IS NOT NULL' for null comparisons"),
        );
    }

    if VARIABLE_DIVISOR.is_match(sql) && !DIVISION_GUARD.is_match(sql) {
        issues.push(
            ValidationIssue::new(
                IssueLevel::Info,
                "Division detected; ensure the denominator cannot be zero",
            )
            .suggest("Consider NULLIF(denominator, 0) or a CASE WHEN guard"),
        );
    }
}

/// `--` swallows everything after it once lines are joined.
pub(super) fn check_line_comment(sql: &str, issues: &mut Vec<ValidationIssue>) {
    if sql.contains("--") {
        issues.push(ValidationIssue::new(
            IssueLevel::Warning,
            "Line comment (--) may hide part of the expression",
        ));
    }
}
