//! `{placeholder}` substitution for SQL templates.
//!
//! Templates are plain SQL with named holes: `SUM({column})`. Rendering first
//! renames function calls for the target dialect (template text and pattern
//! defaults, never the translated arguments), then fills every hole from the
//! bindings.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

use crate::sql::SqlDialect;

/// Named holes in a template, e.g. `{date_column}`.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Function-call heads in template text, e.g. `TO_VARCHAR(`.
static FUNCTION_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\(").unwrap());

/// Values for template holes, keyed by placeholder name.
pub type Bindings = HashMap<String, String>;

/// A template referenced a hole nobody bound.
///
/// This is a defect in the pattern definition, not in the user's DAX.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("pattern {pattern}: placeholder {{{placeholder}}} is not bound")]
    UnboundPlaceholder { pattern: String, placeholder: String },
}

pub type TemplateResult<T> = Result<T, TemplateError>;

/// Distinct placeholder names in order of first appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        if let Some(name) = caps.get(1).map(|m| m.as_str()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Rename function heads in `template` according to `dialect`.
pub fn remap_functions(template: &str, dialect: &dyn SqlDialect) -> String {
    FUNCTION_HEAD
        .replace_all(template, |caps: &Captures| match dialect.remap_function(&caps[1]) {
            Some(name) => format!("{}(", name),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Fill every `{name}` in `template` from `bindings`.
///
/// Substituted values are not rescanned, so a bound value containing braces
/// is inserted verbatim.
pub fn render(pattern: &str, template: &str, bindings: &Bindings) -> TemplateResult<String> {
    if let Some(missing) = placeholders(template)
        .into_iter()
        .find(|name| !bindings.contains_key(*name))
    {
        return Err(TemplateError::UnboundPlaceholder {
            pattern: pattern.to_string(),
            placeholder: missing.to_string(),
        });
    }

    Ok(PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            bindings.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned())
}
