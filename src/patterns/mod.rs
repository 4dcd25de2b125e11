//! DAX function → SQL template catalog.
//!
//! Each [`DaxPattern`] maps one DAX function name to a Snowflake SQL template
//! with named `{placeholders}`, plus the metadata the translator uses to score
//! confidence. [`PatternLibrary`] is the case-insensitive lookup table; it is
//! read-only once built and can be shared freely.

mod catalog;
pub mod template;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sql::SqlDialect;
pub use template::{Bindings, TemplateError, TemplateResult};

/// Fixed pattern groupings, used for listings and the reference document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    Aggregation,
    Filter,
    TimeIntelligence,
    Logical,
    Math,
    Text,
    Table,
    Relationship,
}

impl PatternCategory {
    pub const ALL: [PatternCategory; 8] = [
        PatternCategory::Aggregation,
        PatternCategory::Filter,
        PatternCategory::TimeIntelligence,
        PatternCategory::Logical,
        PatternCategory::Math,
        PatternCategory::Text,
        PatternCategory::Table,
        PatternCategory::Relationship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternCategory::Aggregation => "aggregation",
            PatternCategory::Filter => "filter",
            PatternCategory::TimeIntelligence => "time_intelligence",
            PatternCategory::Logical => "logical",
            PatternCategory::Math => "math",
            PatternCategory::Text => "text",
            PatternCategory::Table => "table",
            PatternCategory::Relationship => "relationship",
        }
    }

    /// Heading used in the reference document.
    pub fn title(&self) -> &'static str {
        match self {
            PatternCategory::Aggregation => "Aggregation",
            PatternCategory::Filter => "Filter",
            PatternCategory::TimeIntelligence => "Time Intelligence",
            PatternCategory::Logical => "Logical",
            PatternCategory::Math => "Math",
            PatternCategory::Text => "Text",
            PatternCategory::Table => "Table",
            PatternCategory::Relationship => "Relationship",
        }
    }
}

impl fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much the SQL shape diverges from the DAX semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[default]
    Simple,
    Moderate,
    Complex,
}

/// One worked translation shown in the reference document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternExample {
    pub dax: String,
    pub sql: String,
}

/// Positional arguments bound to a pattern's parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgBinding {
    pub bindings: Bindings,
    /// Parameters with neither an argument nor a default; bound to `NULL`.
    pub missing: Vec<String>,
    /// Arguments beyond the last parameter of a non-variadic pattern.
    pub extra: usize,
}

/// A DAX function's SQL translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaxPattern {
    /// Function name, uppercase.
    pub name: String,
    pub category: PatternCategory,
    /// Snowflake SQL with `{param}` holes.
    pub template: String,
    pub description: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub example: Option<PatternExample>,
    /// Placeholder names for the DAX arguments, in call order.
    #[serde(default)]
    pub params: Vec<String>,
    /// Values for holes not supplied by an argument.
    #[serde(default)]
    pub defaults: Bindings,
    /// Separator joining surplus arguments into the last parameter.
    #[serde(default)]
    pub variadic: Option<String>,
    #[serde(default)]
    pub needs_context: bool,
    #[serde(default)]
    pub dialect_specific: bool,
    #[serde(default)]
    pub complexity: Complexity,
}

impl DaxPattern {
    pub fn new(
        name: impl Into<String>,
        category: PatternCategory,
        template: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().to_uppercase(),
            category,
            template: template.into(),
            description: description.into(),
            notes: None,
            example: None,
            params: Vec::new(),
            defaults: Bindings::new(),
            variadic: None,
            needs_context: false,
            dialect_specific: false,
            complexity: Complexity::Simple,
        }
    }

    pub fn with_params(mut self, params: &[&str]) -> Self {
        self.params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_default(mut self, placeholder: &str, value: &str) -> Self {
        self.defaults.insert(placeholder.to_string(), value.to_string());
        self
    }

    /// Collect every argument from the last parameter on, joined by `separator`.
    pub fn variadic(mut self, separator: &str) -> Self {
        self.variadic = Some(separator.to_string());
        self
    }

    pub fn with_example(mut self, dax: &str, sql: &str) -> Self {
        self.example = Some(PatternExample {
            dax: dax.to_string(),
            sql: sql.to_string(),
        });
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    pub fn needs_context(mut self) -> Self {
        self.needs_context = true;
        self
    }

    pub fn dialect_specific(mut self) -> Self {
        self.dialect_specific = true;
        self
    }

    pub fn complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    /// Bind already-translated arguments to parameters by position.
    pub fn bind_args(&self, args: Vec<String>) -> ArgBinding {
        let mut result = ArgBinding::default();
        let mut args = args.into_iter();

        for (i, param) in self.params.iter().enumerate() {
            let is_tail = i + 1 == self.params.len();
            let value = match (&self.variadic, is_tail) {
                (Some(sep), true) => {
                    let rest: Vec<String> = args.by_ref().collect();
                    (!rest.is_empty()).then(|| rest.join(sep))
                }
                _ => args.next(),
            };

            match value {
                Some(value) => {
                    result.bindings.insert(param.clone(), value);
                }
                None if self.defaults.contains_key(param) => {}
                None => {
                    result.missing.push(param.clone());
                    result.bindings.insert(param.clone(), "NULL".to_string());
                }
            }
        }

        result.extra = args.count();
        result
    }

    /// Render the template for `dialect`. Explicit bindings win over defaults.
    ///
    /// Defaults are library text, so their function names are remapped along
    /// with the template's.
    pub fn render(&self, bindings: &Bindings, dialect: &dyn SqlDialect) -> TemplateResult<String> {
        let mut all: Bindings = self
            .defaults
            .iter()
            .map(|(k, v)| (k.clone(), template::remap_functions(v, dialect)))
            .collect();
        all.extend(bindings.iter().map(|(k, v)| (k.clone(), v.clone())));
        let template = template::remap_functions(&self.template, dialect);
        template::render(&self.name, &template, &all)
    }
}

/// Case-insensitive catalog of [`DaxPattern`]s.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    patterns: HashMap<String, DaxPattern>,
    /// Registration order, for stable listings.
    order: Vec<String>,
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternLibrary {
    /// The built-in catalog.
    pub fn new() -> Self {
        let mut library = Self::empty();
        for pattern in catalog::builtin() {
            library.add(pattern);
        }
        library
    }

    pub fn empty() -> Self {
        Self {
            patterns: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn get(&self, function: &str) -> Option<&DaxPattern> {
        self.patterns.get(&function.to_uppercase())
    }

    pub fn contains(&self, function: &str) -> bool {
        self.patterns.contains_key(&function.to_uppercase())
    }

    /// Function names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Register a pattern; a later pattern for the same name replaces the
    /// earlier one and keeps its position. Returns the replaced pattern.
    pub fn add(&mut self, mut pattern: DaxPattern) -> Option<DaxPattern> {
        let key = pattern.name.to_uppercase();
        pattern.name = key.clone();
        let previous = self.patterns.insert(key.clone(), pattern);
        if previous.is_none() {
            self.order.push(key);
        }
        previous
    }

    pub fn by_category(&self, category: PatternCategory) -> Vec<&DaxPattern> {
        self.order
            .iter()
            .filter_map(|name| self.patterns.get(name))
            .filter(|p| p.category == category)
            .collect()
    }

    /// Human-readable reference grouped by category, one example each.
    ///
    /// Meant as few-shot context for an external model.
    pub fn to_prompt_context(&self) -> String {
        let mut lines = vec!["# DAX → SQL Pattern Reference".to_string()];

        for category in PatternCategory::ALL {
            let patterns = self.by_category(category);
            if patterns.is_empty() {
                continue;
            }
            lines.push(String::new());
            lines.push(format!("## {} Functions", category.title()));
            for p in patterns {
                lines.push(format!("- {}: {}", p.name, p.description));
                if let Some(ex) = &p.example {
                    lines.push(format!("  DAX: `{}`", ex.dax));
                    lines.push(format!("  SQL: `{}`", ex.sql));
                }
            }
        }

        lines.join("\n")
    }
}
