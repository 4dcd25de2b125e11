use serde::Serialize;
use serde_json::{json, Value};

use super::confidence::Confidence;

/// Outcome of translating one DAX expression or measure.
///
/// `success` only says the DAX parsed; `confidence` says whether the SQL can
/// be trusted. Surface `warnings` before executing low-confidence SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationResult {
    pub dax: String,
    /// Empty when parsing failed.
    pub sql: String,
    pub success: bool,
    pub confidence: Confidence,
    /// Distinct pattern names used, in first-use order.
    pub patterns_applied: Vec<String>,
    /// Distinct SQL table names referenced, in first-use order.
    pub tables_used: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Set when an enhancer replaced the engine's SQL.
    pub enhanced_by: Option<String>,
}

impl TranslationResult {
    pub(crate) fn failed(dax: &str, errors: Vec<String>) -> Self {
        Self {
            dax: dax.to_string(),
            sql: String::new(),
            success: false,
            confidence: Confidence::Low,
            patterns_applied: Vec::new(),
            tables_used: Vec::new(),
            warnings: Vec::new(),
            errors,
            enhanced_by: None,
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "dax": self.dax,
            "sql": self.sql,
            "success": self.success,
            "confidence": self.confidence.as_str(),
            "patterns_applied": self.patterns_applied,
            "tables_used": self.tables_used,
            "warnings": self.warnings,
            "errors": self.errors,
            "enhanced_by": self.enhanced_by,
        })
    }
}
