//! Seam for an external translation enhancer (typically an LLM).
//!
//! The translator calls an [`Enhancer`] only when its own confidence falls
//! below a configured level. Calls are synchronous and may be slow; running
//! them off the caller's thread is the caller's business.

/// Everything an enhancer gets to work with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhanceRequest<'a> {
    pub dax: &'a str,
    /// [`SchemaContext::to_prompt_context`](crate::schema::SchemaContext::to_prompt_context) text.
    pub schema_context: Option<String>,
    /// The engine's own best-effort SQL.
    pub initial_sql: Option<&'a str>,
    /// [`PatternLibrary::to_prompt_context`](crate::patterns::PatternLibrary::to_prompt_context) text.
    pub pattern_reference: Option<String>,
}

/// What an enhancer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enhancement {
    pub sql: String,
    pub success: bool,
    /// Identifier of whatever produced the SQL.
    pub model_id: String,
    pub error: Option<String>,
}

impl Enhancement {
    pub fn failed(model_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            sql: String::new(),
            success: false,
            model_id: model_id.into(),
            error: Some(error.into()),
        }
    }
}

/// External rewriter for low-confidence translations.
///
/// Failures are reported in the returned [`Enhancement`]; the translator then
/// keeps its own SQL unchanged.
pub trait Enhancer: Send + Sync {
    fn enhance(&self, request: &EnhanceRequest<'_>) -> Enhancement;
}
