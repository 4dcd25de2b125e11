use std::fmt;

use tracing::{debug, warn};

use super::confidence::Confidence;
use super::enhance::{EnhanceRequest, Enhancer};
use super::error::TranslateError;
use super::result::TranslationResult;
use super::walk::Walk;
use crate::dax::{self, ParseResult, TokenKind};
use crate::patterns::PatternLibrary;
use crate::schema::SchemaContext;
use crate::sql::Dialect;

/// Translates DAX expressions and measure definitions to SQL.
///
/// Holds only read-only state; every [`translate`](Self::translate) call
/// builds its own filter context, so one translator can serve concurrent
/// callers.
///
/// # Example
///
/// ```
/// use daxsql::schema::sample_retail_context;
/// use daxsql::translate::{Confidence, Translator};
///
/// let translator = Translator::new().with_context(sample_retail_context());
/// let result = translator.translate("[Total Sales] = SUM(Sales[Amount])").unwrap();
/// assert_eq!(result.sql, "SUM(sales.amount) AS \"Total Sales\"");
/// assert_eq!(result.confidence, Confidence::High);
/// ```
pub struct Translator {
    pub(super) context: Option<SchemaContext>,
    pub(super) patterns: PatternLibrary,
    pub(super) dialect: Dialect,
    enhancer: Option<Box<dyn Enhancer>>,
    enhance_below: Confidence,
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator")
            .field("context", &self.context.as_ref().map(|c| c.tables().len()))
            .field("patterns", &self.patterns.len())
            .field("dialect", &self.dialect)
            .field("enhancer", &self.enhancer.is_some())
            .field("enhance_below", &self.enhance_below)
            .finish()
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator {
    /// Snowflake output, built-in patterns, no schema context.
    pub fn new() -> Self {
        Self {
            context: None,
            patterns: PatternLibrary::new(),
            dialect: Dialect::default(),
            enhancer: None,
            enhance_below: Confidence::Medium,
        }
    }

    pub fn with_context(mut self, context: SchemaContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_patterns(mut self, patterns: PatternLibrary) -> Self {
        self.patterns = patterns;
        self
    }

    /// Hand translations whose confidence is below `below` to `enhancer`.
    pub fn with_enhancer(mut self, enhancer: impl Enhancer + 'static, below: Confidence) -> Self {
        self.enhancer = Some(Box::new(enhancer));
        self.enhance_below = below;
        self
    }

    /// Confidence below which an attached enhancer is consulted.
    pub fn with_enhance_below(mut self, below: Confidence) -> Self {
        self.enhance_below = below;
        self
    }

    pub fn enhance_below(&self) -> Confidence {
        self.enhance_below
    }

    pub fn context(&self) -> Option<&SchemaContext> {
        self.context.as_ref()
    }

    pub fn patterns(&self) -> &PatternLibrary {
        &self.patterns
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Translate a DAX expression, or a `[Name] = expression` measure.
    ///
    /// Bad input never fails: a parse error yields `success == false`, empty
    /// SQL and the parser's messages in `errors`. `Err` means a pattern or
    /// walker defect.
    pub fn translate(&self, dax: &str) -> Result<TranslationResult, TranslateError> {
        debug!(dialect = %self.dialect, len = dax.len(), "translating DAX");

        let parsed = parse_source(dax);
        if !parsed.success() {
            debug!(errors = parsed.errors.len(), "DAX did not parse");
            return Ok(TranslationResult::failed(dax, parsed.errors));
        }

        let mut walk = Walk::new(self);
        let sql = parsed.ast.accept(&mut walk)?;
        let mut result = walk.finish(dax, sql);

        if result.confidence < self.enhance_below {
            self.enhance(&mut result);
        }

        debug!(
            confidence = %result.confidence,
            patterns = result.patterns_applied.len(),
            warnings = result.warnings.len(),
            "translation finished"
        );
        Ok(result)
    }

    fn enhance(&self, result: &mut TranslationResult) {
        let Some(enhancer) = &self.enhancer else {
            return;
        };

        let outcome = enhancer.enhance(&EnhanceRequest {
            dax: &result.dax,
            schema_context: self.context.as_ref().map(SchemaContext::to_prompt_context),
            initial_sql: Some(&result.sql),
            pattern_reference: Some(self.patterns.to_prompt_context()),
        });

        if outcome.success && !outcome.sql.trim().is_empty() {
            debug!(model = %outcome.model_id, "enhancer replaced SQL");
            result.warnings.push(format!("SQL rewritten by {}", outcome.model_id));
            result.sql = outcome.sql;
            result.enhanced_by = Some(outcome.model_id);
        } else {
            let reason = outcome.error.unwrap_or_else(|| "no SQL returned".to_string());
            warn!(model = %outcome.model_id, error = %reason, "enhancer failed, keeping engine SQL");
            result
                .warnings
                .push(format!("Enhancer {} failed: {}", outcome.model_id, reason));
        }
    }
}

/// Parse as a measure when the text starts with `[Name] =`.
fn parse_source(dax: &str) -> ParseResult {
    let parsed = dax::parse(dax);
    let is_measure = matches!(
        parsed.tokens.as_slice(),
        [name, eq, ..] if name.kind == TokenKind::ColumnRef && eq.kind == TokenKind::Eq
    );
    if is_measure {
        dax::parse_measure(dax)
    } else {
        parsed
    }
}
