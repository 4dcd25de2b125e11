use thiserror::Error;

use crate::dax::Unhandled;
use crate::patterns::TemplateError;

/// Internal translation faults.
///
/// Bad DAX never produces one of these; it yields a failed
/// [`TranslationResult`](super::TranslationResult) instead. These signal a
/// defect in a pattern definition or in the tree walk itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Unhandled(#[from] Unhandled),
}
