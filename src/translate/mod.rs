//! DAX → SQL translation.
//!
//! [`Translator`] parses the DAX, walks the tree bottom-up and renders SQL for
//! the configured dialect. Names resolve through an optional
//! [`SchemaContext`](crate::schema::SchemaContext); functions resolve through
//! the [`PatternLibrary`](crate::patterns::PatternLibrary). Every guess lowers
//! the result's [`Confidence`] and leaves a warning behind.

mod confidence;
mod enhance;
mod error;
mod result;
mod translator;
mod walk;

pub use confidence::{Confidence, UnknownConfidence};
pub use enhance::{EnhanceRequest, Enhancement, Enhancer};
pub use error::TranslateError;
pub use result::TranslationResult;
pub use translator::Translator;
