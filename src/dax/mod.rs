//! DAX front end: lexer, AST and parser.
//!
//! ```text
//! source ──tokenize──▶ Vec<Token> ──Parser──▶ Expr
//! ```
//!
//! [`parse`] and [`parse_measure`] never fail; problems are reported through
//! [`ParseResult::errors`].

pub mod ast;
pub mod lexer;
pub mod parser;

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};

pub use ast::{
    BinaryOp, BinaryOperator, ColumnRef, Expr, FunctionCall, FunctionCategory, IfExpr, Literal,
    MeasureDef, NodeKind, TableRef, UnaryOp, UnaryOperator, Unhandled, Variable, Visitor,
};
pub use lexer::{is_keyword, tokenize, LexError, Token, TokenKind};
pub use parser::{parse, parse_measure, ParseError, Parser};

/// Output of [`parse`] / [`parse_measure`].
///
/// A non-empty `errors` list means `ast` is a placeholder (or, for trailing
/// tokens, an incomplete tree) and must not be trusted.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub ast: Expr,
    pub tokens: Vec<Token>,
    pub source: String,
    pub errors: Vec<String>,
}

impl ParseResult {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn to_value(&self) -> Value {
        json!({
            "success": self.success(),
            "source": self.source,
            "ast": self.ast.to_value(),
            "token_count": self.tokens.len(),
            "errors": self.errors,
        })
    }
}

static DAX_INDICATORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bSUM\s*\(",
        r"\bCALCULATE\s*\(",
        r"\bFILTER\s*\(",
        r"\bAVERAGE\s*\(",
        r"\[.*\]",
        r"'[^']+'\[",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid DAX indicator regex"))
    .collect()
});

/// Quick heuristic: does `text` look like DAX rather than prose or SQL?
///
/// Not a parse; only checks for common function calls and column brackets.
pub fn looks_like_dax(text: &str) -> bool {
    let upper = text.to_uppercase();
    DAX_INDICATORS.iter().any(|re| re.is_match(&upper))
}
