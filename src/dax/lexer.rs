//! Lexer for DAX source text.
//!
//! Converts a DAX expression or measure definition into a flat token list with
//! line/column/offset information. Whitespace and comments are discarded and
//! the list always ends with an explicit [`TokenKind::Eof`] token.
//!
//! Scanning is done with chumsky; identifiers are reclassified afterwards so
//! that keyword matching is case-insensitive while the original spelling is
//! kept in [`Token::lexeme`].

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use chumsky::prelude::*;
use thiserror::Error;

/// The kind of a DAX token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // ========================================================================
    // Literals
    // ========================================================================
    Integer,
    Float,
    /// Double-quoted string, lexeme includes the quotes.
    String,

    // ========================================================================
    // Names
    // ========================================================================
    /// A bare identifier that is not a known keyword.
    Identifier,
    /// `[Column Name]`, lexeme includes the brackets.
    ColumnRef,
    /// `'Table Name'`, lexeme includes the quotes.
    QuotedIdentifier,
    /// A known DAX word (usually a function name) without a dedicated kind.
    Keyword,

    // ========================================================================
    // Keywords the parser branches on directly
    // ========================================================================
    Var,
    Return,
    True,
    False,
    Blank,

    // ========================================================================
    // Operators
    // ========================================================================
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// `&&` or the word `AND`.
    And,
    /// `||` or the word `OR`.
    Or,
    /// The word `NOT`.
    Not,
    /// `&` string concatenation.
    Ampersand,

    // ========================================================================
    // Delimiters
    // ========================================================================
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,

    /// End of input.
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Integer => "integer",
            TokenKind::Float => "float",
            TokenKind::String => "string",
            TokenKind::Identifier => "identifier",
            TokenKind::ColumnRef => "column reference",
            TokenKind::QuotedIdentifier => "quoted identifier",
            TokenKind::Keyword => "keyword",
            TokenKind::Var => "VAR",
            TokenKind::Return => "RETURN",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::Blank => "BLANK",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Caret => "^",
            TokenKind::Eq => "=",
            TokenKind::NotEq => "<>",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Not => "NOT",
            TokenKind::Ampersand => "&",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Dot => ".",
            TokenKind::Eof => "end of input",
        };
        f.write_str(name)
    }
}

/// A single token with its position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token, verbatim.
    pub lexeme: String,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
    /// Byte offset into the source.
    pub offset: usize,
}

impl Token {
    /// Is this token an operator?
    pub fn is_operator(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Caret
                | TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::LtEq
                | TokenKind::Gt
                | TokenKind::GtEq
                | TokenKind::And
                | TokenKind::Or
                | TokenKind::Not
                | TokenKind::Ampersand
        )
    }

    /// Is this token a literal value?
    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Integer
                | TokenKind::Float
                | TokenKind::String
                | TokenKind::True
                | TokenKind::False
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token({:?}, {:?}, {}:{})",
            self.kind, self.lexeme, self.line, self.column
        )
    }
}

/// Raised when no token pattern matches at the cursor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Lexer error at line {line}, column {column}: {message}")]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// DAX words, matched against the uppercased identifier.
static KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // Aggregation
        "SUM", "SUMX", "AVERAGE", "AVERAGEX", "COUNT", "COUNTX", "COUNTA", "COUNTAX",
        "COUNTROWS", "COUNTBLANK", "MIN", "MINX", "MAX", "MAXX", "DISTINCTCOUNT",
        "DISTINCTCOUNTNOBLANK", "PRODUCT", "PRODUCTX",
        // Filter
        "CALCULATE", "CALCULATETABLE", "FILTER", "ALL", "ALLEXCEPT", "ALLSELECTED",
        "ALLNOBLANKROW", "VALUES", "DISTINCT", "KEEPFILTERS", "REMOVEFILTERS", "EARLIER",
        "EARLIEST", "HASONEVALUE", "HASONEFILTER", "ISFILTERED", "ISCROSSFILTERED",
        "SELECTEDVALUE",
        // Time intelligence
        "DATEADD", "DATEDIFF", "SAMEPERIODLASTYEAR", "PREVIOUSYEAR", "PREVIOUSQUARTER",
        "PREVIOUSMONTH", "PREVIOUSDAY", "NEXTYEAR", "NEXTQUARTER", "NEXTMONTH", "NEXTDAY",
        "PARALLELPERIOD", "STARTOFYEAR", "STARTOFQUARTER", "STARTOFMONTH", "ENDOFYEAR",
        "ENDOFQUARTER", "ENDOFMONTH", "DATESYTD", "DATESMTD", "DATESQTD", "TOTALYTD",
        "TOTALMTD", "TOTALQTD", "DATESBETWEEN", "DATESINPERIOD", "FIRSTDATE", "LASTDATE",
        "OPENINGBALANCEYEAR", "OPENINGBALANCEQUARTER", "OPENINGBALANCEMONTH",
        "CLOSINGBALANCEYEAR", "CLOSINGBALANCEQUARTER", "CLOSINGBALANCEMONTH",
        // Logical
        "IF", "IFERROR", "IFNA", "SWITCH", "AND", "OR", "NOT", "TRUE", "FALSE", "ISBLANK",
        "ISERROR", "ISLOGICAL", "ISNUMBER", "ISTEXT", "ISNONTEXT", "COALESCE",
        // Text
        "CONCATENATE", "CONCATENATEX", "FORMAT", "LEFT", "RIGHT", "MID", "LEN", "UPPER",
        "LOWER", "TRIM", "SUBSTITUTE", "REPLACE", "SEARCH", "FIND", "EXACT", "REPT",
        "UNICODE", "UNICHAR", "VALUE",
        // Math
        "DIVIDE", "ABS", "ROUND", "ROUNDUP", "ROUNDDOWN", "MROUND", "INT", "MOD", "POWER",
        "SQRT", "LOG", "LOG10", "LN", "EXP", "SIGN", "CEILING", "FLOOR", "RAND",
        "RANDBETWEEN", "PI", "EVEN", "ODD", "FACT", "GCD", "LCM", "QUOTIENT", "TRUNC",
        // Table
        "SUMMARIZE", "SUMMARIZECOLUMNS", "ADDCOLUMNS", "SELECTCOLUMNS", "TOPN", "SAMPLE",
        "GENERATE", "GENERATEALL", "CROSSJOIN", "NATURALINNERJOIN", "NATURALLEFTOUTERJOIN",
        "UNION", "INTERSECT", "EXCEPT", "DATATABLE", "ROW", "GENERATESERIES", "CALENDAR",
        "CALENDARAUTO", "TREATAS",
        // Relationship
        "RELATED", "RELATEDTABLE", "USERELATIONSHIP", "CROSSFILTER",
        // Other
        "BLANK", "ERROR", "VAR", "RETURN", "EVALUATE", "DEFINE", "MEASURE", "COLUMN",
        "TABLE", "ORDER", "BY", "ASC", "DESC", "START", "AT",
    ]
    .into_iter()
    .collect()
});

/// Is `word` (any case) a DAX keyword?
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(word.to_ascii_uppercase().as_str())
}

/// Reclassify a scanned identifier by its uppercased spelling.
fn classify_identifier(lexeme: &str) -> TokenKind {
    let upper = lexeme.to_ascii_uppercase();
    if !KEYWORDS.contains(upper.as_str()) {
        return TokenKind::Identifier;
    }
    match upper.as_str() {
        "TRUE" => TokenKind::True,
        "FALSE" => TokenKind::False,
        "BLANK" => TokenKind::Blank,
        "VAR" => TokenKind::Var,
        "RETURN" => TokenKind::Return,
        "AND" => TokenKind::And,
        "OR" => TokenKind::Or,
        "NOT" => TokenKind::Not,
        _ => TokenKind::Keyword,
    }
}

/// Create the chumsky scanner for DAX.
///
/// Produces raw token kinds with byte spans; identifiers come out as
/// [`TokenKind::Identifier`] and are reclassified by [`tokenize`].
fn scanner<'src>(
) -> impl Parser<'src, &'src str, Vec<(TokenKind, SimpleSpan)>, extra::Err<Rich<'src, char>>> {
    // Double-quoted strings: backslash escapes and DAX-style doubled quotes
    let string = just('"')
        .then(
            choice((
                just('\\').then(any()).ignored(),
                just("\"\"").ignored(),
                none_of("\\\"").ignored(),
            ))
            .repeated(),
        )
        .then(just('"'))
        .to(TokenKind::String);

    // Single-quoted identifiers for table names with spaces
    let quoted_ident = just('\'')
        .then(
            choice((
                just('\\').then(any()).ignored(),
                just("''").ignored(),
                none_of("\\'").ignored(),
            ))
            .repeated(),
        )
        .then(just('\''))
        .to(TokenKind::QuotedIdentifier);

    // [Column Name]
    let column_ref = just('[')
        .then(none_of(']').repeated().at_least(1))
        .then(just(']'))
        .to(TokenKind::ColumnRef);

    // Numbers: float before integer so `1.5` is not split
    let exponent = one_of("eE")
        .then(one_of("+-").or_not())
        .then(text::digits(10));
    let float = text::digits(10)
        .then(just('.'))
        .then(text::digits(10))
        .then(exponent.clone().or_not())
        .to(TokenKind::Float);
    let integer = text::digits(10)
        .then(exponent.or_not())
        .to(TokenKind::Integer);

    // Two-character operators before their single-character prefixes
    let two_char = choice((
        just("<>").to(TokenKind::NotEq),
        just("<=").to(TokenKind::LtEq),
        just(">=").to(TokenKind::GtEq),
        just("&&").to(TokenKind::And),
        just("||").to(TokenKind::Or),
    ));

    let single_char = choice((
        just('+').to(TokenKind::Plus),
        just('-').to(TokenKind::Minus),
        just('*').to(TokenKind::Star),
        just('/').to(TokenKind::Slash),
        just('^').to(TokenKind::Caret),
        just('=').to(TokenKind::Eq),
        just('<').to(TokenKind::Lt),
        just('>').to(TokenKind::Gt),
        just('&').to(TokenKind::Ampersand),
        just('(').to(TokenKind::LParen),
        just(')').to(TokenKind::RParen),
        just('[').to(TokenKind::LBracket),
        just(']').to(TokenKind::RBracket),
        just(',').to(TokenKind::Comma),
        just(';').to(TokenKind::Semicolon),
        just('.').to(TokenKind::Dot),
    ));

    let ident = text::ident().to(TokenKind::Identifier);

    // Line comments: // ... and -- ... until newline
    let line_comment = just("//")
        .or(just("--"))
        .then(any().and_is(just('\n').not()).repeated())
        .ignored();

    // Block comments: /* ... */
    let block_comment = just("/*")
        .then(any().and_is(just("*/").not()).repeated())
        .then(just("*/"))
        .ignored();

    let comment = line_comment.or(block_comment);

    let token = choice((
        string,
        quoted_ident,
        column_ref,
        float,
        integer,
        two_char,
        single_char,
        ident,
    ))
    .map_with(|kind, e| (kind, e.span()));

    token
        .padded_by(comment.padded().repeated())
        .padded()
        .repeated()
        .collect()
        .padded_by(comment.padded().repeated())
        .padded()
        .then_ignore(end())
}

/// Byte offsets where each line starts, for offset → line/column lookups.
struct LineIndex<'a> {
    source: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(source: &'a str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .char_indices()
                .filter(|(_, c)| *c == '\n')
                .map(|(i, _)| i + 1),
        );
        Self { source, starts }
    }

    /// 1-based line and character column of a byte offset.
    fn position(&self, offset: usize) -> (usize, usize) {
        let line = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let start = self.starts[line];
        let column = self
            .source
            .get(start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(0)
            + 1;
        (line + 1, column)
    }
}

/// Tokenize DAX source text.
///
/// Returns every significant token in order, terminated by a
/// [`TokenKind::Eof`] token, or the first [`LexError`] encountered.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let index = LineIndex::new(source);
    let (raw, errs) = scanner().parse(source).into_output_errors();

    if let Some(err) = errs.into_iter().next() {
        let offset = err.span().start.min(source.len());
        let (line, column) = index.position(offset);
        let message = match err.found() {
            Some(c) => format!("Unexpected character: {:?}", c),
            None => "Unexpected end of input (unterminated string, identifier or comment)"
                .to_string(),
        };
        return Err(LexError {
            message,
            line,
            column,
            offset,
        });
    }

    let raw = raw.unwrap_or_default();
    let mut tokens = Vec::with_capacity(raw.len() + 1);
    for (kind, span) in raw {
        let lexeme = &source[span.start..span.end];
        let kind = match kind {
            TokenKind::Identifier => classify_identifier(lexeme),
            other => other,
        };
        let (line, column) = index.position(span.start);
        tokens.push(Token {
            kind,
            lexeme: lexeme.to_string(),
            line,
            column,
            offset: span.start,
        });
    }

    let (line, column) = index.position(source.len());
    tokens.push(Token {
        kind: TokenKind::Eof,
        lexeme: String::new(),
        line,
        column,
        offset: source.len(),
    });

    Ok(tokens)
}
