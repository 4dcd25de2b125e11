//! Recursive-descent parser for DAX.
//!
//! Binary operators are parsed by binding power, lowest first:
//!
//! ```text
//! ||  <  &&  <  = <>  <  < <= > >=  <  + - &  <  * /  <  prefix - NOT  <  ^  <  call/primary
//! ```
//!
//! `^` is right-associative; every other binary operator associates left.
//! `VAR` chains bind names in a lexical scope and the `RETURN` expression is
//! the result; references to a bound name become [`Expr::Variable`] nodes that
//! carry the bound expression.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use super::ast::{BinaryOperator, Expr, UnaryOperator};
use super::lexer::{tokenize, Token, TokenKind};
use super::ParseResult;

/// An unexpected token, with the position of the token that stopped parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

pub type ParseOutcome<T> = Result<T, ParseError>;

/// Parse a DAX expression.
///
/// Never fails: lexer and parser errors are collected in
/// [`ParseResult::errors`] and the AST is replaced with a blank literal.
pub fn parse(source: &str) -> ParseResult {
    run(source, |parser| parser.parse_expression())
}

/// Parse a measure definition of the form `[Name] = expression`.
pub fn parse_measure(source: &str) -> ParseResult {
    run(source, |parser| parser.parse_measure_definition())
}

fn run(source: &str, entry: impl FnOnce(&mut Parser) -> ParseOutcome<Expr>) -> ParseResult {
    let tokens = match tokenize(source) {
        Ok(tokens) => tokens,
        Err(err) => {
            debug!(error = %err, "DAX lexing failed");
            return ParseResult {
                ast: Expr::blank(),
                tokens: Vec::new(),
                source: source.to_string(),
                errors: vec![err.to_string()],
            };
        }
    };

    let mut parser = Parser::new(tokens);
    let mut errors = Vec::new();
    let ast = match entry(&mut parser) {
        Ok(ast) => {
            if !parser.at_end() {
                errors.push(format!(
                    "Unexpected token after expression: {}",
                    parser.peek().lexeme
                ));
            }
            ast
        }
        Err(err) => {
            debug!(error = %err, "DAX parsing failed");
            errors.push(err.to_string());
            Expr::blank()
        }
    };

    ParseResult {
        ast,
        tokens: parser.into_tokens(),
        source: source.to_string(),
        errors,
    }
}

/// Token-stream parser with one token of lookahead.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Innermost scope last; keys are uppercased variable names.
    scopes: Vec<HashMap<String, Expr>>,
}

impl Parser {
    /// Create a parser over a token list ending in [`TokenKind::Eof`].
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let (line, column, offset) = tokens
                .last()
                .map(|t| (t.line, t.column + t.lexeme.chars().count(), t.offset + t.lexeme.len()))
                .unwrap_or((1, 1, 0));
            tokens.push(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                line,
                column,
                offset,
            });
        }
        Self {
            tokens,
            pos: 0,
            scopes: Vec::new(),
        }
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Parse one expression, including a leading `VAR ... RETURN` chain.
    pub fn parse_expression(&mut self) -> ParseOutcome<Expr> {
        if self.check(TokenKind::Var) {
            return self.parse_var_block();
        }
        self.parse_binary(0)
    }

    /// Parse `[Name] = expression` into a measure node.
    pub fn parse_measure_definition(&mut self) -> ParseOutcome<Expr> {
        if !self.check(TokenKind::ColumnRef) {
            return Err(self.error("Expected measure name in brackets [Name]"));
        }
        let name = strip_delimiters(&self.advance().lexeme).to_string();
        if !self.eat(TokenKind::Eq) {
            return Err(self.error("Expected '=' after measure name"));
        }
        let expression = self.parse_expression()?;
        Ok(Expr::measure(name, expression))
    }

    // ========================================================================
    // VAR / RETURN
    // ========================================================================

    fn parse_var_block(&mut self) -> ParseOutcome<Expr> {
        self.scopes.push(HashMap::new());
        let result = self.parse_var_bindings();
        self.scopes.pop();
        result
    }

    fn parse_var_bindings(&mut self) -> ParseOutcome<Expr> {
        while self.eat(TokenKind::Var) {
            if !self.check(TokenKind::Identifier) {
                return Err(self.error("Expected variable name after VAR"));
            }
            let name = self.advance().lexeme.clone();
            if !self.eat(TokenKind::Eq) {
                return Err(self.error("Expected '=' in variable definition"));
            }
            let value = self.parse_binary(0)?;
            if let Some(scope) = self.scopes.last_mut() {
                scope.insert(name.to_ascii_uppercase(), value);
            }
        }

        if !self.eat(TokenKind::Return) {
            return Err(self.error("Expected RETURN after VAR definitions"));
        }
        self.parse_expression()
    }

    fn lookup_variable(&self, name: &str) -> Option<&Expr> {
        let key = name.to_ascii_uppercase();
        self.scopes.iter().rev().find_map(|scope| scope.get(&key))
    }

    // ========================================================================
    // Binary operators
    // ========================================================================

    fn infix_binding_power(&self) -> Option<(BinaryOperator, u8)> {
        let op = match self.peek().kind {
            TokenKind::Or => BinaryOperator::Or,
            TokenKind::And => BinaryOperator::And,
            TokenKind::Eq => BinaryOperator::Equals,
            TokenKind::NotEq => BinaryOperator::NotEquals,
            TokenKind::Lt => BinaryOperator::LessThan,
            TokenKind::LtEq => BinaryOperator::LessEqual,
            TokenKind::Gt => BinaryOperator::GreaterThan,
            TokenKind::GtEq => BinaryOperator::GreaterEqual,
            TokenKind::Plus => BinaryOperator::Add,
            TokenKind::Minus => BinaryOperator::Subtract,
            TokenKind::Ampersand => BinaryOperator::Concat,
            TokenKind::Star => BinaryOperator::Multiply,
            TokenKind::Slash => BinaryOperator::Divide,
            _ => return None,
        };
        let power = match op {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Equals | BinaryOperator::NotEquals => 3,
            BinaryOperator::LessThan
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterEqual => 4,
            BinaryOperator::Add | BinaryOperator::Subtract | BinaryOperator::Concat => 5,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Power => 6,
        };
        Some((op, power))
    }

    fn parse_binary(&mut self, min_power: u8) -> ParseOutcome<Expr> {
        let mut left = self.parse_unary()?;
        while let Some((op, power)) = self.infix_binding_power() {
            if power < min_power {
                break;
            }
            self.advance();
            let right = self.parse_binary(power + 1)?;
            left = Expr::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseOutcome<Expr> {
        if self.eat(TokenKind::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expr::unary(UnaryOperator::Negate, operand));
        }
        // `NOT(x)` is left to the primary rule as a function call
        if self.check(TokenKind::Not) && !self.is_word_call() {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::unary(UnaryOperator::Not, operand));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> ParseOutcome<Expr> {
        let base = self.parse_call()?;
        if self.eat(TokenKind::Caret) {
            let exponent = self.parse_power()?;
            return Ok(Expr::binary(base, BinaryOperator::Power, exponent));
        }
        Ok(base)
    }

    // ========================================================================
    // Calls and primaries
    // ========================================================================

    fn parse_call(&mut self) -> ParseOutcome<Expr> {
        let name = match self.parse_primary()? {
            Expr::Table(table) if self.check(TokenKind::LParen) => table.name,
            other => return Ok(other),
        };
        self.advance();

        let args = self.parse_arguments()?;
        if !self.eat(TokenKind::RParen) {
            return Err(self.error("Expected ')' after function arguments"));
        }

        if name.eq_ignore_ascii_case("IF") && (2..=3).contains(&args.len()) {
            let mut rest = args.into_iter();
            let (Some(condition), Some(then_branch)) = (rest.next(), rest.next()) else {
                return Err(self.error("IF needs a condition and a result"));
            };
            return Ok(Expr::if_expr(condition, then_branch, rest.next()));
        }
        Ok(Expr::call(name, args))
    }

    fn parse_arguments(&mut self) -> ParseOutcome<Vec<Expr>> {
        let mut args = Vec::new();
        if self.check(TokenKind::RParen) {
            return Ok(args);
        }
        args.push(self.parse_expression()?);
        while self.eat(TokenKind::Comma) {
            args.push(self.parse_expression()?);
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> ParseOutcome<Expr> {
        let kind = self.peek().kind;
        match kind {
            TokenKind::True | TokenKind::False => {
                self.advance();
                self.eat_empty_parens();
                Ok(Expr::boolean(kind == TokenKind::True))
            }
            TokenKind::Blank => {
                self.advance();
                self.eat_empty_parens();
                Ok(Expr::blank())
            }
            TokenKind::Integer => {
                let token = self.advance().clone();
                parse_integer(&token.lexeme).ok_or_else(|| {
                    self.error_at(&token, format!("Invalid number: {}", token.lexeme))
                })
            }
            TokenKind::Float => {
                let token = self.advance().clone();
                token
                    .lexeme
                    .parse::<f64>()
                    .map(Expr::float)
                    .map_err(|_| self.error_at(&token, format!("Invalid number: {}", token.lexeme)))
            }
            TokenKind::String => {
                let lexeme = self.advance().lexeme.clone();
                Ok(Expr::string(unescape(strip_delimiters(&lexeme), '"')))
            }
            TokenKind::ColumnRef => {
                let lexeme = self.advance().lexeme.clone();
                Ok(Expr::column(None, strip_delimiters(&lexeme)))
            }
            TokenKind::Identifier | TokenKind::QuotedIdentifier | TokenKind::Keyword => {
                self.parse_qualified_reference()
            }
            TokenKind::And | TokenKind::Or | TokenKind::Not if self.is_word_call() => {
                let name = self.advance().lexeme.clone();
                Ok(Expr::table(name))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                if !self.eat(TokenKind::RParen) {
                    return Err(self.error("Expected ')' after grouped expression"));
                }
                Ok(expr)
            }
            TokenKind::Eof => Err(self.error("Unexpected end of input")),
            _ => {
                let lexeme = self.peek().lexeme.clone();
                Err(self.error(format!("Unexpected token: {}", lexeme)))
            }
        }
    }

    /// `Table[Column]`, `'Table Name'[Column]`, a bare table or function name,
    /// or a reference to a bound variable.
    fn parse_qualified_reference(&mut self) -> ParseOutcome<Expr> {
        let token = self.advance().clone();
        let name = match token.kind {
            TokenKind::QuotedIdentifier => unescape(strip_delimiters(&token.lexeme), '\''),
            _ => token.lexeme.clone(),
        };

        if self.check(TokenKind::ColumnRef) {
            let column = strip_delimiters(&self.advance().lexeme).to_string();
            return Ok(Expr::column(Some(&name), column));
        }

        if token.kind == TokenKind::Identifier && !self.check(TokenKind::LParen) {
            if let Some(bound) = self.lookup_variable(&name) {
                return Ok(Expr::var_reference(name, Some(bound.clone())));
            }
        }

        Ok(Expr::table(name))
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek_next_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| t.kind)
    }

    fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> &Token {
        if !self.at_end() {
            self.pos += 1;
        }
        &self.tokens[self.pos - 1]
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.at_end() && self.peek().kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_empty_parens(&mut self) {
        if self.check(TokenKind::LParen) && self.peek_next_kind() == Some(TokenKind::RParen) {
            self.advance();
            self.advance();
        }
    }

    /// Is the current token a spelled-out `AND`/`OR`/`NOT` used as a function?
    fn is_word_call(&self) -> bool {
        let token = self.peek();
        token.lexeme.chars().all(|c| c.is_ascii_alphabetic())
            && self.peek_next_kind() == Some(TokenKind::LParen)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        self.error_at(self.peek(), message)
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            line: token.line,
            column: token.column,
        }
    }
}

/// Drop the first and last character (quotes or brackets).
fn strip_delimiters(lexeme: &str) -> &str {
    let mut chars = lexeme.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}

/// Resolve backslash escapes and doubled delimiters.
fn unescape(body: &str, delimiter: char) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            c if c == delimiter && chars.peek() == Some(&delimiter) => {
                chars.next();
                out.push(delimiter);
            }
            c => out.push(c),
        }
    }
    out
}

/// Integers with an exponent, or too large for `i64`, become floats.
fn parse_integer(lexeme: &str) -> Option<Expr> {
    if !lexeme.contains(['e', 'E']) {
        if let Ok(value) = lexeme.parse::<i64>() {
            return Some(Expr::integer(value));
        }
    }
    lexeme.parse::<f64>().ok().map(Expr::float)
}
