use daxsql::dax::{is_keyword, tokenize, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .expect("lexing should succeed")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn test_tokenize_is_deterministic() {
    let source = "CALCULATE(SUM(Sales[Amount]), 'Dim Date'[Year] = 2024, Store[Region] <> \"West\")";
    let first = tokenize(source).unwrap();
    for _ in 0..5 {
        assert_eq!(tokenize(source).unwrap(), first);
    }
}

#[test]
fn test_measure_definition_tokens() {
    assert_eq!(
        kinds("[Total Sales] = SUMX(Sales, Sales[Quantity] * Sales[Price])"),
        vec![
            TokenKind::ColumnRef,
            TokenKind::Eq,
            TokenKind::Keyword,
            TokenKind::LParen,
            TokenKind::Identifier,
            TokenKind::Comma,
            TokenKind::Identifier,
            TokenKind::ColumnRef,
            TokenKind::Star,
            TokenKind::Identifier,
            TokenKind::ColumnRef,
            TokenKind::RParen,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_var_return_block() {
    assert_eq!(
        kinds("VAR x = 1\nRETURN x"),
        vec![
            TokenKind::Var,
            TokenKind::Identifier,
            TokenKind::Eq,
            TokenKind::Integer,
            TokenKind::Return,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_quoted_table_with_doubled_quote() {
    let tokens = tokenize("'O''Brien Sales'[Amount]").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::QuotedIdentifier);
    assert_eq!(tokens[0].lexeme, "'O''Brien Sales'");
}

#[test]
fn test_positions_count_characters() {
    let tokens = tokenize("\"é\" & x").unwrap();
    let amp = &tokens[1];
    assert_eq!(amp.kind, TokenKind::Ampersand);
    assert_eq!(amp.column, 5);
    assert_eq!(amp.offset, 5);
}

#[test]
fn test_unterminated_string_is_error() {
    let err = tokenize("\"open").unwrap_err();
    assert_eq!(err.line, 1);
    assert!(err.to_string().starts_with("Lexer error at line 1"));
}

#[test]
fn test_keyword_lookup() {
    assert!(is_keyword("calculate"));
    assert!(is_keyword("TotalYTD"));
    assert!(!is_keyword("Sales"));
}
