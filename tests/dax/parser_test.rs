use daxsql::dax::{parse, parse_measure, BinaryOperator, Expr, Literal};

fn ast(source: &str) -> Expr {
    let result = parse(source);
    assert!(result.success(), "{:?}", result.errors);
    result.ast
}

#[test]
fn test_grammar_valid_expressions_parse() {
    let sources = [
        "1",
        "-Sales[Amount]",
        "NOT ISBLANK(Sales[Amount])",
        "Sales[Amount] * (1 + 0.2) / 2",
        "\"a\" & \"b\"",
        "CALCULATE(SUM(Sales[Amount]), ALL('Date'), 'Date'[Year] = 2024)",
        "IF(Sales[Amount] > 100, \"High\", \"Low\")",
        "SWITCH(TRUE(), Sales[Amount] > 100, 1, 0)",
        "VAR a = 1 VAR b = a + 1 RETURN a * b",
        "AND(TRUE, FALSE) || OR(1 = 1, NOT(FALSE))",
        "BLANK()",
        "Sales[Amount] >= 10 && Sales[Amount] <= 20",
    ];
    for source in sources {
        let result = parse(source);
        assert!(result.success(), "{}: {:?}", source, result.errors);
    }
}

#[test]
fn test_multiplication_binds_tighter() {
    assert_eq!(ast("1 + 2 * 3").to_string(), "(1 + (2 * 3))");
}

#[test]
fn test_power_is_right_associative() {
    assert_eq!(ast("2 ^ 3 ^ 2").to_string(), "(2 ^ (3 ^ 2))");
}

#[test]
fn test_subtraction_is_left_associative() {
    assert_eq!(ast("10 - 4 - 3").to_string(), "((10 - 4) - 3)");
}

#[test]
fn test_logical_precedence() {
    let expr = ast("a = 1 || b = 2 && c = 3");
    let Expr::Binary(or) = expr else {
        panic!("expected binary root");
    };
    assert_eq!(or.op, BinaryOperator::Or);
    assert!(matches!(*or.right, Expr::Binary(ref and) if and.op == BinaryOperator::And));
}

#[test]
fn test_if_call_becomes_if_node() {
    let Expr::If(node) = ast("IF(x > 1, 2)") else {
        panic!("expected IF node");
    };
    assert!(node.else_branch.is_none());
}

#[test]
fn test_if_with_wrong_arity_stays_a_call() {
    let Expr::Function(call) = ast("IF(1)") else {
        panic!("expected function call");
    };
    assert_eq!(call.args.len(), 1);
    let Expr::If(node) = ast("IF(x, 1, 2)") else {
        panic!("expected IF node");
    };
    assert!(node.else_branch.is_some());
}

#[test]
fn test_true_with_parens_is_literal() {
    assert_eq!(ast("TRUE()"), Expr::Literal(Literal::Boolean(true)));
}

#[test]
fn test_variable_references_carry_value() {
    let Expr::Binary(bin) = ast("VAR Rate = 0.2 RETURN Sales[Amount] * Rate") else {
        panic!("expected binary root");
    };
    let Expr::Variable(var) = *bin.right else {
        panic!("expected variable reference");
    };
    assert_eq!(var.name, "Rate");
    assert_eq!(var.value.as_deref(), Some(&Expr::float(0.2)));
}

#[test]
fn test_measure_definition() {
    let result = parse_measure("[Total Sales] = SUM(Sales[Amount])");
    assert!(result.success());
    let Expr::Measure(measure) = result.ast else {
        panic!("expected measure");
    };
    assert_eq!(measure.name, "Total Sales");
    assert_eq!(measure.expression.to_string(), "SUM(Sales[Amount])");
}

#[test]
fn test_measure_requires_equals() {
    let result = parse_measure("[Total Sales] SUM(Sales[Amount])");
    assert!(!result.success());
    assert!(result.errors[0].contains("Expected '=' after measure name"));
}

#[test]
fn test_trailing_tokens_reported() {
    let result = parse("SUM(Sales[Amount]))");
    assert!(!result.success());
    assert_eq!(result.errors, vec!["Unexpected token after expression: )".to_string()]);
}

#[test]
fn test_error_reports_line_and_column() {
    let result = parse("SUM(\n  Sales[Amount] +\n)");
    assert!(!result.success());
    assert!(result.errors[0].starts_with("Parse error at line 3, column 1"), "{}", result.errors[0]);
    assert!(result.ast.is_blank());
}

#[test]
fn test_lex_error_surfaces_as_parse_error() {
    let result = parse("1 + @");
    assert!(!result.success());
    assert!(result.errors[0].starts_with("Lexer error"));
    assert!(result.tokens.is_empty());
}
