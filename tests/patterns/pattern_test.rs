use daxsql::patterns::{Complexity, DaxPattern, PatternCategory, PatternLibrary};
use daxsql::schema::sample_retail_context;
use daxsql::sql::Dialect;
use daxsql::translate::Translator;
use insta::assert_snapshot;

#[test]
fn test_catalog_covers_every_category() {
    let lib = PatternLibrary::new();
    for category in PatternCategory::ALL {
        assert!(
            !lib.by_category(category).is_empty(),
            "no patterns for {}",
            category
        );
    }
    assert!(lib.len() >= 60);
}

#[test]
fn test_catalog_examples_translate_to_documented_sql() {
    let lib = PatternLibrary::new();
    let translator = Translator::new().with_context(sample_retail_context());

    let mut checked = 0;
    for name in lib.names() {
        let Some(example) = lib.get(name).and_then(|p| p.example.as_ref()) else {
            continue;
        };
        let result = translator.translate(&example.dax).unwrap();
        assert!(result.success, "{}: {:?}", name, result.errors);
        assert_eq!(result.sql, example.sql, "example for {}", name);
        assert!(
            result.patterns_applied.iter().any(|p| p == name),
            "{} not recorded in {:?}",
            name,
            result.patterns_applied
        );
        checked += 1;
    }
    assert!(checked >= 10);
}

#[test]
fn test_custom_pattern_is_used_by_translator() {
    let mut lib = PatternLibrary::new();
    lib.add(
        DaxPattern::new("MEDIAN", PatternCategory::Aggregation, "MEDIAN({column})", "Median")
            .with_params(&["column"]),
    );
    let translator = Translator::new()
        .with_context(sample_retail_context())
        .with_patterns(lib);

    let result = translator.translate("MEDIAN(Sales[Amount])").unwrap();
    assert_eq!(result.sql, "MEDIAN(sales.amount)");
    assert_eq!(result.patterns_applied, vec!["MEDIAN".to_string()]);
}

#[test]
fn test_complex_patterns_flagged() {
    let lib = PatternLibrary::new();
    assert_eq!(lib.get("CALCULATE").unwrap().complexity, Complexity::Complex);
    assert!(lib.get("CALCULATE").unwrap().needs_context);
    assert_eq!(lib.get("SUM").unwrap().complexity, Complexity::Simple);
}

#[test]
fn test_reference_document() {
    let mut lib = PatternLibrary::empty();
    lib.add(
        DaxPattern::new("SUM", PatternCategory::Aggregation, "SUM({column})", "Sum of a column")
            .with_params(&["column"])
            .with_example("SUM(Sales[Amount])", "SUM(sales.amount)"),
    );
    lib.add(DaxPattern::new(
        "UPPER",
        PatternCategory::Text,
        "UPPER({text})",
        "Uppercase text",
    ));
    lib.add(DaxPattern::new(
        "ABS",
        PatternCategory::Math,
        "ABS({number})",
        "Absolute value",
    ));

    assert_snapshot!(lib.to_prompt_context(), @r"
    # DAX → SQL Pattern Reference

    ## Aggregation Functions
    - SUM: Sum of a column
      DAX: `SUM(Sales[Amount])`
      SQL: `SUM(sales.amount)`

    ## Math Functions
    - ABS: Absolute value

    ## Text Functions
    - UPPER: Uppercase text
    ");
}

#[test]
fn test_dialect_remapping_through_translator() {
    let ctx = sample_retail_context();
    let dax = "LEN(Customer[Email])";

    let cases = [
        (Dialect::Snowflake, "LENGTH(dim_customer.email)"),
        (Dialect::Postgres, "LENGTH(dim_customer.email)"),
        (Dialect::BigQuery, "CHAR_LENGTH(dim_customer.email)"),
        (Dialect::TSql, "LEN(dim_customer.email)"),
    ];
    for (dialect, expected) in cases {
        let result = Translator::new()
            .with_context(ctx.clone())
            .with_dialect(dialect)
            .translate(dax)
            .unwrap();
        assert_eq!(result.sql, expected, "{}", dialect);
    }
}
