use daxsql::schema::{sample_retail_context, SchemaContext};
use daxsql::translate::{Confidence, Translator};

fn retail() -> Translator {
    Translator::new().with_context(sample_retail_context())
}

// ============================================================================
// Basics
// ============================================================================

#[test]
fn test_sum_without_context_is_guessed() {
    let result = Translator::new().translate("SUM(Sales[Amount])").unwrap();
    assert!(result.success);
    assert!(result.sql.to_lowercase().contains("sum("));
    assert_eq!(result.sql, "SUM(sales.amount)");
    assert!(result.confidence <= Confidence::Medium);
    assert!(!result.warnings.is_empty());
}

#[test]
fn test_sum_with_context_is_high() {
    let result = retail().translate("SUM(Sales[Amount])").unwrap();
    assert_eq!(result.sql, "SUM(sales.amount)");
    assert_eq!(result.confidence, Confidence::High);
    assert_eq!(result.tables_used, vec!["sales".to_string()]);
    assert_eq!(result.patterns_applied, vec!["SUM".to_string()]);
}

#[test]
fn test_unbalanced_paren_fails() {
    let result = Translator::new().translate("SUM(Sales[Amount]))").unwrap();
    assert!(!result.success);
    assert_eq!(result.confidence, Confidence::Low);
    assert!(result.sql.is_empty());
    assert_eq!(result.errors.len(), 1);
}

#[test]
fn test_countrows() {
    let result = Translator::new().translate("COUNTROWS(Sales)").unwrap();
    assert_eq!(result.sql, "COUNT(*)");
    assert!(result.patterns_applied.contains(&"COUNTROWS".to_string()));
}

#[test]
fn test_unknown_function_is_low() {
    let result = retail().translate("UNKNOWNFUNC(Sales[X])").unwrap();
    assert!(result.success);
    assert_eq!(result.confidence, Confidence::Low);
    assert!(result.warnings.iter().any(|w| w.contains("UNKNOWNFUNC")));
    assert_eq!(result.sql, "UNKNOWNFUNC(sales.x)");
}

#[test]
fn test_unknown_table_is_low() {
    let result = retail().translate("SUM(Inventory[OnHand])").unwrap();
    assert_eq!(result.sql, "SUM(inventory.onhand)");
    assert_eq!(result.confidence, Confidence::Low);
}

#[test]
fn test_translation_is_idempotent() {
    let translator = retail();
    let dax = "CALCULATE(SUM(Sales[Amount]), Store[Region] = \"West\", 'Date'[Year] = 2024)";
    let first = translator.translate(dax).unwrap();
    for _ in 0..3 {
        assert_eq!(translator.translate(dax).unwrap().sql, first.sql);
    }
}

#[test]
fn test_measure_definition_aliases() {
    let result = retail()
        .translate("[Avg Price] = AVERAGE(Product[UnitPrice])")
        .unwrap();
    assert_eq!(result.sql, "AVG(dim_product.unit_price) AS \"Avg Price\"");
}

#[test]
fn test_empty_context_counts_as_none() {
    let result = Translator::new()
        .with_context(SchemaContext::new())
        .translate("SUM(Sales[Amount])")
        .unwrap();
    assert_eq!(result.confidence, Confidence::Medium);
}

// ============================================================================
// CALCULATE and filter context
// ============================================================================

#[test]
fn test_calculate_builds_joined_subquery() {
    let result = retail()
        .translate("CALCULATE(SUM(Sales[Amount]), Store[Region] = \"West\")")
        .unwrap();
    assert_eq!(
        result.sql,
        "(SELECT SUM(sales.amount) FROM sales \
         JOIN dim_store ON sales.store_key = dim_store.store_key \
         WHERE dim_store.region = 'West')"
    );
    assert_eq!(result.confidence, Confidence::Medium);
    assert_eq!(result.tables_used.len(), 2);
    assert!(result.tables_used.contains(&"dim_store".to_string()));
}

#[test]
fn test_calculate_multiple_filters_and_together() {
    let result = retail()
        .translate("CALCULATE(SUM(Sales[Amount]), Store[Region] = \"West\", 'Date'[Year] = 2024)")
        .unwrap();
    assert_eq!(
        result.sql,
        "(SELECT SUM(sales.amount) FROM sales \
         JOIN dim_store ON sales.store_key = dim_store.store_key \
         JOIN dim_date ON sales.date_key = dim_date.date_key \
         WHERE dim_store.region = 'West' AND dim_date.year = 2024)"
    );
}

#[test]
fn test_nested_all_removes_outer_filter() {
    let dax = "CALCULATE(CALCULATE(SUM(Sales[Amount]), ALL(Store)), Store[Region] = \"West\")";
    let result = retail().translate(dax).unwrap();
    assert_eq!(
        result.sql,
        "(SELECT (SELECT SUM(sales.amount) FROM sales) FROM sales \
         JOIN dim_store ON sales.store_key = dim_store.store_key \
         WHERE dim_store.region = 'West')"
    );
    assert!(result.patterns_applied.contains(&"ALL".to_string()));
}

#[test]
fn test_nested_calculate_inherits_outer_filter() {
    let dax = "CALCULATE(CALCULATE(SUM(Sales[Amount]), 'Date'[Year] = 2024), Store[Region] = \"West\")";
    let result = retail().translate(dax).unwrap();
    assert!(result.sql.starts_with(
        "(SELECT (SELECT SUM(sales.amount) FROM sales \
         JOIN dim_store ON sales.store_key = dim_store.store_key \
         JOIN dim_date ON sales.date_key = dim_date.date_key \
         WHERE dim_store.region = 'West' AND dim_date.year = 2024)"
    ));
}

#[test]
fn test_filter_function_as_calculate_argument() {
    let dax = "CALCULATE(SUM(Sales[Amount]), FILTER(Product, Product[Category] = \"Bikes\"))";
    let result = retail().translate(dax).unwrap();
    assert_eq!(
        result.sql,
        "(SELECT SUM(sales.amount) FROM sales \
         JOIN dim_product ON sales.product_key = dim_product.product_key \
         WHERE dim_product.category = 'Bikes')"
    );
    assert!(result.patterns_applied.contains(&"FILTER".to_string()));
}

#[test]
fn test_allexcept_keeps_listed_column() {
    let dax = "CALCULATE(CALCULATE(SUM(Sales[Amount]), ALLEXCEPT(Store, Store[Region])), \
               Store[Region] = \"West\", Store[City] = \"Austin\")";
    let result = retail().translate(dax).unwrap();
    assert!(result.sql.starts_with(
        "(SELECT (SELECT SUM(sales.amount) FROM sales \
         JOIN dim_store ON sales.store_key = dim_store.store_key \
         WHERE dim_store.region = 'West')"
    ));
}

#[test]
fn test_calculate_without_context_cannot_join() {
    let result = Translator::new()
        .translate("CALCULATE(SUM(Sales[Amount]), Store[Region] = \"West\")")
        .unwrap();
    assert_eq!(
        result.sql,
        "(SELECT SUM(sales.amount) FROM sales WHERE store.region = 'West')"
    );
    assert_eq!(result.confidence, Confidence::Low);
    assert!(result.warnings.iter().any(|w| w.starts_with("Cannot join")));
}

#[test]
fn test_unreachable_table_is_warned() {
    let mut ctx = sample_retail_context();
    ctx.add_table(daxsql::schema::Table::new("budget").with_dax_name("Budget"));
    let result = Translator::new()
        .with_context(ctx)
        .translate("CALCULATE(SUM(Sales[Amount]), Budget[Year] = 2024)")
        .unwrap();
    assert_eq!(result.confidence, Confidence::Low);
    assert!(result.warnings.iter().any(|w| w.contains("budget")));
}

#[test]
fn test_totalytd() {
    let result = retail()
        .translate("TOTALYTD(SUM(Sales[Amount]), 'Date'[Date])")
        .unwrap();
    assert_eq!(
        result.sql,
        "(SELECT SUM(sales.amount) FROM sales \
         JOIN dim_date ON sales.date_key = dim_date.date_key \
         WHERE dim_date.date BETWEEN DATE_TRUNC('year', CURRENT_DATE()) AND CURRENT_DATE())"
    );
    assert!(result.patterns_applied.contains(&"TOTALYTD".to_string()));
    assert!(result.patterns_applied.contains(&"DATESYTD".to_string()));
}

// ============================================================================
// Iterators, SWITCH, tables
// ============================================================================

#[test]
fn test_sumx_over_filter_guards_rows() {
    let dax = "SUMX(FILTER(Sales, Sales[Quantity] > 1), Sales[Amount])";
    let result = retail().translate(dax).unwrap();
    assert_eq!(
        result.sql,
        "SUM(CASE WHEN sales.quantity > 1 THEN sales.amount END)"
    );
}

#[test]
fn test_searched_switch() {
    let dax = "SWITCH(TRUE(), Sales[Amount] > 1000, \"High\", Sales[Amount] > 100, \"Mid\", \"Low\")";
    let result = retail().translate(dax).unwrap();
    assert_eq!(
        result.sql,
        "CASE WHEN sales.amount > 1000 THEN 'High' WHEN sales.amount > 100 THEN 'Mid' ELSE 'Low' END"
    );
}

#[test]
fn test_summarize_groups_and_aggregates() {
    let dax = "SUMMARIZE(Sales, Store[Region], \"Total\", SUM(Sales[Amount]))";
    let result = retail().translate(dax).unwrap();
    assert_eq!(
        result.sql,
        "(SELECT dim_store.region, SUM(sales.amount) AS \"Total\" FROM sales GROUP BY dim_store.region)"
    );
}

#[test]
fn test_values_derives_table() {
    let result = retail().translate("VALUES(Product[Category])").unwrap();
    assert_eq!(result.sql, "(SELECT DISTINCT dim_product.category FROM dim_product)");
}

#[test]
fn test_topn_default_direction() {
    let result = retail().translate("TOPN(5, Product, Product[UnitPrice])").unwrap();
    assert_eq!(
        result.sql,
        "(SELECT * FROM dim_product ORDER BY dim_product.unit_price DESC LIMIT 5)"
    );
}

#[test]
fn test_missing_argument_is_low() {
    let result = retail().translate("ROUND()").unwrap();
    assert_eq!(result.confidence, Confidence::Low);
    assert!(result.warnings.iter().any(|w| w == "ROUND: missing argument value"));
}

#[test]
fn test_summarize_without_columns_selects_distinct_rows() {
    let result = retail().translate("SUMMARIZE(Sales)").unwrap();
    assert_eq!(result.sql, "(SELECT DISTINCT * FROM sales)");
    assert!(result.patterns_applied.contains(&"SUMMARIZE".to_string()));
}

#[test]
fn test_malformed_calls_fall_back_to_plain_sql() {
    let cases = [
        ("CALCULATE()", "CALCULATE()"),
        ("CALCULATETABLE()", "CALCULATETABLE()"),
        ("TOTALYTD(SUM(Sales[Amount]))", "TOTALYTD(SUM(sales.amount))"),
        ("SUMMARIZE()", "SUMMARIZE()"),
        ("SWITCH(Sales[Amount])", "SWITCH(sales.amount)"),
        ("SWITCH(Sales[Amount], 1)", "SWITCH(sales.amount, 1)"),
        ("SUMX(Sales)", "SUMX(sales)"),
    ];
    for (dax, sql) in cases {
        let result = retail().translate(dax).unwrap();
        assert!(result.success, "{}: {:?}", dax, result.errors);
        assert_eq!(result.sql, sql, "{}", dax);
        assert_eq!(result.confidence, Confidence::Low, "{}", dax);
        let name = dax.split('(').next().unwrap();
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.starts_with(name) && w.ends_with("emitted as a plain SQL call")),
            "{}: {:?}",
            dax,
            result.warnings
        );
    }
}
