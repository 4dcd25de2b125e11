use daxsql::schema::{
    sample_retail_context, Column, ColumnType, FilterContext, SchemaContext, Table,
};

#[test]
fn test_table_lookup_by_dax_or_sql_name() {
    let ctx = sample_retail_context();
    assert_eq!(ctx.table("Date").map(|t| t.name.as_str()), Some("dim_date"));
    assert_eq!(ctx.table("DIM_DATE").map(|t| t.name.as_str()), Some("dim_date"));
    assert_eq!(ctx.sql_table_name("product"), Some("dim_product"));
    assert_eq!(ctx.dax_table_name("dim_store"), Some("Store"));
    assert!(ctx.table("Inventory").is_none());
}

#[test]
fn test_column_lookup_case_insensitive() {
    let ctx = sample_retail_context();
    assert_eq!(ctx.sql_column_name("Product", "unitprice"), Some("unit_price"));
    assert_eq!(ctx.sql_column_name("sales", "AMOUNT"), Some("amount"));
    assert!(ctx.column("Sales", "Margin").is_none());
}

#[test]
fn test_find_column_prefers_given_tables() {
    let ctx = sample_retail_context();
    // product_key lives on both sales and dim_product
    let (table, _) = ctx.find_column("ProductKey", &[]).unwrap();
    assert_eq!(table.name, "sales");
    let (table, _) = ctx.find_column("product_key", &["Product"]).unwrap();
    assert_eq!(table.name, "dim_product");
}

#[test]
fn test_replacing_a_table_keeps_position() {
    let mut ctx = sample_retail_context();
    ctx.add_table(
        Table::new("dim_store")
            .with_dax_name("Shop")
            .with_column(Column::new("store_key", ColumnType::Integer).key()),
    );
    assert_eq!(ctx.tables().len(), 5);
    assert_eq!(ctx.tables()[3].effective_dax_name(), "Shop");
    assert!(ctx.table("Shop").is_some());
    assert!(ctx.table("Store").is_none());
}

#[test]
fn test_schema_qualified_full_name() {
    let table = Table::new("orders").with_schema("analytics");
    assert_eq!(table.full_name(), "analytics.orders");
    assert_eq!(Table::new("orders").full_name(), "orders");
}

#[test]
fn test_json_round_trip() {
    let ctx = sample_retail_context();
    let json = ctx.to_json().unwrap();
    let restored = SchemaContext::from_json(&json).unwrap();
    assert_eq!(restored.tables(), ctx.tables());
    assert_eq!(restored.relationships(), ctx.relationships());
    assert!(restored.has_path("Product", "Store"));
}

#[test]
fn test_invalid_json_is_error() {
    let err = SchemaContext::from_json("{ not json").unwrap_err();
    assert!(err.to_string().starts_with("Invalid schema JSON"));
}

#[test]
fn test_prompt_context_lists_tables_and_relationships() {
    let text = sample_retail_context().to_prompt_context();
    assert!(text.starts_with("# Schema Context"));
    assert!(text.contains("### Sales (SQL: sales)"));
    assert!(text.contains("  - Amount: decimal"));
    assert!(text.contains("## Relationships"));
    assert!(text.contains("- sales.store_key → dim_store.store_key"));
}

#[test]
fn test_warehouse_type_mapping() {
    assert_eq!(ColumnType::from_warehouse_type("varchar"), ColumnType::String);
    assert_eq!(ColumnType::from_warehouse_type("NUMBER"), ColumnType::Decimal);
    assert_eq!(ColumnType::from_warehouse_type("geography"), ColumnType::Unknown);
}

// ============================================================================
// FilterContext
// ============================================================================

#[test]
fn test_filters_join_with_and_in_insertion_order() {
    let mut filters = FilterContext::new();
    filters.add_filter("dim_store", "region", "dim_store.region = 'West'");
    filters.add_filter("dim_date", "year", "dim_date.year = 2024");
    assert_eq!(
        filters.to_where_clause(),
        "dim_store.region = 'West' AND dim_date.year = 2024"
    );
}

#[test]
fn test_remove_table_filters() {
    let mut filters = FilterContext::new();
    filters.add_filter("dim_store", "region", "r");
    filters.add_filter("dim_store", "city", "c");
    filters.add_filter("dim_date", "year", "y");
    filters.remove_filter("DIM_STORE", None);
    assert_eq!(filters.to_where_clause(), "y");
    assert!(filters.is_removed("dim_store", "city"));
}

#[test]
fn test_remove_all_except() {
    let mut filters = FilterContext::new();
    filters.add_filter("dim_store", "region", "r");
    filters.add_filter("dim_store", "city", "c");
    filters.remove_all_except("dim_store", &["region"]);
    assert_eq!(filters.to_where_clause(), "r");
}

#[test]
fn test_readding_removed_key_makes_it_effective() {
    let mut filters = FilterContext::new();
    filters.add_filter("dim_date", "year", "old");
    filters.remove_filter("dim_date", Some("year"));
    assert!(filters.is_empty());
    filters.add_filter("dim_date", "year", "new");
    assert_eq!(filters.to_where_clause(), "new");
}

#[test]
fn test_reset_clears_everything() {
    let mut filters = FilterContext::new();
    filters.add_filter("t", "c", "x");
    filters.remove_filter("t", Some("d"));
    filters.reset();
    assert_eq!(filters, FilterContext::new());
}
