use daxsql::schema::{sample_retail_context, Relationship, SchemaContext, SchemaError, Table};

#[test]
fn test_fact_to_dimension_is_one_hop() {
    let ctx = sample_retail_context();
    let path = ctx.join_path("Sales", "Product").unwrap();
    assert_eq!(path.len(), 1);
    assert_eq!(path[0].as_join(), "sales.product_key = dim_product.product_key");
}

#[test]
fn test_dimension_to_dimension_goes_through_fact() {
    let ctx = sample_retail_context();
    let path = ctx.join_path("Product", "Store").unwrap();
    assert_eq!(path.len(), 2);
    assert!(path.iter().all(|rel| rel.involves("sales")));
}

#[test]
fn test_join_clauses_from_fact() {
    let ctx = sample_retail_context();
    let clauses = ctx.join_clauses(&["sales", "Store", "Date"]).unwrap();
    assert_eq!(
        clauses,
        vec![
            "JOIN dim_store ON sales.store_key = dim_store.store_key".to_string(),
            "JOIN dim_date ON sales.date_key = dim_date.date_key".to_string(),
        ]
    );
}

#[test]
fn test_join_clauses_from_dimension_pull_in_fact() {
    let ctx = sample_retail_context();
    let clauses = ctx.join_clauses(&["dim_product", "dim_store"]).unwrap();
    assert_eq!(
        clauses,
        vec![
            "JOIN sales ON sales.product_key = dim_product.product_key".to_string(),
            "JOIN dim_store ON sales.store_key = dim_store.store_key".to_string(),
        ]
    );
}

#[test]
fn test_generate_joins_uses_schema_qualified_names() {
    let mut ctx = SchemaContext::new();
    ctx.add_table(Table::new("orders").with_schema("mart"));
    ctx.add_table(Table::new("customers").with_schema("mart"));
    ctx.add_relationship(Relationship::new("orders", "customer_id", "customers", "id"));

    let sql = ctx.generate_joins(&["orders", "customers"]).unwrap();
    assert_eq!(sql, "JOIN mart.customers ON orders.customer_id = customers.id");
}

#[test]
fn test_disconnected_table_is_no_path() {
    let mut ctx = sample_retail_context();
    ctx.add_table(Table::new("budget"));

    assert!(!ctx.has_path("sales", "budget"));
    let err = ctx.join_clauses(&["sales", "budget"]).unwrap_err();
    assert!(matches!(err, SchemaError::NoPath { ref to, .. } if to == "budget"));
}

#[test]
fn test_shortest_path_wins() {
    let mut ctx = SchemaContext::new();
    for name in ["a", "b", "c", "d"] {
        ctx.add_table(Table::new(name));
    }
    ctx.add_relationship(Relationship::new("a", "b_id", "b", "id"));
    ctx.add_relationship(Relationship::new("b", "c_id", "c", "id"));
    ctx.add_relationship(Relationship::new("c", "d_id", "d", "id"));
    ctx.add_relationship(Relationship::new("a", "d_id", "d", "id"));

    let path = ctx.join_path("a", "d").unwrap();
    assert_eq!(path.len(), 1);
    assert_eq!(path[0].as_join(), "a.d_id = d.id");
}
