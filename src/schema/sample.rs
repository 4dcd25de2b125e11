//! Retail star schema used in tests and demos.

use super::context::SchemaContext;
use super::types::{Column, ColumnType, Relationship, Table};

/// A `sales` fact table with date, product, store and customer dimensions.
///
/// DAX names are `Sales`, `Date`, `Product`, `Store` and `Customer`; SQL
/// names are lower snake case (`dim_date`, ...).
pub fn sample_retail_context() -> SchemaContext {
    use ColumnType::*;

    let mut ctx = SchemaContext::new();

    ctx.add_table(
        Table::new("sales")
            .with_dax_name("Sales")
            .with_column(Column::new("sale_id", Integer).with_dax_name("SaleId").key())
            .with_column(Column::new("date_key", Integer).with_dax_name("DateKey"))
            .with_column(Column::new("product_key", Integer).with_dax_name("ProductKey"))
            .with_column(Column::new("store_key", Integer).with_dax_name("StoreKey"))
            .with_column(Column::new("customer_key", Integer).with_dax_name("CustomerKey"))
            .with_column(Column::new("quantity", Integer).with_dax_name("Quantity"))
            .with_column(Column::new("amount", Decimal).with_dax_name("Amount"))
            .with_column(Column::new("discount", Decimal).with_dax_name("Discount"))
            .with_primary_key(&["sale_id"])
            .with_description("Sales transactions"),
    );

    ctx.add_table(
        Table::new("dim_date")
            .with_dax_name("Date")
            .with_column(Column::new("date_key", Integer).key())
            .with_column(Column::new("date", Date).with_dax_name("Date"))
            .with_column(Column::new("year", Integer).with_dax_name("Year"))
            .with_column(Column::new("quarter", Integer).with_dax_name("Quarter"))
            .with_column(Column::new("month", Integer).with_dax_name("Month"))
            .with_column(Column::new("month_name", String).with_dax_name("MonthName"))
            .with_column(Column::new("day", Integer).with_dax_name("Day"))
            .with_column(Column::new("day_of_week", Integer).with_dax_name("DayOfWeek"))
            .with_column(Column::new("week", Integer).with_dax_name("Week"))
            .with_primary_key(&["date_key"])
            .with_description("Date dimension for time intelligence"),
    );

    ctx.add_table(
        Table::new("dim_product")
            .with_dax_name("Product")
            .with_column(Column::new("product_key", Integer).key())
            .with_column(Column::new("product_name", String).with_dax_name("ProductName"))
            .with_column(Column::new("category", String).with_dax_name("Category"))
            .with_column(Column::new("subcategory", String).with_dax_name("Subcategory"))
            .with_column(Column::new("brand", String).with_dax_name("Brand"))
            .with_column(Column::new("unit_price", Decimal).with_dax_name("UnitPrice"))
            .with_primary_key(&["product_key"])
            .with_description("Product dimension"),
    );

    ctx.add_table(
        Table::new("dim_store")
            .with_dax_name("Store")
            .with_column(Column::new("store_key", Integer).key())
            .with_column(Column::new("store_name", String).with_dax_name("StoreName"))
            .with_column(Column::new("city", String).with_dax_name("City"))
            .with_column(Column::new("state", String).with_dax_name("State"))
            .with_column(Column::new("region", String).with_dax_name("Region"))
            .with_primary_key(&["store_key"])
            .with_description("Store dimension"),
    );

    ctx.add_table(
        Table::new("dim_customer")
            .with_dax_name("Customer")
            .with_column(Column::new("customer_key", Integer).key())
            .with_column(Column::new("customer_name", String).with_dax_name("CustomerName"))
            .with_column(Column::new("email", String).with_dax_name("Email"))
            .with_column(Column::new("segment", String).with_dax_name("Segment"))
            .with_primary_key(&["customer_key"])
            .with_description("Customer dimension"),
    );

    for (dim, key) in [
        ("dim_date", "date_key"),
        ("dim_product", "product_key"),
        ("dim_store", "store_key"),
        ("dim_customer", "customer_key"),
    ] {
        ctx.add_relationship(Relationship::new("sales", key, dim, key));
    }

    ctx
}
