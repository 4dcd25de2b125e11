//! Built-in DAX → Snowflake SQL patterns.
//!
//! Time intelligence predicates are anchored on `{current_date}`, which
//! defaults to `CURRENT_DATE()` because there is no report filter context to
//! take dates from.

use super::{Complexity, DaxPattern, PatternCategory};

use Complexity::{Complex, Moderate};
use PatternCategory::*;

const TODAY: &str = "CURRENT_DATE()";

fn pattern(name: &str, category: PatternCategory, template: &str, description: &str) -> DaxPattern {
    DaxPattern::new(name, category, template, description)
}

/// Period-to-date predicate on a date column (`DATESYTD` and friends).
fn to_date(name: &str, part: &str, description: &str) -> DaxPattern {
    pattern(
        name,
        TimeIntelligence,
        &format!("{{date_column}} BETWEEN DATE_TRUNC('{part}', {{current_date}}) AND {{current_date}}"),
        description,
    )
    .with_params(&["date_column"])
    .with_default("current_date", TODAY)
    .dialect_specific()
    .complexity(Moderate)
}

/// Whole previous period predicate (`PREVIOUSMONTH` and friends).
fn previous(name: &str, part: &str, description: &str) -> DaxPattern {
    pattern(
        name,
        TimeIntelligence,
        &format!(
            "{{date_column}} BETWEEN DATEADD({part}, -1, DATE_TRUNC('{part}', {{current_date}})) \
             AND DATEADD(day, -1, DATE_TRUNC('{part}', {{current_date}}))"
        ),
        description,
    )
    .with_params(&["date_column"])
    .with_default("current_date", TODAY)
    .dialect_specific()
    .complexity(Moderate)
}

/// Period-to-date total: a CALCULATE with the matching `DATES?TD` filter.
fn total_to_date(name: &str, description: &str) -> DaxPattern {
    pattern(name, TimeIntelligence, "(SELECT {expression} FROM {from}{where})", description)
        .with_params(&["expression", "date_column", "filter"])
        .with_default("filter", "")
        .needs_context()
        .dialect_specific()
        .complexity(Moderate)
}

/// Row-by-row iterator aggregate (`SUMX` and friends).
fn iterator(name: &str, aggregate: &str, description: &str) -> DaxPattern {
    pattern(name, Aggregation, &format!("{aggregate}({{expression}})"), description)
        .with_params(&["table", "expression"])
        .with_notes("Unqualified columns in the expression resolve against the iterated table")
        .needs_context()
        .complexity(Moderate)
}

pub(super) fn builtin() -> Vec<DaxPattern> {
    vec![
        // ========== AGGREGATION ==========
        pattern("SUM", Aggregation, "SUM({column})", "Sum of a column")
            .with_params(&["column"])
            .with_example("SUM(Sales[Amount])", "SUM(sales.amount)"),
        iterator("SUMX", "SUM", "Sum of an expression evaluated for each row").with_example(
            "SUMX(Sales, Sales[Quantity] * Sales[Discount])",
            "SUM(sales.quantity * sales.discount)",
        ),
        pattern("AVERAGE", Aggregation, "AVG({column})", "Average of a column")
            .with_params(&["column"])
            .with_example("AVERAGE(Sales[Amount])", "AVG(sales.amount)"),
        iterator("AVERAGEX", "AVG", "Average of an expression evaluated for each row"),
        pattern("COUNT", Aggregation, "COUNT({column})", "Count of non-blank values in a column")
            .with_params(&["column"])
            .with_example("COUNT(Sales[SaleId])", "COUNT(sales.sale_id)"),
        pattern("COUNTA", Aggregation, "COUNT({column})", "Count of non-blank values of any type")
            .with_params(&["column"]),
        iterator("COUNTX", "COUNT", "Count of non-blank expression results per row"),
        pattern(
            "COUNTBLANK",
            Aggregation,
            "SUM(CASE WHEN {column} IS NULL THEN 1 ELSE 0 END)",
            "Count of blank values in a column",
        )
        .with_params(&["column"]),
        pattern("COUNTROWS", Aggregation, "COUNT(*)", "Count of rows in a table")
            .with_params(&["table"])
            .with_example("COUNTROWS(Sales)", "COUNT(*)"),
        pattern("DISTINCTCOUNT", Aggregation, "COUNT(DISTINCT {column})", "Count of distinct values")
            .with_params(&["column"])
            .with_example("DISTINCTCOUNT(Sales[CustomerKey])", "COUNT(DISTINCT sales.customer_key)"),
        pattern("MIN", Aggregation, "MIN({column})", "Minimum value in a column").with_params(&["column"]),
        pattern("MAX", Aggregation, "MAX({column})", "Maximum value in a column").with_params(&["column"]),
        iterator("MINX", "MIN", "Minimum of an expression evaluated for each row"),
        iterator("MAXX", "MAX", "Maximum of an expression evaluated for each row"),
        // ========== FILTER ==========
        pattern(
            "CALCULATE",
            Filter,
            "(SELECT {expression} FROM {from}{where})",
            "Evaluate expression in modified filter context",
        )
        .with_params(&["expression", "filters"])
        .variadic(" AND ")
        .with_notes("Filters become WHERE conditions; joins follow the relationship graph")
        .with_example(
            "CALCULATE(SUM(Sales[Amount]), Store[Region] = \"West\")",
            "(SELECT SUM(sales.amount) FROM sales JOIN dim_store ON sales.store_key = dim_store.store_key WHERE dim_store.region = 'West')",
        )
        .needs_context()
        .complexity(Complex),
        pattern(
            "CALCULATETABLE",
            Filter,
            "(SELECT * FROM {from}{where})",
            "Table expression evaluated in modified filter context",
        )
        .with_params(&["table", "filters"])
        .variadic(" AND ")
        .needs_context()
        .complexity(Complex),
        pattern("FILTER", Filter, "(SELECT * FROM {table} WHERE {condition})", "Returns a filtered table")
            .with_params(&["table", "condition"])
            .with_notes("Often used inside CALCULATE or an X iterator")
            .needs_context()
            .complexity(Moderate),
        pattern("ALL", Filter, "(SELECT * FROM {table})", "Removes all filters from a table or columns")
            .with_params(&["table"])
            .with_notes("Inside CALCULATE, drops the matching WHERE conditions")
            .needs_context()
            .complexity(Complex),
        pattern(
            "ALLEXCEPT",
            Filter,
            "(SELECT * FROM {table})",
            "Removes filters except on the listed columns",
        )
        .with_params(&["table", "columns"])
        .variadic(", ")
        .needs_context()
        .complexity(Complex),
        pattern("REMOVEFILTERS", Filter, "(SELECT * FROM {table})", "Clears filters from a table or columns")
            .with_params(&["table"])
            .needs_context()
            .complexity(Complex),
        pattern("KEEPFILTERS", Filter, "{condition}", "Adds a filter without overriding existing ones")
            .with_params(&["condition"])
            .complexity(Moderate),
        pattern("VALUES", Filter, "(SELECT DISTINCT {column} FROM {table})", "Returns distinct values from a column")
            .with_params(&["column"]),
        pattern("DISTINCT", Filter, "(SELECT DISTINCT {column} FROM {table})", "Returns distinct values from a column")
            .with_params(&["column"]),
        // ========== TIME INTELLIGENCE ==========
        pattern(
            "SAMEPERIODLASTYEAR",
            TimeIntelligence,
            "{date_column} BETWEEN DATEADD(year, -1, DATE_TRUNC('year', {current_date})) AND DATEADD(year, -1, {current_date})",
            "Returns dates shifted back one year",
        )
        .with_params(&["date_column"])
        .with_default("current_date", TODAY)
        .with_notes("Use with date filter context")
        .with_example(
            "SAMEPERIODLASTYEAR('Date'[Date])",
            "dim_date.date BETWEEN DATEADD(year, -1, DATE_TRUNC('year', CURRENT_DATE())) AND DATEADD(year, -1, CURRENT_DATE())",
        )
        .needs_context()
        .dialect_specific()
        .complexity(Moderate),
        pattern(
            "DATEADD",
            TimeIntelligence,
            "DATEADD({interval}, {number}, {date_column})",
            "Returns dates shifted by specified interval",
        )
        .with_params(&["date_column", "number", "interval"])
        .with_notes("Intervals: day, week, month, quarter, year")
        .with_example("DATEADD('Date'[Date], -1, MONTH)", "DATEADD(month, -1, dim_date.date)")
        .dialect_specific(),
        to_date("DATESYTD", "year", "Returns year-to-date dates"),
        to_date("DATESQTD", "quarter", "Returns quarter-to-date dates"),
        to_date("DATESMTD", "month", "Returns month-to-date dates"),
        total_to_date("TOTALYTD", "Year-to-date total"),
        total_to_date("TOTALQTD", "Quarter-to-date total"),
        total_to_date("TOTALMTD", "Month-to-date total"),
        previous("PREVIOUSYEAR", "year", "Returns dates for the previous year"),
        previous("PREVIOUSQUARTER", "quarter", "Returns dates for the previous quarter"),
        previous("PREVIOUSMONTH", "month", "Returns dates for the previous month"),
        pattern(
            "PARALLELPERIOD",
            TimeIntelligence,
            "DATEADD({interval}, {number}, {date_column})",
            "Returns parallel period dates",
        )
        .with_params(&["date_column", "number", "interval"])
        .needs_context()
        .dialect_specific()
        .complexity(Moderate),
        // ========== LOGICAL ==========
        pattern(
            "IF",
            Logical,
            "CASE WHEN {condition} THEN {true_result} ELSE {false_result} END",
            "Conditional expression",
        )
        .with_params(&["condition", "true_result", "false_result"])
        .with_default("false_result", "NULL")
        .with_example(
            "IF(Sales[Amount] > 1000, \"High\", \"Low\")",
            "CASE WHEN sales.amount > 1000 THEN 'High' ELSE 'Low' END",
        ),
        pattern("SWITCH", Logical, "CASE {expression} {cases} END", "Multi-way conditional")
            .with_params(&["expression", "cases"])
            .variadic(" ")
            .with_notes("SWITCH(TRUE(), ...) becomes a searched CASE")
            .with_example(
                "SWITCH(Date[Month], 1, \"Jan\", 2, \"Feb\", \"Other\")",
                "CASE dim_date.month WHEN 1 THEN 'Jan' WHEN 2 THEN 'Feb' ELSE 'Other' END",
            )
            .complexity(Moderate),
        pattern("IFERROR", Logical, "COALESCE({value}, {value_if_error})", "Returns alternate value if error")
            .with_params(&["value", "value_if_error"])
            .with_notes("SQL errors abort the query; only NULL results fall back")
            .complexity(Moderate),
        pattern("ISBLANK", Logical, "({value} IS NULL)", "Check if value is blank/null")
            .with_params(&["value"])
            .with_example("ISBLANK(Customer[Email])", "(dim_customer.email IS NULL)"),
        pattern("COALESCE", Logical, "COALESCE({values})", "Returns first non-null value")
            .with_params(&["values"])
            .variadic(", "),
        pattern("AND", Logical, "({left} AND {right})", "Logical conjunction").with_params(&["left", "right"]),
        pattern("OR", Logical, "({left} OR {right})", "Logical disjunction").with_params(&["left", "right"]),
        pattern("NOT", Logical, "(NOT {value})", "Logical negation").with_params(&["value"]),
        // ========== MATH ==========
        pattern(
            "DIVIDE",
            Math,
            "CASE WHEN {denominator} = 0 THEN {alternate} ELSE {numerator} / {denominator} END",
            "Safe division with zero handling",
        )
        .with_params(&["numerator", "denominator", "alternate"])
        .with_default("alternate", "NULL")
        .with_notes("DIVIDE(a, b, alt) = if b=0 then alt else a/b")
        .with_example(
            "DIVIDE(Sales[Amount], Sales[Quantity])",
            "CASE WHEN sales.quantity = 0 THEN NULL ELSE sales.amount / sales.quantity END",
        ),
        pattern("ABS", Math, "ABS({value})", "Absolute value").with_params(&["value"]),
        pattern("ROUND", Math, "ROUND({value}, {decimals})", "Round to specified decimals")
            .with_params(&["value", "decimals"])
            .with_default("decimals", "0"),
        pattern("INT", Math, "FLOOR({value})", "Round down to integer").with_params(&["value"]),
        pattern("CEILING", Math, "CEIL({value})", "Round up to integer").with_params(&["value"]),
        pattern("MOD", Math, "MOD({number}, {divisor})", "Modulo operation").with_params(&["number", "divisor"]),
        pattern("POWER", Math, "POWER({base}, {exponent})", "Raise to power").with_params(&["base", "exponent"]),
        pattern("SQRT", Math, "SQRT({value})", "Square root").with_params(&["value"]),
        pattern("EXP", Math, "EXP({value})", "e raised to a power").with_params(&["value"]),
        pattern("LN", Math, "LN({value})", "Natural logarithm").with_params(&["value"]),
        pattern("LOG", Math, "LOG({base}, {value})", "Logarithm to a base (default 10)")
            .with_params(&["value", "base"])
            .with_default("base", "10"),
        pattern("SIGN", Math, "SIGN({value})", "Sign of a number").with_params(&["value"]),
        // ========== TEXT ==========
        pattern("CONCATENATE", Text, "CONCAT({text1}, {text2})", "Concatenate two strings")
            .with_params(&["text1", "text2"])
            .with_example(
                "CONCATENATE(Customer[CustomerName], Customer[Email])",
                "CONCAT(dim_customer.customer_name, dim_customer.email)",
            ),
        pattern("LEFT", Text, "LEFT({text}, {num_chars})", "Left substring")
            .with_params(&["text", "num_chars"])
            .with_default("num_chars", "1"),
        pattern("RIGHT", Text, "RIGHT({text}, {num_chars})", "Right substring")
            .with_params(&["text", "num_chars"])
            .with_default("num_chars", "1"),
        pattern("MID", Text, "SUBSTR({text}, {start}, {num_chars})", "Middle substring")
            .with_params(&["text", "start", "num_chars"])
            .dialect_specific(),
        pattern("LEN", Text, "LENGTH({text})", "String length")
            .with_params(&["text"])
            .dialect_specific(),
        pattern("UPPER", Text, "UPPER({text})", "Convert to uppercase").with_params(&["text"]),
        pattern("LOWER", Text, "LOWER({text})", "Convert to lowercase").with_params(&["text"]),
        pattern("TRIM", Text, "TRIM({text})", "Remove leading/trailing whitespace").with_params(&["text"]),
        pattern("SUBSTITUTE", Text, "REPLACE({text}, {old_text}, {new_text})", "Replace text")
            .with_params(&["text", "old_text", "new_text"]),
        pattern("FORMAT", Text, "TO_VARCHAR({value}, {format_string})", "Format value as string")
            .with_params(&["value", "format_string"])
            .with_notes("Format strings differ between DAX and SQL")
            .dialect_specific()
            .complexity(Moderate),
        // ========== TABLE ==========
        pattern(
            "SUMMARIZE",
            Table,
            "(SELECT {group_by}, {aggregations} FROM {table} GROUP BY {group_by})",
            "Group by and aggregate",
        )
        .with_params(&["table", "group_by"])
        .variadic(", ")
        .needs_context()
        .complexity(Moderate),
        pattern("ADDCOLUMNS", Table, "(SELECT *, {columns} FROM {table})", "Add calculated columns to table")
            .with_params(&["table", "columns"])
            .variadic(", ")
            .needs_context()
            .complexity(Moderate),
        pattern(
            "SELECTCOLUMNS",
            Table,
            "(SELECT {columns} FROM {table})",
            "Select specific columns with optional rename",
        )
        .with_params(&["table", "columns"])
        .variadic(", ")
        .needs_context()
        .complexity(Moderate),
        pattern(
            "TOPN",
            Table,
            "(SELECT * FROM {table} ORDER BY {order_by} {direction} LIMIT {n})",
            "Top N rows",
        )
        .with_params(&["n", "table", "order_by", "direction"])
        .with_default("direction", "DESC")
        .dialect_specific()
        .complexity(Moderate),
        pattern("UNION", Table, "(SELECT * FROM {table1} UNION ALL SELECT * FROM {table2})", "Combine tables")
            .with_params(&["table1", "table2"]),
        pattern("CROSSJOIN", Table, "(SELECT * FROM {table1} CROSS JOIN {table2})", "Cartesian product of tables")
            .with_params(&["table1", "table2"]),
        // ========== RELATIONSHIP ==========
        pattern("RELATED", Relationship, "{column}", "Get value from related table")
            .with_params(&["column"])
            .with_notes("Requires JOIN in SQL based on relationship")
            .needs_context()
            .complexity(Moderate),
        pattern("RELATEDTABLE", Relationship, "(SELECT * FROM {table})", "Get related table rows")
            .with_params(&["table"])
            .needs_context()
            .complexity(Moderate),
    ]
}
