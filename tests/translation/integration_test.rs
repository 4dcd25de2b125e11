//! End-to-end: DAX in, SQL out, SQL checked by sqlparser and the validator.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use daxsql::schema::sample_retail_context;
use daxsql::sql::check::{check_expression, validate_sql};
use daxsql::sql::Dialect;
use daxsql::translate::{Confidence, EnhanceRequest, Enhancement, Enhancer, Translator};
use daxsql::validate::SqlValidator;
use insta::assert_snapshot;
use tracing_subscriber::fmt::MakeWriter;

fn retail(dialect: Dialect) -> Translator {
    Translator::new()
        .with_context(sample_retail_context())
        .with_dialect(dialect)
}

const PORTABLE: &[&str] = &[
    "SUM(Sales[Amount])",
    "DIVIDE(SUM(Sales[Amount]), SUM(Sales[Quantity]))",
    "CALCULATE(SUM(Sales[Amount]), Store[Region] = \"West\")",
    "CALCULATE(SUM(Sales[Amount]), Store[Region] = \"West\", 'Date'[Year] = 2024)",
    "CALCULATE(CALCULATE(SUM(Sales[Amount]), ALL(Store)), Store[Region] = \"West\")",
    "SUMX(FILTER(Sales, Sales[Quantity] > 1), Sales[Amount])",
    "IF(SUM(Sales[Amount]) > 1000, \"High\", \"Low\")",
    "SWITCH(TRUE(), Sales[Amount] > 1000, \"High\", \"Low\")",
    "COUNTROWS(Sales)",
    "DISTINCTCOUNT(Sales[CustomerKey])",
    "ROUND(AVERAGE(Product[UnitPrice]), 2)",
    "[Avg Price] = AVERAGE(Product[UnitPrice])",
];

#[test]
fn test_translated_sql_parses_in_each_dialect() {
    for dialect in [Dialect::Snowflake, Dialect::Postgres, Dialect::DuckDb] {
        let translator = retail(dialect);
        for dax in PORTABLE {
            let result = translator.translate(dax).unwrap();
            assert!(result.success, "{}: {:?}", dax, result.errors);
            check_expression(&result.sql, dialect)
                .unwrap_or_else(|e| panic!("{} ({}): {}", dax, dialect, e));
        }
    }
}

#[test]
fn test_translated_sql_passes_validator() {
    let translator = retail(Dialect::Postgres);
    let validator = SqlValidator::new().with_dialect(Dialect::Postgres);
    for dax in PORTABLE {
        let sql = translator.translate(dax).unwrap().sql;
        let report = validator.validate_expression(&sql);
        assert!(report.is_valid, "{}: {:?}", sql, report.issues);
        assert!(report.errors().is_empty());
    }
}

#[test]
fn test_calculate_subquery_is_a_full_statement() {
    let sql = retail(Dialect::Postgres)
        .translate("CALCULATE(SUM(Sales[Amount]), Product[Category] = \"Bikes\")")
        .unwrap()
        .sql;
    let statement = sql.trim_start_matches('(').trim_end_matches(')');
    validate_sql(statement, Dialect::Postgres).unwrap();
}

#[test]
fn test_result_json_shape() {
    let result = retail(Dialect::Snowflake)
        .translate("SUM(Sales[Amount])")
        .unwrap();
    let json = serde_json::to_string_pretty(&result.to_value()).unwrap();
    assert_snapshot!(json, @r#"
    {
      "confidence": "HIGH",
      "dax": "SUM(Sales[Amount])",
      "enhanced_by": null,
      "errors": [],
      "patterns_applied": [
        "SUM"
      ],
      "sql": "SUM(sales.amount)",
      "success": true,
      "tables_used": [
        "sales"
      ],
      "warnings": []
    }
    "#);
}

#[test]
fn test_tsql_measure_uses_brackets() {
    let result = retail(Dialect::TSql)
        .translate("[Total Sales] = SUM(Sales[Amount])")
        .unwrap();
    assert_snapshot!(result.sql, @"SUM(sales.amount) AS [Total Sales]");
}

// ============================================================================
// Enhancer
// ============================================================================

struct Rewriter {
    calls: Arc<AtomicUsize>,
}

impl Enhancer for Rewriter {
    fn enhance(&self, request: &EnhanceRequest<'_>) -> Enhancement {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(request.pattern_reference.is_some());
        assert!(request
            .schema_context
            .as_deref()
            .is_some_and(|s| s.contains("dim_product")));
        Enhancement {
            sql: format!("/* reviewed */ {}", request.initial_sql.unwrap_or_default()),
            success: true,
            model_id: "stub-model".to_string(),
            error: None,
        }
    }
}

struct Refuser;

impl Enhancer for Refuser {
    fn enhance(&self, _request: &EnhanceRequest<'_>) -> Enhancement {
        Enhancement::failed("stub-model", "quota exceeded")
    }
}

#[test]
fn test_enhancer_called_only_below_threshold() {
    let calls = Arc::new(AtomicUsize::new(0));
    let translator = retail(Dialect::Snowflake).with_enhancer(
        Rewriter {
            calls: Arc::clone(&calls),
        },
        Confidence::Medium,
    );

    let high = translator.translate("SUM(Sales[Amount])").unwrap();
    assert_eq!(high.enhanced_by, None);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let low = translator.translate("UNKNOWNFUNC(Sales[Amount])").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(low.enhanced_by.as_deref(), Some("stub-model"));
    assert_eq!(low.sql, "/* reviewed */ UNKNOWNFUNC(sales.amount)");
    assert_eq!(low.confidence, Confidence::Low);
}

#[test]
fn test_enhancer_failure_keeps_engine_sql() {
    let translator = retail(Dialect::Snowflake).with_enhancer(Refuser, Confidence::Medium);
    let result = translator.translate("UNKNOWNFUNC(Sales[Amount])").unwrap();
    assert_eq!(result.sql, "UNKNOWNFUNC(sales.amount)");
    assert_eq!(result.enhanced_by, None);
    assert!(result
        .warnings
        .iter()
        .any(|w| w == "Enhancer stub-model failed: quota exceeded"));
}

// ============================================================================
// Logging
// ============================================================================

/// Log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn test_unknown_function_is_logged() {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        retail(Dialect::Snowflake)
            .translate("UNKNOWNFUNC(Sales[Amount])")
            .unwrap()
    });
    assert_eq!(result.confidence, Confidence::Low);

    let logs = captured.text();
    assert!(logs.contains("WARN"), "{}", logs);
    assert!(logs.contains("no pattern for DAX function"), "{}", logs);
    assert!(logs.contains("function=UNKNOWNFUNC"), "{}", logs);
    assert!(logs.contains("translation finished"), "{}", logs);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_translator_shared_across_threads() {
    let translator = retail(Dialect::Snowflake);
    let expected: Vec<String> = PORTABLE
        .iter()
        .map(|dax| translator.translate(dax).unwrap().sql)
        .collect();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for (dax, sql) in PORTABLE.iter().zip(&expected) {
                    assert_eq!(&translator.translate(dax).unwrap().sql, sql);
                }
            });
        }
    });
}
