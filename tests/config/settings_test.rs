use std::fs;
use std::path::PathBuf;

use daxsql::config::{Settings, SettingsError};
use daxsql::schema::sample_retail_context;
use daxsql::sql::Dialect;
use daxsql::translate::{Confidence, EnhanceRequest, Enhancement, Enhancer};

/// Fresh scratch directory for one test.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("daxsql-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_file_settings_build_translator_with_schema() {
    let dir = scratch("full");
    let schema = dir.join("retail.json");
    fs::write(&schema, sample_retail_context().to_json().unwrap()).unwrap();

    let config = dir.join("daxsql.toml");
    fs::write(
        &config,
        format!(
            r#"
[translator]
dialect = "postgres"
enhance_below = "low"
schema_path = "{}"

[validator]
execute = true
row_limit = 10
"#,
            schema.display()
        ),
    )
    .unwrap();

    let settings = Settings::from_file(&config).unwrap();
    assert_eq!(settings.translator.dialect, Dialect::Postgres);
    assert_eq!(settings.translator.enhance_below, Confidence::Low);
    assert!(settings.validator.syntax_check);
    assert_eq!(settings.validator.options().row_limit, 10);

    let translator = settings.translator().unwrap();
    assert_eq!(translator.dialect(), Dialect::Postgres);
    let result = translator
        .translate("CALCULATE(SUM(Sales[Amount]), Store[Region] = \"West\")")
        .unwrap();
    assert!(result.sql.contains("JOIN dim_store"));

    assert_eq!(settings.validator().dialect(), Dialect::Postgres);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_schema_path_expands_env_vars() {
    let dir = scratch("env");
    fs::write(dir.join("schema.json"), sample_retail_context().to_json().unwrap()).unwrap();
    std::env::set_var("DAXSQL_SCHEMA_DIR", &dir);

    let settings = Settings::from_toml_str(
        r#"
[translator]
schema_path = "${DAXSQL_SCHEMA_DIR}/schema.json"
"#,
    )
    .unwrap();
    let ctx = settings.load_schema().unwrap().unwrap();
    assert_eq!(ctx.tables().len(), 5);

    std::env::remove_var("DAXSQL_SCHEMA_DIR");
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_env_var_in_schema_path() {
    let settings = Settings::from_toml_str(
        r#"
[translator]
schema_path = "$DAXSQL_UNSET_FOR_TEST/schema.json"
"#,
    )
    .unwrap();
    let err = settings.translator().unwrap_err();
    assert!(matches!(err, SettingsError::MissingEnvVar(ref name) if name == "DAXSQL_UNSET_FOR_TEST"));
}

#[test]
fn test_missing_schema_file() {
    let settings = Settings::from_toml_str(
        r#"
[translator]
schema_path = "/nonexistent/daxsql/schema.json"
"#,
    )
    .unwrap();
    assert!(matches!(
        settings.load_schema(),
        Err(SettingsError::FileNotFound(_))
    ));
}

#[test]
fn test_invalid_schema_file() {
    let dir = scratch("bad");
    let schema = dir.join("schema.json");
    fs::write(&schema, "{ \"tables\": 3 }").unwrap();

    let settings = Settings::from_toml_str(&format!(
        "[translator]\nschema_path = \"{}\"\n",
        schema.display()
    ))
    .unwrap();
    let err = settings.load_schema().unwrap_err();
    assert!(matches!(err, SettingsError::Schema { .. }));
    assert!(err.to_string().starts_with("Failed to load schema from"));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_config_file() {
    let err = Settings::from_file("/nonexistent/daxsql.toml").unwrap_err();
    assert!(matches!(err, SettingsError::FileNotFound(_)));
}

#[test]
fn test_no_schema_means_no_context() {
    let settings = Settings::default();
    assert!(settings.load_schema().unwrap().is_none());
    let translator = settings.translator().unwrap();
    assert!(translator.context().is_none());
    assert_eq!(translator.dialect(), Dialect::Snowflake);
}

struct Reviewer;

impl Enhancer for Reviewer {
    fn enhance(&self, request: &EnhanceRequest<'_>) -> Enhancement {
        Enhancement {
            sql: format!("/* reviewed */ {}", request.initial_sql.unwrap_or_default()),
            success: true,
            model_id: "stub-model".to_string(),
            error: None,
        }
    }
}

#[test]
fn test_configured_threshold_reaches_translator() {
    let settings = Settings::from_toml_str(
        r#"
[translator]
enhance_below = "high"
"#,
    )
    .unwrap();
    assert_eq!(settings.translator().unwrap().enhance_below(), Confidence::High);

    // Without a schema the guessed SUM is MEDIUM, which is below HIGH.
    let translator = settings.translator_with_enhancer(Reviewer).unwrap();
    let result = translator.translate("SUM(Sales[Amount])").unwrap();
    assert_eq!(result.confidence, Confidence::Medium);
    assert_eq!(result.enhanced_by.as_deref(), Some("stub-model"));
    assert_eq!(result.sql, "/* reviewed */ SUM(sales.amount)");

    let default_threshold = Settings::default().translator_with_enhancer(Reviewer).unwrap();
    let result = default_threshold.translate("SUM(Sales[Amount])").unwrap();
    assert_eq!(result.enhanced_by, None);
}
