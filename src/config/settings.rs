//! TOML-based configuration for daxsql.
//!
//! Supports a config file (daxsql.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [translator]
//! dialect = "snowflake"
//! enhance_below = "medium"
//! schema_path = "${DAXSQL_SCHEMA}"
//!
//! [validator]
//! execute = false
//! row_limit = 1
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::schema::{SchemaContext, SchemaError};
use crate::sql::Dialect;
use crate::translate::{Confidence, Enhancer, Translator};
use crate::validate::{SqlValidator, ValidateOptions};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Failed to load schema from {path}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub translator: TranslatorSettings,
    pub validator: ValidatorSettings,
}

/// `[translator]` section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslatorSettings {
    /// Target SQL dialect.
    pub dialect: Dialect,

    /// Hand translations below this confidence to the enhancer, if one is
    /// attached.
    pub enhance_below: Confidence,

    /// SchemaContext JSON file (supports ${ENV_VAR} expansion).
    pub schema_path: Option<String>,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            enhance_below: Confidence::Medium,
            schema_path: None,
        }
    }
}

/// `[validator]` section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidatorSettings {
    /// Parse generated SQL with sqlparser.
    pub syntax_check: bool,

    /// Run the execution test when a backend is attached.
    pub execute: bool,

    /// Rows fetched by the execution test.
    pub row_limit: u64,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            syntax_check: true,
            execute: false,
            row_limit: 1,
        }
    }
}

impl ValidatorSettings {
    pub fn options(&self) -> ValidateOptions {
        ValidateOptions {
            syntax_check: self.syntax_check,
            execute: self.execute,
            row_limit: self.row_limit,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `DAXSQL_CONFIG`
    /// 2. `./daxsql.toml`
    ///
    /// Falls back to defaults when neither exists.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("DAXSQL_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("daxsql.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        Ok(Settings::default())
    }

    /// Read the configured schema file, if any.
    pub fn load_schema(&self) -> Result<Option<SchemaContext>, SettingsError> {
        let Some(raw) = &self.translator.schema_path else {
            return Ok(None);
        };
        let path = PathBuf::from(expand_env_vars(raw)?);
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path));
        }

        let json = fs::read_to_string(&path)?;
        SchemaContext::from_json(&json)
            .map(Some)
            .map_err(|source| SettingsError::Schema { path, source })
    }

    /// A translator with the configured dialect, schema and enhancement
    /// threshold.
    pub fn translator(&self) -> Result<Translator, SettingsError> {
        let mut translator = Translator::new()
            .with_dialect(self.translator.dialect)
            .with_enhance_below(self.translator.enhance_below);
        if let Some(context) = self.load_schema()? {
            translator = translator.with_context(context);
        }
        Ok(translator)
    }

    /// [`translator`](Self::translator) with `enhancer` consulted below the
    /// configured threshold.
    pub fn translator_with_enhancer(
        &self,
        enhancer: impl Enhancer + 'static,
    ) -> Result<Translator, SettingsError> {
        Ok(self
            .translator()?
            .with_enhancer(enhancer, self.translator.enhance_below))
    }

    pub fn validator(&self) -> SqlValidator {
        SqlValidator::new().with_dialect(self.translator.dialect)
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
