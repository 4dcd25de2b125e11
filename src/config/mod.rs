//! Configuration module for daxsql.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, Settings, SettingsError, TranslatorSettings, ValidatorSettings,
};
