//! Configuration management for the guarded file system
//!
//! Loaded from a TOML file with `RAX_GUARD_*` environment overrides, e.g.
//! `RAX_GUARD_SUPPRESS_CONTENT_SNIFFING=true`.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

use crate::storage::MimeTable;

const CONFIG_PATHS: [&str; 2] = [
    "rax-guarded-fs/config", // packaged layout
    "config",                // local development: ./config.toml
];

/// Guarded file system configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GuardConfig {
    /// Directory served through the guard
    pub root: String,

    /// Report extension-derived content types instead of letting clients sniff
    #[serde(default)]
    pub suppress_content_sniffing: bool,

    /// Extra extension to MIME type registrations, keyed without the dot
    #[serde(default)]
    pub mime_types: HashMap<String, String>,
}

impl GuardConfig {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            suppress_content_sniffing: false,
            mime_types: HashMap::new(),
        }
    }

    /// Load configuration from the first config file found in the default locations
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut last_error = None;

        for config_path in CONFIG_PATHS {
            match Self::load_from(config_path) {
                Ok(config) => return Ok(config),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            config::ConfigError::Message(format!("No config file found in {CONFIG_PATHS:?}"))
        }))
    }

    /// Load configuration from one file with environment overrides
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("RAX_GUARD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: GuardConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.root.trim().is_empty() {
            return Err(config::ConfigError::Message("root cannot be empty".into()));
        }

        for (extension, mime) in &self.mime_types {
            if extension.trim_start_matches('.').is_empty() {
                return Err(config::ConfigError::Message(
                    "mime_types keys cannot be empty".into(),
                ));
            }
            if mime.trim().is_empty() {
                return Err(config::ConfigError::Message(format!(
                    "mime type for extension '{extension}' cannot be empty"
                )));
            }
        }

        Ok(())
    }

    /// Built-in MIME table extended with the configured registrations
    pub fn mime_table(&self) -> MimeTable {
        let mut table = MimeTable::new();
        for (extension, mime) in &self.mime_types {
            table.insert(extension, mime);
        }
        table
    }
}
