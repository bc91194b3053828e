// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Serialization format of a config file, picked from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// `.yaml`/`.yml` and `.toml` are recognised; anything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Parse config text in the given format without validating it.
pub fn parse_str(contents: &str, format: ConfigFormat) -> Result<RawConfigFile> {
    let config = match format {
        ConfigFormat::Json => serde_json::from_str(contents)?,
        ConfigFormat::Yaml => serde_yaml::from_str(contents)?,
        ConfigFormat::Toml => toml::from_str(contents)?,
    };
    Ok(config)
}

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let format = ConfigFormat::from_path(path);
    debug!(?path, ?format, "parsing config file");

    parse_str(&contents, format)
}

/// Load a configuration file from path and run validation.
///
/// This is the recommended entry point for the rest of the application.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

