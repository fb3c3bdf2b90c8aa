//! Configuration carried by the host page
//!
//! The host embeds a single JSON blob in a `data-config` attribute. It is read
//! once at startup and shared immutably for the rest of the session.

use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Id of the element carrying the configuration
pub const CONFIG_ELEMENT_ID: &str = "pdf-preview-config";

/// Attribute on the carrier element holding the JSON payload
pub const CONFIG_ATTRIBUTE: &str = "data-config";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not load configuration: no #pdf-preview-config element with a data-config attribute")]
    Missing,

    #[error("Malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Session configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Document locator handed to the engine
    pub path: String,
    pub c_map_url: String,
    pub standard_font_data_url: String,
    #[serde(default)]
    pub defaults: Defaults,
    /// Tracing filter directive, e.g. `info` or `pdf_preview=debug`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Display preferences applied after the first load
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Defaults {
    pub cursor: String,
    pub scale: String,
    pub scroll_mode: String,
    pub spread_mode: String,
    pub sidebar: bool,
    pub lookup_url: Option<String>,
    /// Extra headers sent with every lookup request
    pub lookup_headers: BTreeMap<String, String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            cursor: "select".to_string(),
            scale: "auto".to_string(),
            scroll_mode: String::new(),
            spread_mode: String::new(),
            sidebar: false,
            lookup_url: None,
            lookup_headers: BTreeMap::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where the raw configuration payload comes from
pub trait ConfigSource {
    /// The raw payload, or `None` when the carrier is absent
    fn raw_config(&self) -> Option<String>;
}

impl ConfigSource for Option<&str> {
    fn raw_config(&self) -> Option<String> {
        self.map(str::to_string)
    }
}

impl Configuration {
    /// Read and parse the configuration from `source`
    pub fn load(source: &impl ConfigSource) -> Result<Self, ConfigError> {
        let raw = source.raw_config().ok_or(ConfigError::Missing)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}
