//! Configuration stores for filter slots.
//!
//! The evaluator never caches configuration: every evaluation reads the keys
//! it needs through a [`ConfigStore`]. Keys are namespaced per slot
//! (`filter1.enabled`, `filter1.ids`, ...) plus the global `debug` flag.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::record::{coerce_int, coerce_string};

/// Errors raised while loading or reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config layout: {0}")]
    Layout(String),

    #[error("config backend unavailable: {0}")]
    Unavailable(String),
}

/// Source of live configuration values.
///
/// `Ok(None)` means the key is not set; callers fall back to documented
/// defaults. An `Err` is treated the same way by the evaluator.
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<JsonValue>, ConfigError>;
}

impl<T: ConfigStore + ?Sized> ConfigStore for &T {
    fn get(&self, key: &str) -> Result<Option<JsonValue>, ConfigError> {
        (**self).get(key)
    }
}

impl<T: ConfigStore + ?Sized> ConfigStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<JsonValue>, ConfigError> {
        (**self).get(key)
    }
}

/// Read a key, logging and swallowing backend errors.
pub fn read_value(store: &dyn ConfigStore, key: &str) -> Option<JsonValue> {
    match store.get(key) {
        Ok(value) => value.filter(|v| !v.is_null()),
        Err(err) => {
            tracing::warn!("Config read failed for '{}', using default: {}", key, err);
            None
        }
    }
}

/// Read a string key. Scalars are rendered; anything else yields `default`.
pub fn read_string(store: &dyn ConfigStore, key: &str, default: &str) -> String {
    read_value(store, key)
        .and_then(|v| coerce_string(&v))
        .unwrap_or_else(|| default.to_string())
}

/// Read an on/off flag. The flag is on only when the value coerces to `1`.
pub fn read_flag(store: &dyn ConfigStore, key: &str) -> bool {
    read_value(store, key)
        .and_then(|v| coerce_int(&v))
        .is_some_and(|v| v == 1)
}

/// In-memory configuration, optionally loaded from YAML.
///
/// Nested mappings are flattened with `.`, so these two documents are
/// equivalent:
///
/// ```yaml
/// filter1:
///   enabled: 1
///   ids: "10, 20"
/// ```
///
/// ```yaml
/// filter1.enabled: 1
/// filter1.ids: "10, 20"
/// ```
///
/// The legacy underscore layout (`filter1_enabled`) is accepted as a
/// fallback on lookup.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    values: IndexMap<String, JsonValue>,
}

impl StaticConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    /// Load configuration from a YAML file.
    ///
    /// # Example
    /// ```ignore
    /// use order_filter::StaticConfig;
    ///
    /// let config = StaticConfig::load_from_file("filters.yaml")?;
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_yaml_str(&contents)
    }

    /// Parse configuration from a YAML document. An empty document is an
    /// empty configuration.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(contents)?;
        let json: JsonValue = serde_yaml::from_value(yaml)?;

        let mut config = Self::new();
        match json {
            JsonValue::Null => {}
            JsonValue::Object(map) => {
                for (key, value) in map {
                    config.flatten_into(key, value);
                }
            }
            other => {
                return Err(ConfigError::Layout(format!(
                    "expected a mapping at the top level, got {}",
                    json_kind(&other)
                )))
            }
        }

        Ok(config)
    }

    fn flatten_into(&mut self, prefix: String, value: JsonValue) {
        match value {
            JsonValue::Object(map) => {
                for (key, nested) in map {
                    self.flatten_into(format!("{}.{}", prefix, key), nested);
                }
            }
            other => {
                self.values.insert(prefix, other);
            }
        }
    }
}

impl ConfigStore for StaticConfig {
    fn get(&self, key: &str) -> Result<Option<JsonValue>, ConfigError> {
        if let Some(value) = self.values.get(key) {
            return Ok(Some(value.clone()));
        }

        let legacy = key.replacen('.', "_", 1);
        Ok(self.values.get(&legacy).cloned())
    }
}

/// Configuration read from environment variables.
///
/// Key `filter1.enabled` maps to `{prefix}FILTER1_ENABLED`. Values are
/// passed through as strings.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    prefix: String,
}

impl EnvConfig {
    pub const DEFAULT_PREFIX: &'static str = "ORDER_FILTER_";

    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Environment variable name for a config key.
    pub fn var_name(&self, key: &str) -> String {
        let suffix: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{}{}", self.prefix, suffix)
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

impl ConfigStore for EnvConfig {
    fn get(&self, key: &str) -> Result<Option<JsonValue>, ConfigError> {
        let name = self.var_name(key);
        match std::env::var(&name) {
            Ok(value) => Ok(Some(JsonValue::String(value))),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::Unavailable(format!(
                "environment variable {} is not valid unicode",
                name
            ))),
        }
    }
}

/// Stack of stores; the first layer that has a key wins.
///
/// A failing layer is logged and skipped so lower layers can still answer.
#[derive(Default)]
pub struct LayeredConfig {
    layers: Vec<Box<dyn ConfigStore>>,
}

impl LayeredConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer below the existing ones.
    pub fn with_layer(mut self, layer: impl ConfigStore + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

impl ConfigStore for LayeredConfig {
    fn get(&self, key: &str) -> Result<Option<JsonValue>, ConfigError> {
        for layer in &self.layers {
            match layer.get(key) {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!("Config layer failed for '{}': {}", key, err);
                }
            }
        }
        Ok(None)
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a sequence",
        JsonValue::Object(_) => "a mapping",
    }
}
