//! Application preferences.
//!
//! The network layer never caches preferences: it asks a [`Preferences`]
//! view for each named option every time it builds a request, so changes
//! made through [`Settings::set`] apply to the next attempt.
//!
//! # Example
//!
//! ```ignore
//! use aelf_lectures_core::preferences::{keys, Preferences, Settings};
//!
//! let settings = Settings::load_toml("aelf.toml")?;
//! settings.set(keys::NO_CACHE, true);
//!
//! let region = settings.get_string(keys::REGION, keys::DEFAULT_REGION);
//! ```

use std::collections::HashMap;
use std::path::Path;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Names of the options consulted when building feed requests.
pub mod keys {
    /// Bypass the server-side cache (`x-aelf-nocache` header).
    pub const NO_CACHE: &str = "pref_participate_nocache";
    /// Use the beta API server.
    pub const BETA: &str = "pref_participate_beta";
    /// Full override of the API endpoint. Empty means the built-in endpoint.
    pub const SERVER: &str = "pref_participate_server";
    /// API version sent in the request path.
    pub const API_VERSION: &str = "version";
    /// Liturgical region (calendar variant).
    pub const REGION: &str = "pref_region";

    /// Region used when none is configured.
    pub const DEFAULT_REGION: &str = "romain";
    /// API version used when none is configured.
    pub const DEFAULT_API_VERSION: i64 = -1;
}

/// A read-only view over named options.
pub trait Preferences: Send + Sync {
    /// Get a boolean option, or `default` if unset or of another type.
    fn get_bool(&self, key: &str, default: bool) -> bool;

    /// Get a string option, or `default` if unset or of another type.
    fn get_string(&self, key: &str, default: &str) -> String;

    /// Get an integer option, or `default` if unset or of another type.
    fn get_int(&self, key: &str, default: i64) -> i64;
}

/// A single preference value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreferenceValue {
    /// A boolean flag.
    Bool(bool),
    /// A 64-bit signed integer.
    Integer(i64),
    /// A string.
    String(String),
}

impl PreferenceValue {
    /// Returns this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns this value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns this value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for PreferenceValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for PreferenceValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for PreferenceValue {
    fn from(v: i32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<&str> for PreferenceValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for PreferenceValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// Thread-safe in-memory preference store.
///
/// Keys are flat strings. Values can be replaced at any time from any
/// thread; readers always see the latest value.
#[derive(Debug, Default)]
pub struct Settings {
    data: RwLock<HashMap<String, PreferenceValue>>,
}

impl Settings {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from existing values.
    pub fn from_data(data: HashMap<String, PreferenceValue>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Set a value, replacing any previous one.
    pub fn set<V: Into<PreferenceValue>>(&self, key: &str, value: V) {
        self.data.write().insert(key.to_string(), value.into());
    }

    /// Remove a value. Returns the previous value, if any.
    pub fn remove(&self, key: &str) -> Option<PreferenceValue> {
        self.data.write().remove(key)
    }

    /// Get the raw value stored under `key`.
    pub fn get_raw(&self, key: &str) -> Option<PreferenceValue> {
        self.data.read().get(key).cloned()
    }

    /// Returns true if a value exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Parse preferences from a TOML document with flat scalar keys.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = content
            .parse()
            .map_err(|e: toml::de::Error| ConfigError::Syntax(e.to_string()))?;

        let mut data = HashMap::with_capacity(table.len());
        for (key, value) in table {
            let value = match value {
                toml::Value::Boolean(b) => PreferenceValue::Bool(b),
                toml::Value::Integer(i) => PreferenceValue::Integer(i),
                toml::Value::String(s) => PreferenceValue::String(s),
                other => {
                    return Err(ConfigError::UnsupportedValue {
                        key,
                        kind: other.type_str().to_string(),
                    });
                }
            };
            data.insert(key, value);
        }
        Ok(Self::from_data(data))
    }

    /// Load preferences from a TOML file.
    pub fn load_toml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&content)?;
        tracing::debug!(
            target: "aelf_lectures_core::preferences",
            "Loaded {} preferences from {}",
            settings.len(),
            path.display()
        );
        Ok(settings)
    }
}

impl Preferences for Settings {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.data
            .read()
            .get(key)
            .and_then(PreferenceValue::as_bool)
            .unwrap_or(default)
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        self.data
            .read()
            .get(key)
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| default.to_string())
    }

    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.data
            .read()
            .get(key)
            .and_then(PreferenceValue::as_integer)
            .unwrap_or(default)
    }
}
