//! Ordered string-to-string property store with `${key}` expansion.

use super::parser;
use crate::error::{ConfigError, ConfigResult};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::fmt::Display;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// An ordered set of unique keys mapped to string values.
///
/// Insertion order is kept; overwriting an existing key replaces its value in
/// place. Values may contain `${other.key}` placeholders. [`Properties::set`]
/// expands them against the current contents before storing,
/// [`Properties::set_raw`] stores text verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    keys: Vec<String>,
    values: HashMap<String, String>,
}

impl Properties {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse properties text into a new store, without expansion.
    ///
    /// `origin` is only used for error reporting.
    pub fn parse(source: &str, origin: &Path) -> ConfigResult<Self> {
        let mut props = Self::new();
        props.load_str(source, origin)?;
        Ok(props)
    }

    /// Parse properties text and merge it over the current contents.
    ///
    /// Values are stored raw; later duplicates overwrite earlier ones.
    pub fn load_str(&mut self, source: &str, origin: &Path) -> ConfigResult<()> {
        let entries = parser::parse(source)
            .map_err(|e| ConfigError::parse(origin, Some(e.line), e.reason))?;
        for (key, value) in entries {
            self.set_raw(key, value);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys
            .iter()
            .map(move |k| (k.as_str(), self.values[k].as_str()))
    }

    /// Get the stored value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Get the stored value, or `default` when the key is absent.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    /// Get a value that must be present.
    pub fn require(&self, key: &str) -> ConfigResult<&str> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    /// Parse a value with [`FromStr`]. Absent keys yield `Ok(None)`.
    pub fn get_parsed<T>(&self, key: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::invalid_value(key, raw, e)),
        }
    }

    pub fn get_int(&self, key: &str) -> ConfigResult<Option<i64>> {
        self.get_parsed(key)
    }

    /// Boolean lookup accepting `true/false`, `yes/no`, `y/n`, `on/off`, `1/0`.
    pub fn get_bool(&self, key: &str) -> ConfigResult<Option<bool>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "on" | "1" => Ok(Some(true)),
            "false" | "no" | "n" | "off" | "0" => Ok(Some(false)),
            _ => Err(ConfigError::invalid_value(key, raw, "expected a boolean")),
        }
    }

    /// Store a value verbatim, returning the previous value.
    pub fn set_raw(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.values.get_mut(&key) {
            Some(existing) => Some(std::mem::replace(existing, value)),
            None => {
                self.keys.push(key.clone());
                self.values.insert(key, value);
                None
            }
        }
    }

    /// Expand `${...}` placeholders in `value` against the current contents and
    /// store the result under `key`, returning the previous value.
    ///
    /// Fails without modifying the store if a referenced key is missing, a
    /// reference chain loops, or a placeholder is malformed.
    pub fn set(&mut self, key: impl Into<String>, value: &str) -> ConfigResult<Option<String>> {
        let key = key.into();
        let expanded = self.expand(&key, value)?;
        Ok(self.set_raw(key, expanded))
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let value = self.values.remove(key)?;
        self.keys.retain(|k| k != key);
        Some(value)
    }

    /// Copy every entry of `other` over this store; `other` wins on conflicts.
    pub fn merge(&mut self, other: &Properties) {
        for (key, value) in other.iter() {
            self.set_raw(key, value);
        }
    }

    /// New store holding only the keys that start with `prefix`.
    pub fn filter_prefix(&self, prefix: &str) -> Properties {
        let mut filtered = Properties::new();
        for (key, value) in self.iter().filter(|(k, _)| k.starts_with(prefix)) {
            filtered.set_raw(key, value);
        }
        filtered
    }

    /// Expand all placeholders in `value` as if it were stored under `key`.
    pub fn expand(&self, key: &str, value: &str) -> ConfigResult<String> {
        let mut chain = vec![key.to_string()];
        self.expand_chain(value, &mut chain)
    }

    fn expand_chain(&self, value: &str, chain: &mut Vec<String>) -> ConfigResult<String> {
        let mut out = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let current = chain.last().cloned().unwrap_or_default();

            let name = match after.find('}') {
                Some(end) if end > 0 => &after[..end],
                _ => {
                    return Err(ConfigError::MalformedExpression {
                        key: current,
                        value: value.to_string(),
                    });
                }
            };

            if chain.iter().any(|k| k == name) {
                let mut looped = chain.clone();
                looped.push(name.to_string());
                return Err(ConfigError::CircularReference {
                    key: chain[0].clone(),
                    chain: looped,
                });
            }

            let referenced = self
                .values
                .get(name)
                .ok_or_else(|| ConfigError::UnresolvedVariable {
                    key: current,
                    missing: name.to_string(),
                })?;

            chain.push(name.to_string());
            let expanded = self.expand_chain(referenced, chain)?;
            chain.pop();

            out.push_str(&expanded);
            rest = &after[name.len() + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Write the store in `.properties` format.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for (key, value) in self.iter() {
            writeln!(
                writer,
                "{} = {}",
                parser::escape(key, true),
                parser::escape(value, false)
            )?;
        }
        Ok(())
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Properties::new();
        for (key, value) in iter {
            props.set_raw(key, value);
        }
        props
    }
}
