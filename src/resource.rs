//! Managed resources that initialize themselves from resolved configuration.
//!
//! A resource declares the keys it needs; [`Managed`] reads them from a
//! [`Properties`] store at startup and drives the resource through
//! `Uninitialized -> Ready -> Stopped`.

use crate::config::Properties;
use crate::error::{ConfigError, ConfigResult};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Type a declared key is converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Int,
}

/// A typed setting value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    String(String),
    Int(i64),
}

/// A configuration key a resource requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceKey {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub kind: ValueKind,
}

impl ResourceKey {
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            kind: ValueKind::String,
        }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            kind: ValueKind::Int,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Values read for a resource's declared keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSettings {
    values: HashMap<String, SettingValue>,
}

impl ResourceSettings {
    /// Read each declared key from `props`, falling back to its default.
    ///
    /// A key with neither a stored value nor a default is an error, as is an
    /// int key whose value does not parse.
    pub fn read(keys: &[ResourceKey], props: &Properties) -> ConfigResult<Self> {
        let mut values = HashMap::with_capacity(keys.len());
        for key in keys {
            let raw = props
                .get(&key.name)
                .or(key.default.as_deref())
                .ok_or_else(|| ConfigError::MissingKey(key.name.clone()))?;

            let value = match key.kind {
                ValueKind::String => SettingValue::String(raw.to_string()),
                ValueKind::Int => SettingValue::Int(
                    raw.trim()
                        .parse()
                        .map_err(|e| ConfigError::invalid_value(&key.name, raw, e))?,
                ),
            };
            values.insert(key.name.clone(), value);
        }
        Ok(Self { values })
    }

    pub fn string(&self, name: &str) -> ConfigResult<&str> {
        match self.values.get(name) {
            Some(SettingValue::String(s)) => Ok(s),
            Some(SettingValue::Int(i)) => Err(ConfigError::invalid_value(
                name,
                &i.to_string(),
                "declared as int",
            )),
            None => Err(ConfigError::MissingKey(name.to_string())),
        }
    }

    pub fn int(&self, name: &str) -> ConfigResult<i64> {
        match self.values.get(name) {
            Some(SettingValue::Int(i)) => Ok(*i),
            Some(SettingValue::String(s)) => {
                Err(ConfigError::invalid_value(name, s, "declared as string"))
            }
            None => Err(ConfigError::MissingKey(name.to_string())),
        }
    }
}

/// Something that initializes from configuration and must be shut down.
pub trait Resource {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Keys read from the store before [`Resource::initialize`].
    fn keys(&self) -> Vec<ResourceKey>;

    /// One-time initialization. Failures should be [`ConfigError::ResourceStart`].
    fn initialize(&mut self, settings: &ResourceSettings) -> ConfigResult<()>;

    /// Release underlying resources.
    fn shutdown(&mut self) -> ConfigResult<()>;
}

/// Lifecycle state of a managed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Uninitialized,
    Ready,
    Stopped,
}

/// Drives a [`Resource`] through its lifecycle.
///
/// `start` is idempotent once ready. A failed start leaves the resource
/// uninitialized so the host may retry or give up.
#[derive(Debug)]
pub struct Managed<R: Resource> {
    resource: R,
    state: Lifecycle,
}

impl<R: Resource> Managed<R> {
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            state: Lifecycle::Uninitialized,
        }
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// The resource, only while ready.
    pub fn get(&self) -> Option<&R> {
        (self.state == Lifecycle::Ready).then_some(&self.resource)
    }

    /// Read declared keys from `props` and initialize the resource once.
    pub fn start(&mut self, props: &Properties) -> ConfigResult<()> {
        match self.state {
            Lifecycle::Ready => {
                debug!(resource = %self.resource.name(), "Already started");
                Ok(())
            }
            Lifecycle::Stopped => {
                warn!(resource = %self.resource.name(), "Start requested after stop");
                Err(ConfigError::ResourceStopped(self.resource.name().to_string()))
            }
            Lifecycle::Uninitialized => {
                let settings = ResourceSettings::read(&self.resource.keys(), props)?;
                self.resource.initialize(&settings)?;
                self.state = Lifecycle::Ready;
                info!(resource = %self.resource.name(), "Resource started");
                Ok(())
            }
        }
    }

    /// Shut the resource down. Stopping twice is a no-op.
    pub fn stop(&mut self) -> ConfigResult<()> {
        let previous = std::mem::replace(&mut self.state, Lifecycle::Stopped);
        if previous == Lifecycle::Ready {
            self.resource.shutdown()?;
            info!(resource = %self.resource.name(), "Resource stopped");
        }
        Ok(())
    }
}
