//! Structured error types for configuration resolution.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Search path errors
    NoSearchPath,

    // Load errors
    FileParse,

    // Expansion errors
    UnresolvedVariable,
    CircularReference,
    MalformedExpression,

    // Lookup errors
    MissingKey,
    InvalidValue,

    // Resource lifecycle errors
    ResourceStart,
    ResourceStopped,
}

/// Errors produced while resolving or reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No directory candidates could be determined at all.
    #[error("cannot read config path")]
    NoSearchPath,

    /// An existing candidate file could not be read, decoded or parsed.
    #[error("failed to parse {}{}: {reason}", .path.display(), .line.map(|l| format!(":{}", l)).unwrap_or_default())]
    FileParse {
        path: PathBuf,
        line: Option<usize>,
        reason: String,
    },

    /// A value references a key that is absent from the store.
    #[error("unresolved variable ${{{missing}}} in value of '{key}'")]
    UnresolvedVariable { key: String, missing: String },

    /// Expansion of a value looped back onto a key already being expanded.
    #[error("circular reference while expanding '{key}': {}", .chain.join(" -> "))]
    CircularReference { key: String, chain: Vec<String> },

    /// A value contains an unterminated or empty `${...}` placeholder.
    #[error("malformed expression in value of '{key}': {value}")]
    MalformedExpression { key: String, value: String },

    /// A required key is absent.
    #[error("missing required key '{0}'")]
    MissingKey(String),

    /// A value could not be converted to the requested type.
    #[error("invalid value for '{key}': '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// A managed resource failed to initialize.
    #[error("resource '{resource}' failed to start: {reason}")]
    ResourceStart { resource: String, reason: String },

    /// A managed resource was used after shutdown.
    #[error("resource '{0}' has been stopped")]
    ResourceStopped(String),
}

impl ConfigError {
    /// Stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::NoSearchPath => ErrorCode::NoSearchPath,
            ConfigError::FileParse { .. } => ErrorCode::FileParse,
            ConfigError::UnresolvedVariable { .. } => ErrorCode::UnresolvedVariable,
            ConfigError::CircularReference { .. } => ErrorCode::CircularReference,
            ConfigError::MalformedExpression { .. } => ErrorCode::MalformedExpression,
            ConfigError::MissingKey(_) => ErrorCode::MissingKey,
            ConfigError::InvalidValue { .. } => ErrorCode::InvalidValue,
            ConfigError::ResourceStart { .. } => ErrorCode::ResourceStart,
            ConfigError::ResourceStopped(_) => ErrorCode::ResourceStopped,
        }
    }

    // Convenience constructors

    pub fn parse(path: impl Into<PathBuf>, line: Option<usize>, reason: impl Into<String>) -> Self {
        ConfigError::FileParse {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    pub fn invalid_value(key: &str, value: &str, reason: impl std::fmt::Display) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn resource_start(resource: &str, reason: impl std::fmt::Display) -> Self {
        ConfigError::ResourceStart {
            resource: resource.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_search_path_message() {
        assert_eq!(ConfigError::NoSearchPath.to_string(), "cannot read config path");
    }

    #[test]
    fn test_parse_error_includes_line() {
        let err = ConfigError::parse("config/prod.properties", Some(7), "bad escape");
        assert_eq!(
            err.to_string(),
            "failed to parse config/prod.properties:7: bad escape"
        );
        assert_eq!(err.code(), ErrorCode::FileParse);
    }

    #[test]
    fn test_unresolved_variable_message() {
        let err = ConfigError::UnresolvedVariable {
            key: "port".into(),
            missing: "default.port".into(),
        };
        assert_eq!(
            err.to_string(),
            "unresolved variable ${default.port} in value of 'port'"
        );
    }

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::UnresolvedVariable).unwrap();
        assert_eq!(json, "\"UNRESOLVED_VARIABLE\"");
    }
}
