//! Active environment and override directory resolution.
//!
//! Environment: explicit argument, then `--env`, then `$ENV`, then `local`.
//! Override directory: `--conf`, then `$CONF`, otherwise none.

use super::flags;
use std::path::PathBuf;

/// Environment used when nothing else is set.
pub const DEFAULT_ENV: &str = "local";

/// Process environment variable naming the active environment.
pub const ENV_VAR: &str = "ENV";

/// Process environment variable naming the override directory.
pub const CONF_VAR: &str = "CONF";

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Resolve the active environment name. Never empty.
pub fn resolve_environment(explicit: Option<&str>) -> String {
    let from_var = std::env::var(ENV_VAR).ok();
    environment_from(explicit, flags::flags().env.as_deref(), from_var.as_deref())
}

/// Pick the environment from already-gathered sources, first non-empty wins.
pub fn environment_from(explicit: Option<&str>, flag: Option<&str>, var: Option<&str>) -> String {
    non_empty(explicit)
        .or_else(|| non_empty(flag))
        .or_else(|| non_empty(var))
        .unwrap_or(DEFAULT_ENV)
        .to_string()
}

/// Resolve the override directory, if one was supplied.
pub fn resolve_override_dir() -> Option<PathBuf> {
    let from_var = std::env::var(CONF_VAR).ok();
    override_dir_from(flags::flags().conf.as_deref(), from_var.as_deref())
}

/// Pick the override directory from already-gathered sources.
///
/// A leading `~` is expanded to the home directory when one is known.
pub fn override_dir_from(flag: Option<&str>, var: Option<&str>) -> Option<PathBuf> {
    non_empty(flag).or_else(|| non_empty(var)).map(expand_home)
}

fn expand_home(dir: &str) -> PathBuf {
    let rest = match dir.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(dir),
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(dir),
    }
}
