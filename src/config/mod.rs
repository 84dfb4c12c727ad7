//! Layered `.properties` configuration.
//!
//! Resolution merges up to six files, lowest priority first:
//! 1. `<exe dir>/config/default.properties`, `<exe dir>/config/<env>.properties`
//! 2. `<cwd>/config/default.properties`, `<cwd>/config/<env>.properties`
//! 3. `<override>/default.properties`, `<override>/<env>.properties`
//!
//! Later files overwrite earlier keys. After merging, every `${key}` reference
//! is expanded against the merged store.
//!
//! ## Environment Variables
//! - `ENV` - Active environment when neither an explicit value nor `--env` is given
//! - `CONF` - Override directory when `--conf` is not given

mod env;
mod expand;
pub mod flags;
mod loader;
mod parser;
mod paths;
mod properties;

pub use env::{
    CONF_VAR, DEFAULT_ENV, ENV_VAR, environment_from, override_dir_from, resolve_environment,
    resolve_override_dir,
};
pub use expand::expand_all;
pub use flags::FlagOverrides;
pub use loader::{ConfigLoader, load_files};
pub use parser::ParseError;
pub use paths::{
    CONFIG_DIR, DEFAULT_FILE_STEM, FILE_EXTENSION, Layer, LayerRole, SearchPaths, SearchRoot,
    build_candidate_files,
};
pub use properties::Properties;

use crate::error::ConfigResult;

/// Resolve the process configuration.
///
/// `explicit_env` takes precedence over `--env`, `$ENV` and the `local`
/// default. Returns either a fully expanded store or the first error; a
/// partially loaded store is never returned.
pub fn resolve(explicit_env: Option<&str>) -> ConfigResult<Properties> {
    ConfigLoader::load(explicit_env).map(ConfigLoader::into_properties)
}

#[cfg(test)]
pub(crate) fn env_test_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
