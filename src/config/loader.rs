//! Layered loader: reads candidate files in order and merges them.
//!
//! Missing files are skipped. Unreadable, non-UTF-8 or malformed files abort
//! the whole load. Keys from later layers overwrite earlier ones.

use super::env::{resolve_environment, resolve_override_dir};
use super::expand::expand_all;
use super::paths::{Layer, SearchPaths};
use super::properties::Properties;
use crate::error::{ConfigError, ConfigResult};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// Load and merge `paths` in order, without the expansion pass.
pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> ConfigResult<Properties> {
    let mut props = Properties::new();
    for path in paths {
        load_file_into(&mut props, path.as_ref())?;
    }
    Ok(props)
}

/// Merge one file into `props`. Returns `false` if the file does not exist.
fn load_file_into(props: &mut Properties, path: &Path) -> ConfigResult<bool> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Config layer not present, skipping");
            return Ok(false);
        }
        Err(e) => return Err(ConfigError::parse(path, None, e.to_string())),
    };

    let text = String::from_utf8(bytes).map_err(|e| {
        ConfigError::parse(
            path,
            None,
            format!("invalid UTF-8 at byte {}", e.utf8_error().valid_up_to()),
        )
    })?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    props.load_str(text, path)?;
    debug!(path = %path.display(), keys = props.len(), "Loaded config layer");
    Ok(true)
}

/// Resolves, loads and expands configuration for one environment.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Directories that were searched
    pub paths: SearchPaths,
    /// Active environment name
    environment: String,
    /// Every candidate layer, lowest priority first
    candidates: Vec<Layer>,
    /// Candidate layers that existed and were merged
    loaded: Vec<Layer>,
    /// Fully expanded properties
    properties: Properties,
}

impl ConfigLoader {
    /// Resolve the environment and override directory from the process and
    /// load every layer.
    pub fn load(explicit_env: Option<&str>) -> ConfigResult<Self> {
        let environment = resolve_environment(explicit_env);
        let paths = SearchPaths::discover(resolve_override_dir());
        Self::load_with_paths(&environment, paths)
    }

    /// Load every layer for `environment` under explicit search paths.
    pub fn load_with_paths(environment: &str, paths: SearchPaths) -> ConfigResult<Self> {
        let candidates = paths.candidate_files(environment)?;

        let mut properties = Properties::new();
        let mut loaded = Vec::new();
        for layer in &candidates {
            if load_file_into(&mut properties, &layer.path)? {
                loaded.push(layer.clone());
            }
        }

        expand_all(&mut properties)?;

        info!(
            env = %environment,
            layers = loaded.len(),
            keys = properties.len(),
            "Configuration resolved"
        );

        Ok(Self {
            paths,
            environment: environment.to_string(),
            candidates,
            loaded,
            properties,
        })
    }

    /// Get the active environment name.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Get every candidate layer, including missing ones.
    pub fn candidates(&self) -> &[Layer] {
        &self.candidates
    }

    /// Get the layers that were actually merged.
    pub fn loaded_layers(&self) -> &[Layer] {
        &self.loaded
    }

    /// Get the resolved properties.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Consume the loader and return the resolved properties.
    pub fn into_properties(self) -> Properties {
        self.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::{LayerRole, SearchRoot};
    use crate::error::ErrorCode;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_files_are_skipped() {
        let temp = TempDir::new().unwrap();
        let present = temp.path().join("present.properties");
        fs::write(&present, "a=1\nb=2\n").unwrap();

        let with_gaps = load_files(&[
            temp.path().join("absent-1.properties"),
            present.clone(),
            temp.path().join("absent-2.properties"),
        ])
        .unwrap();
        let only_present = load_files(&[present]).unwrap();

        assert_eq!(with_gaps, only_present);
    }

    #[test]
    fn test_later_file_wins() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first.properties");
        let second = temp.path().join("second.properties");
        fs::write(&first, "shared=first\nonly.first=1\n").unwrap();
        fs::write(&second, "shared=second\n").unwrap();

        let props = load_files(&[first, second]).unwrap();
        assert_eq!(props.get("shared"), Some("second"));
        assert_eq!(props.get("only.first"), Some("1"));
    }

    #[test]
    fn test_invalid_utf8_is_fatal() {
        let temp = TempDir::new().unwrap();
        let bad = temp.path().join("bad.properties");
        fs::write(&bad, b"key=\xff\xfe\n").unwrap();

        let err = load_files(&[bad]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::FileParse);
        assert!(err.to_string().contains("invalid UTF-8"));
    }

    #[test]
    fn test_malformed_file_reports_path_and_line() {
        let temp = TempDir::new().unwrap();
        let bad = temp.path().join("bad.properties");
        fs::write(&bad, "ok=1\n\nbroken=\\uZZZZ\n").unwrap();

        match load_files(&[bad.clone()]).unwrap_err() {
            ConfigError::FileParse { path, line, .. } => {
                assert_eq!(path, bad);
                assert_eq!(line, Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_directory_in_place_of_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("default.properties");
        fs::create_dir_all(&dir).unwrap();

        assert!(load_files(&[dir]).is_err());
    }

    #[test]
    fn test_bom_is_stripped() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("bom.properties");
        fs::write(&file, "\u{feff}first=1\n").unwrap();

        let props = load_files(&[file]).unwrap();
        assert_eq!(props.get("first"), Some("1"));
    }

    #[test]
    fn test_loader_records_loaded_layers() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("default.properties"), "name=app\n").unwrap();

        let paths = SearchPaths::with_dirs(None, Some(temp.path().to_path_buf()), None);
        let loader = ConfigLoader::load_with_paths("qa", paths).unwrap();

        assert_eq!(loader.environment(), "qa");
        assert_eq!(loader.candidates().len(), 2);
        assert_eq!(loader.loaded_layers().len(), 1);
        assert_eq!(loader.loaded_layers()[0].role, LayerRole::Default);
        assert_eq!(loader.loaded_layers()[0].root, SearchRoot::WorkingDir);
        assert_eq!(loader.properties().get("name"), Some("app"));
    }

    #[test]
    fn test_loader_returns_no_store_on_unresolved_reference() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("default.properties"), "url=${nowhere}\n").unwrap();

        let paths = SearchPaths::with_dirs(None, Some(temp.path().to_path_buf()), None);
        let err = ConfigLoader::load_with_paths("local", paths).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnresolvedVariable);
    }
}
