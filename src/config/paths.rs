//! Candidate file enumeration across search roots.
//!
//! Roots are searched general to specific: the executable's directory, then
//! the working directory, then the explicit override directory. Each root
//! contributes `default.properties` followed by `<env>.properties`.

use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

/// Subdirectory holding config files under the executable and working dirs.
pub const CONFIG_DIR: &str = "config";

/// Extension of every configuration file.
pub const FILE_EXTENSION: &str = "properties";

/// Base name of the environment-independent file.
pub const DEFAULT_FILE_STEM: &str = "default";

/// Search root priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SearchRoot {
    /// `<dir of running executable>/config`
    Executable = 0,
    /// `<working directory>/config`
    WorkingDir = 1,
    /// `--conf` / `$CONF` directory, used as-is (highest priority)
    Override = 2,
}

impl std::fmt::Display for SearchRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchRoot::Executable => write!(f, "executable"),
            SearchRoot::WorkingDir => write!(f, "working-dir"),
            SearchRoot::Override => write!(f, "override"),
        }
    }
}

/// Which of the two files in a root a layer is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerRole {
    Default,
    Environment,
}

impl std::fmt::Display for LayerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerRole::Default => write!(f, "default"),
            LayerRole::Environment => write!(f, "environment"),
        }
    }
}

/// One candidate configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub path: PathBuf,
    pub root: SearchRoot,
    pub role: LayerRole,
}

/// Directories to search for configuration files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPaths {
    /// Directory containing the running executable, if resolvable
    pub executable_dir: Option<PathBuf>,
    /// Process working directory, if resolvable
    pub working_dir: Option<PathBuf>,
    /// Explicit override directory
    pub override_dir: Option<PathBuf>,
}

impl SearchPaths {
    /// Discover the executable and working directories from the process.
    pub fn discover(override_dir: Option<PathBuf>) -> Self {
        let executable_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let working_dir = std::env::current_dir().ok();

        Self {
            executable_dir,
            working_dir,
            override_dir,
        }
    }

    /// Create search paths with explicit directories.
    pub fn with_dirs(
        executable_dir: Option<PathBuf>,
        working_dir: Option<PathBuf>,
        override_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            executable_dir,
            working_dir,
            override_dir,
        }
    }

    /// Directories that hold config files, lowest priority first.
    pub fn config_dirs(&self) -> Vec<(SearchRoot, PathBuf)> {
        let mut dirs = Vec::with_capacity(3);
        if let Some(ref dir) = self.executable_dir {
            dirs.push((SearchRoot::Executable, dir.join(CONFIG_DIR)));
        }
        if let Some(ref dir) = self.working_dir {
            dirs.push((SearchRoot::WorkingDir, dir.join(CONFIG_DIR)));
        }
        if let Some(ref dir) = self.override_dir
            && !dir.as_os_str().is_empty()
        {
            dirs.push((SearchRoot::Override, dir.clone()));
        }
        dirs
    }

    /// Ordered candidate files for `env`, lowest priority first.
    ///
    /// Fails with [`ConfigError::NoSearchPath`] when no directory is known.
    pub fn candidate_files(&self, env: &str) -> ConfigResult<Vec<Layer>> {
        let env_file = format!("{}.{}", env, FILE_EXTENSION);
        let default_file = format!("{}.{}", DEFAULT_FILE_STEM, FILE_EXTENSION);

        let layers: Vec<Layer> = self
            .config_dirs()
            .into_iter()
            .flat_map(|(root, dir)| {
                [
                    Layer {
                        path: dir.join(&default_file),
                        root,
                        role: LayerRole::Default,
                    },
                    Layer {
                        path: dir.join(&env_file),
                        root,
                        role: LayerRole::Environment,
                    },
                ]
            })
            .collect();

        if layers.is_empty() {
            return Err(ConfigError::NoSearchPath);
        }
        Ok(layers)
    }
}

/// Build the candidate list for the current process.
pub fn build_candidate_files(env: &str, override_dir: Option<&Path>) -> ConfigResult<Vec<Layer>> {
    SearchPaths::discover(override_dir.map(Path::to_path_buf)).candidate_files(env)
}
