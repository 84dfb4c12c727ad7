//! Integration tests for layered resolution.
//!
//! Builds directory layouts in temp dirs and resolves them through
//! `ConfigLoader::load_with_paths`, so no process state is involved.

use layered_props::config::{
    ConfigLoader, LayerRole, SearchPaths, SearchRoot, environment_from, load_files,
};
use layered_props::{ConfigError, ErrorCode};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write `<dir>/<name>` creating parent directories.
fn write(dir: &Path, name: &str, content: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), content).unwrap();
}

/// Layout with an executable dir, a working dir and an override dir.
struct Layout {
    _temp: TempDir,
    exe: PathBuf,
    cwd: PathBuf,
    conf: PathBuf,
}

impl Layout {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let exe = temp.path().join("bin");
        let cwd = temp.path().join("work");
        let conf = temp.path().join("etc");
        for dir in [&exe, &cwd, &conf] {
            fs::create_dir_all(dir).unwrap();
        }
        Self {
            _temp: temp,
            exe,
            cwd,
            conf,
        }
    }

    fn paths(&self, with_override: bool) -> SearchPaths {
        SearchPaths::with_dirs(
            Some(self.exe.clone()),
            Some(self.cwd.clone()),
            with_override.then(|| self.conf.clone()),
        )
    }
}

#[test]
fn test_environment_precedence_all_sources_distinct() {
    assert_eq!(environment_from(Some("explicit"), Some("flag"), Some("var")), "explicit");
    assert_eq!(environment_from(None, Some("flag"), Some("var")), "flag");
    assert_eq!(environment_from(None, None, Some("var")), "var");
    assert_eq!(environment_from(None, None, None), "local");
}

#[test]
fn test_environment_file_overrides_default_file() {
    let layout = Layout::new();
    let config = layout.cwd.join("config");
    write(&config, "default.properties", "timeout=30\nname=app\n");
    write(&config, "prod.properties", "timeout=5\n");

    let loader = ConfigLoader::load_with_paths("prod", layout.paths(false)).unwrap();
    assert_eq!(loader.properties().get("timeout"), Some("5"));
    assert_eq!(loader.properties().get("name"), Some("app"));
}

#[test]
fn test_default_file_never_overrides_environment_file() {
    let layout = Layout::new();
    let config = layout.exe.join("config");
    write(&config, "prod.properties", "mode=prod\n");
    write(&config, "default.properties", "mode=default\n");

    let loader = ConfigLoader::load_with_paths("prod", layout.paths(false)).unwrap();
    assert_eq!(loader.properties().get("mode"), Some("prod"));
}

#[test]
fn test_override_dir_wins_over_every_other_root() {
    let layout = Layout::new();
    write(&layout.exe.join("config"), "prod.properties", "db=exe\n");
    write(&layout.cwd.join("config"), "prod.properties", "db=cwd\n");
    // Even the override's default file beats other roots' environment files
    write(&layout.conf, "default.properties", "db=override\n");

    let loader = ConfigLoader::load_with_paths("prod", layout.paths(true)).unwrap();
    assert_eq!(loader.properties().get("db"), Some("override"));

    let last = loader.loaded_layers().last().unwrap();
    assert_eq!(last.root, SearchRoot::Override);
    assert_eq!(last.role, LayerRole::Default);
}

#[test]
fn test_working_dir_overrides_executable_dir() {
    let layout = Layout::new();
    write(&layout.exe.join("config"), "local.properties", "color=blue\n");
    write(&layout.cwd.join("config"), "default.properties", "color=red\n");

    let loader = ConfigLoader::load_with_paths("local", layout.paths(false)).unwrap();
    assert_eq!(loader.properties().get("color"), Some("red"));
}

#[test]
fn test_absent_layers_equal_loading_present_files_only() {
    let layout = Layout::new();
    write(&layout.exe.join("config"), "default.properties", "a=1\nb=2\n");
    write(&layout.conf, "qa.properties", "b=3\nc=4\n");

    let loader = ConfigLoader::load_with_paths("qa", layout.paths(true)).unwrap();
    assert_eq!(loader.candidates().len(), 6);
    assert_eq!(loader.loaded_layers().len(), 2);

    let direct = load_files(&[
        layout.exe.join("config").join("default.properties"),
        layout.conf.join("qa.properties"),
    ])
    .unwrap();
    assert_eq!(loader.properties(), &direct);
}

#[test]
fn test_no_files_at_all_is_an_empty_store() {
    let layout = Layout::new();
    let loader = ConfigLoader::load_with_paths("local", layout.paths(true)).unwrap();
    assert!(loader.properties().is_empty());
    assert!(loader.loaded_layers().is_empty());
}

#[test]
fn test_reference_to_key_in_later_file() {
    let layout = Layout::new();
    write(&layout.cwd.join("config"), "default.properties", "url=http://${host}/\n");
    write(&layout.conf, "local.properties", "host=example.org\n");

    let loader = ConfigLoader::load_with_paths("local", layout.paths(true)).unwrap();
    assert_eq!(loader.properties().get("url"), Some("http://example.org/"));
}

#[test]
fn test_reference_uses_winning_value() {
    let layout = Layout::new();
    let config = layout.cwd.join("config");
    write(&config, "default.properties", "port=80\nurl=http://host:${port}\n");
    write(&config, "prod.properties", "port=443\n");

    let loader = ConfigLoader::load_with_paths("prod", layout.paths(false)).unwrap();
    assert_eq!(loader.properties().get("url"), Some("http://host:443"));
}

#[test]
fn test_unknown_reference_fails_resolution() {
    let layout = Layout::new();
    write(&layout.cwd.join("config"), "default.properties", "a=${not.defined}\n");

    match ConfigLoader::load_with_paths("local", layout.paths(false)) {
        Err(ConfigError::UnresolvedVariable { key, missing }) => {
            assert_eq!(key, "a");
            assert_eq!(missing, "not.defined");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected resolution to fail"),
    }
}

#[test]
fn test_malformed_file_aborts_resolution() {
    let layout = Layout::new();
    write(&layout.cwd.join("config"), "default.properties", "good=1\n");
    write(&layout.conf, "local.properties", "bad=\\u00\n");

    let err = ConfigLoader::load_with_paths("local", layout.paths(true)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::FileParse);
}

#[test]
fn test_no_search_path() {
    let err = ConfigLoader::load_with_paths("local", SearchPaths::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoSearchPath);
    assert_eq!(err.to_string(), "cannot read config path");
}

#[test]
fn test_prod_scenario() {
    let layout = Layout::new();
    let config = layout.cwd.join("config");
    write(
        &config,
        "default.properties",
        "host=localhost\nport=${default.port}\n",
    );
    write(&config, "prod.properties", "default.port=9000\n");

    let loader = ConfigLoader::load_with_paths("prod", layout.paths(false)).unwrap();
    let props = loader.properties();
    assert_eq!(props.len(), 3);
    assert_eq!(props.get("host"), Some("localhost"));
    assert_eq!(props.get("port"), Some("9000"));
    assert_eq!(props.get("default.port"), Some("9000"));
}
