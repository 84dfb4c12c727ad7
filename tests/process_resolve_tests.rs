//! End-to-end test of `resolve()` against process environment variables.
//!
//! Kept in its own test binary with a single test because it mutates `ENV`
//! and `CONF`.

use layered_props::resolve;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_resolve_reads_env_and_conf_variables() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("default.properties"),
        "greeting=hello ${target}\ntarget=world\n",
    )
    .unwrap();
    fs::write(temp.path().join("staging.properties"), "target=staging\n").unwrap();
    fs::write(temp.path().join("prod.properties"), "target=prod\n").unwrap();

    // SAFETY: this is the only test in this binary
    unsafe {
        std::env::set_var("CONF", temp.path());
        std::env::set_var("ENV", "staging");
    }

    let from_var = resolve(None).unwrap();
    assert_eq!(from_var.get("greeting"), Some("hello staging"));

    let explicit = resolve(Some("prod")).unwrap();
    assert_eq!(explicit.get("greeting"), Some("hello prod"));

    unsafe {
        std::env::remove_var("CONF");
        std::env::remove_var("ENV");
    }
}
