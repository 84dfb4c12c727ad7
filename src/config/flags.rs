//! Command-line overrides for environment and config directory.
//!
//! The flag set is parsed at most once per process. The binary installs the
//! values it already parsed; library callers that never install fall back to
//! a lazy scan of the process arguments on first use.

use clap::Parser;
use std::ffi::OsString;
use std::sync::OnceLock;
use tracing::{debug, warn};

static FLAGS: OnceLock<FlagOverrides> = OnceLock::new();

/// Values of `--env` and `--conf`, if given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagOverrides {
    pub env: Option<String>,
    pub conf: Option<String>,
}

/// The subset of the command line this crate cares about.
#[derive(Parser, Debug)]
#[command(
    no_binary_name = true,
    args_override_self = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
struct OverrideArgs {
    #[arg(long, allow_hyphen_values = true)]
    env: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    conf: Option<String>,
}

impl FlagOverrides {
    /// Extract `--env`/`--conf` from an argument list, ignoring anything else.
    ///
    /// Accepts both `--env prod` and `--env=prod`. Scanning stops at `--`.
    /// A following token that starts with `--` is never taken as a value.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut relevant: Vec<String> = Vec::new();
        let mut args = args.into_iter().map(Into::into).peekable();

        while let Some(arg) = args.next() {
            if arg == "--" {
                break;
            }
            if arg == "--env" || arg == "--conf" {
                if let Some(value) = args.next_if(|v: &String| !v.starts_with("--")) {
                    relevant.push(arg);
                    relevant.push(value);
                }
            } else if arg.starts_with("--env=") || arg.starts_with("--conf=") {
                relevant.push(arg);
            }
        }

        match OverrideArgs::try_parse_from(&relevant) {
            Ok(parsed) => Self {
                env: parsed.env,
                conf: parsed.conf,
            },
            Err(e) => {
                warn!(error = %e, "Ignoring unparseable --env/--conf flags");
                Self::default()
            }
        }
    }

    /// Like [`FlagOverrides::from_args`], skipping arguments that are not UTF-8.
    pub fn from_os_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = OsString>,
    {
        Self::from_args(args.into_iter().filter_map(|arg| arg.into_string().ok()))
    }
}

/// Install already-parsed overrides. Returns `false` if flags were set before.
pub fn install(flags: FlagOverrides) -> bool {
    let installed = FLAGS.set(flags).is_ok();
    if !installed {
        debug!("Command-line overrides already initialized; keeping existing values");
    }
    installed
}

/// The process-wide overrides, scanning `std::env::args_os` on first use.
pub fn flags() -> &'static FlagOverrides {
    FLAGS.get_or_init(|| FlagOverrides::from_os_args(std::env::args_os().skip(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separate_values() {
        let flags = FlagOverrides::from_args(["--env", "prod", "--conf", "/etc/app"]);
        assert_eq!(flags.env.as_deref(), Some("prod"));
        assert_eq!(flags.conf.as_deref(), Some("/etc/app"));
    }

    #[test]
    fn test_equals_form() {
        let flags = FlagOverrides::from_args(["--env=staging"]);
        assert_eq!(flags.env.as_deref(), Some("staging"));
        assert_eq!(flags.conf, None);
    }

    #[test]
    fn test_unrelated_args_ignored() {
        let flags = FlagOverrides::from_args(["serve", "-v", "--port", "80", "--env", "dev"]);
        assert_eq!(flags.env.as_deref(), Some("dev"));
    }

    #[test]
    fn test_last_value_wins() {
        let flags = FlagOverrides::from_args(["--env", "a", "--env", "b"]);
        assert_eq!(flags.env.as_deref(), Some("b"));
    }

    #[test]
    fn test_stops_at_double_dash() {
        let flags = FlagOverrides::from_args(["--", "--env", "prod"]);
        assert_eq!(flags, FlagOverrides::default());
    }

    #[test]
    fn test_flag_without_value_is_ignored() {
        let flags = FlagOverrides::from_args(["--conf"]);
        assert_eq!(flags, FlagOverrides::default());
    }

    #[test]
    fn test_flags_are_stable_across_calls() {
        let first = flags() as *const FlagOverrides;
        let second = flags() as *const FlagOverrides;
        assert_eq!(first, second);

        let late = FlagOverrides {
            env: Some("installed-too-late".into()),
            conf: None,
        };
        assert!(!install(late));
        assert_ne!(flags().env.as_deref(), Some("installed-too-late"));
    }

    #[test]
    fn test_flag_followed_by_flag_keeps_both() {
        let flags = FlagOverrides::from_args(["--env", "--conf", "/x"]);
        assert_eq!(flags.env, None);
        assert_eq!(flags.conf.as_deref(), Some("/x"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_argument_is_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let args = vec![
            OsString::from_vec(vec![b'f', 0xff, b'.', b't', b'x', b't']),
            OsString::from("--env"),
            OsString::from("prod"),
        ];
        let flags = FlagOverrides::from_os_args(args);
        assert_eq!(flags.env.as_deref(), Some("prod"));
    }
}
