//! CLI command definitions for layered-props
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::config::FlagOverrides;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Output format for `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatArg {
    /// `key = value` lines (default)
    #[default]
    Text,
    Json,
    Yaml,
}

/// Resolve and inspect layered .properties configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Environment name (overrides $ENV, default: local)
    #[arg(long, global = true)]
    pub env: Option<String>,

    /// Override config directory (overrides $CONF)
    #[arg(long, global = true)]
    pub conf: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The `--env`/`--conf` values to install as process-wide overrides.
    pub fn flag_overrides(&self) -> FlagOverrides {
        FlagOverrides {
            env: self.env.clone(),
            conf: self.conf.clone(),
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved configuration (default if no subcommand given)
    Show(ShowArgs),

    /// Print a single resolved value
    Get(GetArgs),

    /// List candidate files in load order
    Paths(PathsArgs),
}

#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Text)]
    pub format: FormatArg,

    /// Only print keys starting with this prefix
    #[arg(short, long)]
    pub prefix: Option<String>,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Key to look up
    pub key: String,

    /// Value printed when the key is absent
    #[arg(short, long)]
    pub default: Option<String>,
}

#[derive(Args, Debug)]
pub struct PathsArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}
