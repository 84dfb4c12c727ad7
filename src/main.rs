//! layered-props
//!
//! Resolves layered, environment-specific `.properties` configuration and
//! prints the merged result.

use anyhow::{Result, bail};
use clap::Parser;
use layered_props::cli::{Cli, Command, FormatArg, GetArgs, PathsArgs, ShowArgs};
use layered_props::config::{self, ConfigLoader, SearchPaths, flags};
use layered_props::format::{
    OutputFormat, format_layers_text, format_properties, layers_to_json,
};
use std::fs::OpenOptions;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

/// Convert CLI FormatArg to OutputFormat
fn cli_format_to_output(format: FormatArg) -> OutputFormat {
    match format {
        FormatArg::Text => OutputFormat::Text,
        FormatArg::Json => OutputFormat::Json,
        FormatArg::Yaml => OutputFormat::Yaml,
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    // Hand the parsed flags to the resolver so it never re-scans argv
    flags::install(cli.flag_overrides());

    match cli.command {
        Some(Command::Show(args)) => run_show(&args),
        Some(Command::Get(args)) => run_get(&args),
        Some(Command::Paths(args)) => run_paths(&args),
        None => run_show(&ShowArgs::default()),
    }
}

fn run_show(args: &ShowArgs) -> Result<()> {
    let loader = ConfigLoader::load(None)?;
    debug!(
        env = loader.environment(),
        layers = loader.loaded_layers().len(),
        "Loaded configuration"
    );

    let props = match args.prefix {
        Some(ref prefix) => loader.properties().filter_prefix(prefix),
        None => loader.into_properties(),
    };
    print!("{}", format_properties(&props, cli_format_to_output(args.format))?);
    Ok(())
}

fn run_get(args: &GetArgs) -> Result<()> {
    let props = config::resolve(None)?;
    match (props.get(&args.key), &args.default) {
        (Some(value), _) => println!("{}", value),
        (None, Some(default)) => println!("{}", default),
        (None, None) => bail!("key '{}' is not defined", args.key),
    }
    Ok(())
}

fn run_paths(args: &PathsArgs) -> Result<()> {
    let env = config::resolve_environment(None);
    let layers = SearchPaths::discover(config::resolve_override_dir()).candidate_files(&env)?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "env": env,
                "layers": layers_to_json(&layers),
            }))?
        );
    } else {
        println!("env: {}", env);
        print!("{}", format_layers_text(&layers));
    }
    Ok(())
}
