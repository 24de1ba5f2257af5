//! confstack
//!
//! Command-line front end for layered configuration: resolve keys across
//! config files, environment variables and defaults.

use anyhow::{Context, Result, bail};
use clap::Parser;
use confstack::cli::{Cli, Command, file_source_name};
use confstack::format::render;
use confstack::parse::parse_value;
use confstack::{ConfigStack, File, Key, Source};
use serde_json::Value;
use std::fs::OpenOptions;
use tracing::{Level, debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the tracing subscriber selected by `--log`.
///
/// `RUST_LOG` overrides the level picked by `--verbose`.
fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter())
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter())
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)
                .with_context(|| format!("cannot open log file {}", filename))?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter())
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

fn print(value: &Value, cli: &Cli) -> Result<()> {
    println!("{}", render(value, cli.format)?);
    Ok(())
}

fn run_set(stack: &mut ConfigStack, key: &str, raw: &str) -> Result<()> {
    let name = file_source_name(0);
    let Some(source) = stack.source_mut(&name) else {
        bail!("set needs at least one --file to write to");
    };

    let value = parse_value(raw).unwrap_or(Value::Null);
    if !source.set(&Key::from(key), &value) {
        bail!("could not set {}", key);
    }
    source.save()?;

    if let Some(file) = source.downcast_ref::<File>() {
        info!(key = %key, path = %file.path().display(), "Saved value");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let mut stack = cli.build_stack()?;
    debug!(sources = ?stack.names(), "Configuration stack ready");

    match &cli.command {
        Command::Get { key } => match stack.get(key) {
            Some(value) => print(&value, &cli)?,
            None => bail!("{} is not set", key),
        },
        Command::Any { keys } => match stack.any(keys) {
            Some(value) => print(&value, &cli)?,
            None => bail!("none of {} is set", keys.join(", ")),
        },
        Command::Required { keys } => {
            stack.required(keys)?;
            info!(count = keys.len(), "All required keys are set");
        }
        Command::Dump => {
            let root = stack.get(()).unwrap_or_else(|| Value::Object(Default::default()));
            print(&root, &cli)?;
        }
        Command::Set { key, value } => run_set(&mut stack, key, value)?,
        Command::Sources => {
            for name in stack.names() {
                let kind = stack.source(name).map(|s| s.kind()).unwrap_or_default();
                println!("{}\t{}", name, kind);
            }
        }
    }

    Ok(())
}
