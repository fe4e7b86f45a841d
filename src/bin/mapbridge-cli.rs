//! Mapbridge CLI - offline tools for the map bridge
//!
//! Replays recorded host event logs through the event processor, prints the
//! event forwarding script a host must install, and writes default
//! configuration files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use mapbridge::command::{Command, Identifier, SubscribeEvents};
use mapbridge::config::{self, BridgeConfig};
use mapbridge::events::{ClassifiedEvent, EventKind, EventProcessor, RawEvent};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "mapbridge")]
#[command(about = "Tools for the script-hosted map bridge", long_about = None)]
struct Cli {
    /// Configuration file (defaults are used when absent)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines event log and print delivered events
    Replay {
        /// Log file; each line is {"t": seconds, "name": ..., "payload": {...}}
        file: PathBuf,

        /// Override the double-tap window in seconds
        #[arg(long)]
        sensitivity: Option<f64>,
    },

    /// Print the script that forwards map events to the host
    ListenerScript {
        /// Host message handler name (defaults to the configured one)
        #[arg(long)]
        handler: Option<String>,

        /// Comma-separated event names (default: every host event)
        #[arg(long, value_delimiter = ',')]
        events: Vec<String>,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => BridgeConfig::default(),
    };

    match cli.command {
        Commands::Replay { file, sensitivity } => replay(&config, &file, sensitivity)?,
        Commands::ListenerScript { handler, events } => {
            let handler = match handler {
                Some(name) => Identifier::new(name)?,
                None => config.handler_identifier()?,
            };
            let command = if events.is_empty() {
                SubscribeEvents::all(handler)
            } else {
                SubscribeEvents::new(parse_event_names(&events)?, handler)
            };
            println!("{}", command.script());
        }
        Commands::InitConfig { path } => {
            config::write_config(&path, &BridgeConfig::default())?;
            println!("Wrote default configuration to {:?}", path);
        }
    }

    Ok(())
}

fn parse_event_names(names: &[String]) -> Result<Vec<EventKind>> {
    names
        .iter()
        .map(|name| {
            EventKind::from_name(name.trim())
                .with_context(|| format!("Unknown event name '{}'", name))
        })
        .collect()
}

fn replay(config: &BridgeConfig, file: &Path, sensitivity: Option<f64>) -> Result<()> {
    let processor = EventProcessor::from_config(config);
    if let Some(seconds) = sensitivity {
        if !seconds.is_finite() || seconds < 0.0 {
            bail!("Sensitivity must be a non-negative number of seconds");
        }
        processor.set_double_tap_sensitivity(seconds);
    }

    let printer = Arc::new(|event: &ClassifiedEvent| match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(err) => tracing::warn!("Failed to print event: {}", err),
    });
    processor.set_delegate(&printer);

    let reader = BufReader::new(
        File::open(file).with_context(|| format!("Failed to open event log: {:?}", file))?,
    );

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read event log")?;
        if line.trim().is_empty() {
            continue;
        }

        let mut value: Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("Skipping line {}: {}", index + 1, err);
                continue;
            }
        };

        let timestamp = value
            .as_object_mut()
            .and_then(|object| object.remove("t"))
            .and_then(|t| t.as_f64());
        let Some(timestamp) = timestamp else {
            tracing::warn!("Skipping line {}: missing numeric \"t\"", index + 1);
            continue;
        };

        match RawEvent::from_json(value) {
            Ok(raw) => processor.handle_at(&raw, timestamp),
            Err(err) => tracing::warn!("Skipping line {}: {}", index + 1, err),
        }
    }

    Ok(())
}
