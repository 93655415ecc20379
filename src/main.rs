//! CLI Entry Point for noise-exp
//!
//! Provides command-line access to the rig's IO wiring:
//! - Listing engines and their channels
//! - Running start-trigger synchronization and printing the result
//! - Validating a rig configuration
//!
//! # Usage
//!
//! ```bash
//! noise-exp channels --config config/io.toml
//! noise-exp sync --config config/io.toml --json
//! noise-exp validate --config config/io.toml --print
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use noise_exp::config::IoConfig;
use noise_exp::hardware::{Controller, Direction, IoController, Timing};
use noise_exp::logging::{self, TracingConfig};
use noise_exp::manifest::{IoManifest, LifecycleEvent};
use noise_exp::trigger::display_trigger;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "noise-exp")]
#[command(about = "Noise exposure IO wiring", long_about = None)]
struct Cli {
    /// Override the configured log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List engines and their channels with timing and state
    Channels {
        /// Rig configuration file
        #[arg(long, default_value = "config/io.toml")]
        config: PathBuf,
    },

    /// Synchronize start triggers and print the resulting wiring
    Sync {
        /// Rig configuration file
        #[arg(long, default_value = "config/io.toml")]
        config: PathBuf,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load and validate a rig configuration
    Validate {
        /// Rig configuration file
        #[arg(long, default_value = "config/io.toml")]
        config: PathBuf,

        /// Print the effective configuration as TOML
        #[arg(long)]
        print: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Channels { config } => {
            let config = load(&config, cli.log_level.as_deref())?;
            list_channels(&config)
        }
        Commands::Sync { config, json } => {
            let config = load(&config, cli.log_level.as_deref())?;
            sync(&config, json)
        }
        Commands::Validate { config, print } => {
            let config = load(&config, cli.log_level.as_deref())?;
            if print {
                print!("{}", config.to_toml_string()?);
            } else {
                println!("Configuration OK: {} engine(s)", config.enabled_engines().len());
            }
            Ok(())
        }
    }
}

fn load(path: &Path, log_level: Option<&str>) -> Result<IoConfig> {
    let mut config = IoConfig::load_from(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    if let Some(level) = log_level {
        config.application.log_level = level.to_string();
    }
    config.validate().context("Invalid configuration")?;

    logging::init(TracingConfig::from_io_config(&config)?)?;
    Ok(config)
}

fn list_channels(config: &IoConfig) -> Result<()> {
    let controller = IoController::from_config(config)?;
    let mut out = std::io::stdout().lock();

    for engine in controller.engines() {
        writeln!(out, "{}", engine.name())?;
        for direction in [Direction::In, Direction::Out] {
            for timing in [Timing::Hw, Timing::Sw] {
                for active in [true, false] {
                    for channel in engine.get_channels(direction, timing, active) {
                        writeln!(
                            out,
                            "  {:<4} {:<3} {:<9} {:<24} {:<20} {}",
                            channel.direction(),
                            channel.timing(),
                            if channel.is_active() { "active" } else { "inactive" },
                            channel.channel(),
                            channel.name(),
                            display_trigger(&channel.start_trigger())
                        )?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn sync(config: &IoConfig, json: bool) -> Result<()> {
    let mut controller = IoController::from_config(config)?;
    let manifest = IoManifest::from_config(config);

    let Some(report) = manifest
        .handle(LifecycleEvent::ExperimentPrepare, &mut controller)
        .context("Start trigger synchronization failed")?
    else {
        anyhow::bail!("{} did not run synchronization", LifecycleEvent::ExperimentPrepare);
    };

    let mut out = std::io::stdout().lock();
    if json {
        report.write_json(&mut out)?;
    } else {
        report.write_table(&mut out)?;
    }
    Ok(())
}
