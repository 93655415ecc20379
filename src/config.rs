//! IO configuration using Figment
//!
//! Describes the engines and channels of a noise exposure rig. Configuration
//! is loaded from:
//! 1. A TOML file (base configuration)
//! 2. Environment variables (prefixed with NOISE_EXP_)
//!
//! # Example
//! ```no_run
//! use noise_exp::config::IoConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = IoConfig::load()?;
//! config.validate()?;
//! println!("Engines: {}", config.enabled_engines().len());
//! # Ok(())
//! # }
//! ```

use crate::error::{AppResult, SyncError};
use crate::hardware::channel::{Direction, Timing};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Top-level IO configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Trigger synchronization settings
    #[serde(default)]
    pub synchronization: SynchronizationConfig,
    /// Engine definitions, in registration order
    #[serde(default)]
    pub engines: Vec<EngineDefinition>,
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

/// How channels are classified into the reference device/direction group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Device name equality plus declared channel direction
    #[default]
    Structured,
    /// Device name and direction tag are substrings of the channel path
    Substring,
}

/// Trigger synchronization settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynchronizationConfig {
    /// Group classification strategy
    #[serde(default)]
    pub match_mode: MatchMode,
}

/// Engine definition in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineDefinition {
    /// Unique engine name
    pub name: String,
    /// Whether this engine is registered
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Channels owned by the engine
    #[serde(default)]
    pub channels: Vec<ChannelDefinition>,
}

/// Channel definition in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDefinition {
    /// Display name
    pub name: String,
    /// Physical channel path (`<device>/<subpath>`)
    pub channel: String,
    /// `in` or `out`
    pub direction: Direction,
    /// `hw` or `sw`
    #[serde(default)]
    pub timing: Timing,
    /// Whether the channel takes part in the run
    #[serde(default = "default_enabled")]
    pub active: bool,
    /// Initial start trigger
    #[serde(default)]
    pub start_trigger: String,
}

// Default value functions
fn default_name() -> String {
    "noise-exp".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_enabled() -> bool {
    true
}

impl IoConfig {
    /// Load configuration from config/io.toml and environment variables
    ///
    /// Environment variables can override configuration with prefix NOISE_EXP_
    /// Example: NOISE_EXP_APPLICATION__LOG_LEVEL=debug
    pub fn load() -> AppResult<Self> {
        Self::load_from("config/io.toml")
    }

    /// Load configuration from a specific file path
    ///
    /// A missing file is an error rather than an empty rig.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SyncError::Configuration(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let config = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("NOISE_EXP_").split("__"))
            .extract()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (no environment overrides)
    pub fn from_toml_str(source: &str) -> AppResult<Self> {
        let config = Figment::new().merge(Toml::string(source)).extract()?;
        Ok(config)
    }

    /// Render the configuration back to TOML
    pub fn to_toml_string(&self) -> AppResult<String> {
        toml::to_string_pretty(self).map_err(|e| SyncError::Configuration(e.to_string()))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> AppResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(SyncError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        let mut engine_names = HashSet::new();
        for engine in &self.engines {
            if engine.name.trim().is_empty() {
                return Err(SyncError::Configuration("Engine name must not be empty".into()));
            }
            if !engine_names.insert(engine.name.as_str()) {
                return Err(SyncError::Configuration(format!(
                    "Duplicate engine name: {}",
                    engine.name
                )));
            }

            let mut channel_names = HashSet::new();
            for channel in &engine.channels {
                if !channel_names.insert(channel.name.as_str()) {
                    return Err(SyncError::Configuration(format!(
                        "Duplicate channel name '{}' in engine '{}'",
                        channel.name, engine.name
                    )));
                }
                if channel.channel.trim().is_empty() {
                    return Err(SyncError::Configuration(format!(
                        "Channel '{}' in engine '{}' has an empty path",
                        channel.name, engine.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Get all enabled engines, in file order
    pub fn enabled_engines(&self) -> Vec<&EngineDefinition> {
        self.engines.iter().filter(|e| e.enabled).collect()
    }
}
