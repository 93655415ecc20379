//! Custom error types for the application.
//!
//! `SyncError` is the single error type shared by configuration loading,
//! controller construction and trigger synchronization. It is built with
//! `thiserror`, and `#[from]` conversions let the `?` operator lift the
//! underlying I/O, figment and serde errors.
//!
//! ## Error Hierarchy
//!
//! - **`Config`**: the TOML file or environment overrides could not be parsed
//!   into an [`IoConfig`](crate::config::IoConfig).
//! - **`Configuration`**: the configuration parsed but is semantically wrong
//!   (duplicate engine names, unknown log level, empty channel path, ...).
//! - **`DuplicateEngine`**: an engine was registered twice on a controller.
//! - **`NoMasterEngine`**: two or more channels are active but none of them
//!   was classified into the reference device/direction group, so no engine
//!   can own the start trigger.
//! - **`Io`** / **`Serialization`**: a [`SyncReport`](crate::trigger::SyncReport)
//!   could not be written as a table or as JSON.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, SyncError>;

/// Errors raised while configuring or synchronizing DAQ engines.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration file or environment could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Configuration parsed but failed validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// An engine with the same name is already registered.
    #[error("Engine '{0}' is already registered")]
    DuplicateEngine(String),

    /// No active channel matched the reference device/direction group.
    #[error("No channel matched reference '{reference}'; cannot elect a master engine")]
    NoMasterEngine {
        /// Path of the channel elected as synchronization reference.
        reference: String,
    },

    /// I/O failure while writing a report table.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization or JSON output failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<figment::Error> for SyncError {
    fn from(err: figment::Error) -> Self {
        SyncError::Config(Box::new(err))
    }
}

impl SyncError {
    /// True when the error stems from user-supplied configuration and can be
    /// fixed by editing the config file.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SyncError::Config(_) | SyncError::Configuration(_) | SyncError::DuplicateEngine(_)
        )
    }
}
