//! # Noise Exposure IO Library
//!
//! IO wiring for the noise exposure paradigm. A run drives several DAQ
//! engines (speaker output, monitor microphone input, ...), each sampling on
//! its own hardware clock. Before acquisition starts, the trigger synchronizer
//! elects one reference device and routes every other device's start trigger
//! to it so all engines begin on the same edge.
//!
//! ## Crate Structure
//!
//! - **`config`**: TOML + environment configuration of engines and channels,
//!   loaded with `figment`. See `config::IoConfig`.
//! - **`error`**: the `SyncError` enum shared by every module.
//! - **`hardware`**: `Channel`, the `Engine` and `Controller` traits, and the
//!   configuration-backed `DaqEngine` / `IoController`.
//! - **`logging`**: `tracing-subscriber` setup.
//! - **`manifest`**: lifecycle hook that runs synchronization on prepare.
//! - **`trigger`**: the start-trigger synchronizer.

pub mod config;
pub mod error;
pub mod hardware;
pub mod logging;
pub mod manifest;
pub mod trigger;

pub use error::{AppResult, SyncError};
pub use trigger::{connect_trigger, SyncOutcome, SyncReport, TriggerSynchronizer};
