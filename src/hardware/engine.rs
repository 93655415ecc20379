//! Acquisition engines.
//!
//! An engine wraps one hardware DAQ device/task and owns its channels. The
//! synchronizer only needs to query channels by direction, timing and
//! activation state, so that query is the whole [`Engine`] trait.

use crate::hardware::channel::{Channel, Direction, Timing};
use std::fmt;
use std::sync::Arc;

/// One hardware acquisition/generation device.
pub trait Engine: fmt::Debug + Send + Sync {
    /// Unique engine name (e.g. "NI_audio").
    fn name(&self) -> &str;

    /// Channels matching `direction`, `timing` and `active`, in declaration order.
    fn get_channels(&self, direction: Direction, timing: Timing, active: bool) -> Vec<Arc<Channel>>;
}

/// Engine backed by a static channel list (built from configuration or tests).
#[derive(Debug)]
pub struct DaqEngine {
    name: String,
    channels: Vec<Arc<Channel>>,
}

impl DaqEngine {
    /// Create an engine with no channels.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: Vec::new(),
        }
    }

    /// Add a channel; returns the shared handle.
    pub fn add_channel(&mut self, channel: Channel) -> Arc<Channel> {
        let channel = Arc::new(channel);
        self.channels.push(Arc::clone(&channel));
        channel
    }

    /// Convenience builder: add a channel owned by this engine.
    pub fn with_channel(
        mut self,
        name: &str,
        path: &str,
        direction: Direction,
        timing: Timing,
        active: bool,
    ) -> Self {
        let channel = Channel::new(name, path, self.name.clone(), direction)
            .with_timing(timing)
            .with_active(active);
        self.add_channel(channel);
        self
    }

    /// All channels regardless of state.
    pub fn channels(&self) -> &[Arc<Channel>] {
        &self.channels
    }

    /// Look up a channel by display name.
    pub fn channel(&self, name: &str) -> Option<Arc<Channel>> {
        self.channels.iter().find(|c| c.name() == name).cloned()
    }
}

impl Engine for DaqEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_channels(&self, direction: Direction, timing: Timing, active: bool) -> Vec<Arc<Channel>> {
        self.channels
            .iter()
            .filter(|c| c.matches(direction, timing, active))
            .cloned()
            .collect()
    }
}
