//! DAQ channel handles.
//!
//! A [`Channel`] is one analog input or output line belonging to an engine.
//! Channels are shared as `Arc<Channel>` between the engine that owns them and
//! the trigger synchronizer, so the only mutable field, the start trigger, sits
//! behind a `parking_lot::RwLock`.
//!
//! Channel paths follow the NI-DAQmx physical channel convention
//! `<device>/<subpath>`, e.g. `PXI1Slot7/ao0`.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Direction / Timing
// =============================================================================

/// Signal direction of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Acquisition (analog input)
    In,
    /// Generation (analog output)
    Out,
}

impl Direction {
    /// Trigger-line tag used in NI terminal names (`ai` / `ao`).
    pub fn trigger_tag(self) -> &'static str {
        match self {
            Direction::In => "ai",
            Direction::Out => "ao",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => f.pad("in"),
            Direction::Out => f.pad("out"),
        }
    }
}

/// Sample timing of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timing {
    /// Sample clock driven by dedicated hardware
    #[default]
    Hw,
    /// Software-polled
    Sw,
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timing::Hw => f.pad("hw"),
            Timing::Sw => f.pad("sw"),
        }
    }
}

// =============================================================================
// Channel Path
// =============================================================================

/// Parsed `<device>/<subpath>` channel path.
///
/// No validation is performed: a path without `/` is treated as a bare
/// device name with an empty subpath.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPath<'a> {
    /// Device name (everything before the first `/`)
    pub device: &'a str,
    /// Remainder after the first `/`
    pub subpath: &'a str,
}

impl<'a> ChannelPath<'a> {
    /// Split a raw path at its first `/`.
    pub fn parse(path: &'a str) -> Self {
        match path.split_once('/') {
            Some((device, subpath)) => Self { device, subpath },
            None => Self {
                device: path,
                subpath: "",
            },
        }
    }
}

// =============================================================================
// Channel
// =============================================================================

/// A hardware channel with a rewritable start trigger.
#[derive(Debug)]
pub struct Channel {
    name: String,
    channel: String,
    engine: String,
    direction: Direction,
    timing: Timing,
    active: bool,
    start_trigger: RwLock<String>,
}

impl Channel {
    /// Create a channel owned by `engine`.
    pub fn new(
        name: impl Into<String>,
        channel: impl Into<String>,
        engine: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            name: name.into(),
            channel: channel.into(),
            engine: engine.into(),
            direction,
            timing: Timing::Hw,
            active: true,
            start_trigger: RwLock::new(String::new()),
        }
    }

    /// Set the timing mode.
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Set whether the channel takes part in the run.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Set the initial start trigger.
    pub fn with_start_trigger(self, trigger: impl Into<String>) -> Self {
        *self.start_trigger.write() = trigger.into();
        self
    }

    /// Display name (e.g. "speaker_output").
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical channel path (e.g. "PXI1Slot7/ao0").
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Name of the owning engine.
    pub fn engine(&self) -> &str {
        &self.engine
    }

    /// Signal direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Timing mode.
    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Whether the channel is active for this run.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Parsed view of the channel path.
    pub fn path(&self) -> ChannelPath<'_> {
        ChannelPath::parse(&self.channel)
    }

    /// Device name prefix of the channel path.
    pub fn device(&self) -> &str {
        self.path().device
    }

    /// Current start trigger; empty means the device's own internal trigger.
    pub fn start_trigger(&self) -> String {
        self.start_trigger.read().clone()
    }

    /// Replace the start trigger.
    pub fn set_start_trigger(&self, trigger: impl Into<String>) {
        *self.start_trigger.write() = trigger.into();
    }

    /// True if this channel matches a `get_channels` query.
    pub fn matches(&self, direction: Direction, timing: Timing, active: bool) -> bool {
        self.direction == direction && self.timing == timing && self.active == active
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.channel)
    }
}
