//! Start-trigger synchronization across DAQ engines.
//!
//! Every engine in a run samples on its own clock, so starting them one after
//! another leaves them misaligned. Routing each device's start trigger to a
//! single reference device's trigger line makes all engines begin on the same
//! edge. Channels may be disabled per run, so the wiring has to be derived
//! from whichever hardware-timed channels are active when the run is prepared.
//!
//! # Election policy
//!
//! ```text
//! engines (registration order)     E1 ──── E2 ──── E3
//! visit order                      E3 ──── E2 ──── E1
//!
//! ai_channels = active hw inputs,  in visit order
//! ao_channels = active hw outputs, in visit order
//! channels    = ai_channels ++ ao_channels
//!
//! reference   = ao_channels[0] ("ao") or else ai_channels[0] ("ai")
//! trigger     = /<reference device>/<ao|ai>/StartTrigger
//! ```
//!
//! Channels in the reference device/direction group free-run (empty trigger);
//! every other channel waits on `trigger`. The engine owning the first channel
//! of the group becomes the controller's master engine.
//!
//! # Example
//!
//! ```
//! use noise_exp::hardware::{Controller, DaqEngine, Direction, IoController, Timing};
//! use noise_exp::trigger::connect_trigger;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), noise_exp::error::SyncError> {
//! let speaker = DaqEngine::new("E1")
//!     .with_channel("speaker", "devA/ao0", Direction::Out, Timing::Hw, true);
//! let mic = DaqEngine::new("E2")
//!     .with_channel("mic", "devB/ai0", Direction::In, Timing::Hw, true);
//!
//! let mut controller = IoController::new();
//! controller.register(Arc::new(speaker))?;
//! controller.register(Arc::new(mic))?;
//!
//! let report = connect_trigger(&mut controller)?;
//! assert_eq!(report.trigger(), Some("/devA/ao/StartTrigger"));
//! assert_eq!(controller.master_engine().map(|e| e.name().to_string()).as_deref(), Some("E1"));
//! # Ok(())
//! # }
//! ```

use crate::config::MatchMode;
use crate::error::{AppResult, SyncError};
use crate::hardware::{Channel, Controller, Direction, Engine, Timing};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Channel paired with the engine it was collected from.
type Collected = (Arc<dyn Engine>, Arc<Channel>);

// =============================================================================
// Report
// =============================================================================

/// What a synchronization pass decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// No active hardware-timed channels; nothing was touched.
    Idle,
    /// A single active channel was left on its internal trigger.
    FreeRunning {
        /// Path of the only active channel
        channel: String,
    },
    /// All active channels were wired to a reference trigger line.
    Synchronized {
        /// Path of the elected reference channel
        reference: String,
        /// Reference device name
        device: String,
        /// Direction tag of the reference group (`ao` or `ai`)
        direction: String,
        /// Trigger source assigned to channels outside the reference group
        trigger: String,
        /// Engine owning the start trigger
        master_engine: String,
    },
}

/// Final start trigger of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerAssignment {
    /// Owning engine
    pub engine: String,
    /// Channel display name
    pub name: String,
    /// Channel path
    pub channel: String,
    /// Start trigger after synchronization
    pub start_trigger: String,
}

/// Summary of a synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Election result
    #[serde(flatten)]
    pub outcome: SyncOutcome,
    /// Every rewired channel, in processing order
    pub assignments: Vec<TriggerAssignment>,
}

impl SyncReport {
    fn idle() -> Self {
        Self {
            outcome: SyncOutcome::Idle,
            assignments: Vec::new(),
        }
    }

    /// Trigger source handed to non-reference channels, if any.
    pub fn trigger(&self) -> Option<&str> {
        match &self.outcome {
            SyncOutcome::Synchronized { trigger, .. } => Some(trigger.as_str()),
            _ => None,
        }
    }

    /// Name of the elected master engine, if any.
    pub fn master_engine(&self) -> Option<&str> {
        match &self.outcome {
            SyncOutcome::Synchronized { master_engine, .. } => Some(master_engine.as_str()),
            _ => None,
        }
    }

    /// Assignment for the channel at `path`.
    pub fn assignment(&self, path: &str) -> Option<&TriggerAssignment> {
        self.assignments.iter().find(|a| a.channel == path)
    }

    /// Write the report as pretty-printed JSON followed by a newline.
    pub fn write_json<W: Write>(&self, out: &mut W) -> AppResult<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)?;
        Ok(())
    }

    /// Write a human-readable summary and one line per assignment.
    ///
    /// Channels left on their internal trigger are shown as `(internal)`.
    pub fn write_table<W: Write>(&self, out: &mut W) -> AppResult<()> {
        match &self.outcome {
            SyncOutcome::Idle => writeln!(out, "No channels are active.")?,
            SyncOutcome::FreeRunning { channel } => {
                writeln!(out, "Only {} is active; it runs on its internal trigger.", channel)?
            }
            SyncOutcome::Synchronized {
                reference,
                trigger,
                master_engine,
                ..
            } => {
                writeln!(out, "Reference: {}", reference)?;
                writeln!(out, "Trigger:   {}", trigger)?;
                writeln!(out, "Master:    {}", master_engine)?;
            }
        }

        for a in &self.assignments {
            writeln!(
                out,
                "  {:<16} {:<24} {}",
                a.engine,
                a.channel,
                display_trigger(&a.start_trigger)
            )?;
        }
        Ok(())
    }
}

/// Render a start trigger for display; empty means the internal trigger.
pub fn display_trigger(trigger: &str) -> &str {
    if trigger.is_empty() {
        "(internal)"
    } else {
        trigger
    }
}

// =============================================================================
// Synchronizer
// =============================================================================

/// Elects a reference channel and rewires start triggers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerSynchronizer {
    match_mode: MatchMode,
}

impl TriggerSynchronizer {
    /// Create a synchronizer with the given group classification.
    pub fn new(match_mode: MatchMode) -> Self {
        Self { match_mode }
    }

    /// Group classification in use.
    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// Wire the start triggers of all active hardware-timed channels.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NoMasterEngine`] when two or more channels are
    /// active but none falls into the reference group. Channel triggers have
    /// already been rewritten at that point; the master engine is left as is.
    #[instrument(skip_all, fields(match_mode = ?self.match_mode))]
    pub fn connect_trigger<C>(&self, controller: &mut C) -> AppResult<SyncReport>
    where
        C: Controller + ?Sized,
    {
        let mut ai_channels: Vec<Collected> = Vec::new();
        let mut ao_channels: Vec<Collected> = Vec::new();
        for engine in controller.engines().into_iter().rev() {
            let hw_ai = engine.get_channels(Direction::In, Timing::Hw, true);
            let hw_ao = engine.get_channels(Direction::Out, Timing::Hw, true);
            debug!(engine = engine.name(), ai = hw_ai.len(), ao = hw_ao.len(), "Collected active channels");
            ai_channels.extend(hw_ai.into_iter().map(|c| (Arc::clone(&engine), c)));
            ao_channels.extend(hw_ao.into_iter().map(|c| (Arc::clone(&engine), c)));
        }

        let Some((reference, direction)) = elect_reference(&ai_channels, &ao_channels) else {
            info!("No channels are active");
            return Ok(SyncReport::idle());
        };

        let channels: Vec<&Collected> = ai_channels.iter().chain(ao_channels.iter()).collect();

        if channels.len() == 1 {
            info!(channel = %reference, "Only one channel active. Disabling start trigger.");
            reference.set_start_trigger("");
            return Ok(SyncReport {
                outcome: SyncOutcome::FreeRunning {
                    channel: reference.channel().to_string(),
                },
                assignments: assignments(&channels),
            });
        }

        let dev = reference.device().to_string();
        let tag = direction.trigger_tag();
        let trigger = format!("/{dev}/{tag}/StartTrigger");
        info!(reference = %reference, device = %dev, direction = tag, "Elected synchronization reference");
        warn_ambiguous_devices(&channels);

        let mut master_engine: Option<Arc<dyn Engine>> = None;
        for (engine, c) in &channels {
            if self.in_reference_group(c, &dev, direction) {
                info!("Setting {} start_trigger to \"\"", c);
                c.set_start_trigger("");
                if master_engine.is_none() {
                    master_engine = Some(Arc::clone(engine));
                }
            } else {
                info!("Setting {} start_trigger to \"{}\"", c, trigger);
                c.set_start_trigger(trigger.as_str());
            }
        }

        let Some(master_engine) = master_engine else {
            return Err(SyncError::NoMasterEngine {
                reference: reference.channel().to_string(),
            });
        };

        info!("Setting master engine to {}", master_engine.name());
        let master_name = master_engine.name().to_string();
        controller.set_master_engine(master_engine);

        Ok(SyncReport {
            outcome: SyncOutcome::Synchronized {
                reference: reference.channel().to_string(),
                device: dev,
                direction: tag.to_string(),
                trigger,
                master_engine: master_name,
            },
            assignments: assignments(&channels),
        })
    }

    fn in_reference_group(&self, channel: &Channel, dev: &str, direction: Direction) -> bool {
        match self.match_mode {
            MatchMode::Structured => channel.device() == dev && channel.direction() == direction,
            MatchMode::Substring => {
                let path = channel.channel();
                path.contains(dev) && path.contains(direction.trigger_tag())
            }
        }
    }
}

/// Run [`TriggerSynchronizer::connect_trigger`] with structured matching.
pub fn connect_trigger<C>(controller: &mut C) -> AppResult<SyncReport>
where
    C: Controller + ?Sized,
{
    TriggerSynchronizer::default().connect_trigger(controller)
}

/// Outputs win over inputs; within a direction the first collected channel wins.
fn elect_reference(ai: &[Collected], ao: &[Collected]) -> Option<(Arc<Channel>, Direction)> {
    ao.first()
        .map(|(_, c)| (Arc::clone(c), Direction::Out))
        .or_else(|| ai.first().map(|(_, c)| (Arc::clone(c), Direction::In)))
}

/// Device names that contain one another (`Dev1`, `Dev10`) are classified
/// differently by the two match modes.
fn warn_ambiguous_devices(channels: &[&Collected]) {
    let mut devices: Vec<&str> = Vec::new();
    for (_, c) in channels {
        let device = c.device();
        if !devices.contains(&device) {
            devices.push(device);
        }
    }

    for (i, a) in devices.iter().enumerate() {
        for b in &devices[i + 1..] {
            if a.contains(b) || b.contains(a) {
                warn!(first = a, second = b, "Device names overlap; substring matching would conflate them");
            }
        }
    }
}

fn assignments(channels: &[&Collected]) -> Vec<TriggerAssignment> {
    channels
        .iter()
        .map(|(engine, c)| TriggerAssignment {
            engine: engine.name().to_string(),
            name: c.name().to_string(),
            channel: c.channel().to_string(),
            start_trigger: c.start_trigger(),
        })
        .collect()
}
