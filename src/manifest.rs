//! IO manifest: binds trigger synchronization to the experiment lifecycle.
//!
//! Trigger wiring has to be recomputed after channels are enabled or disabled
//! for a run and before any engine starts, so the manifest runs the
//! synchronizer on [`LifecycleEvent::ExperimentPrepare`] and ignores the rest.

use crate::config::IoConfig;
use crate::error::AppResult;
use crate::hardware::Controller;
use crate::trigger::{SyncReport, TriggerSynchronizer};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Experiment lifecycle events seen by the IO manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// Channels are configured; engines have not started.
    ExperimentPrepare,
    /// Engines are starting.
    ExperimentStart,
    /// Run finished.
    ExperimentEnd,
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleEvent::ExperimentPrepare => write!(f, "experiment_prepare"),
            LifecycleEvent::ExperimentStart => write!(f, "experiment_start"),
            LifecycleEvent::ExperimentEnd => write!(f, "experiment_end"),
        }
    }
}

/// Lifecycle hooks for the noise exposure IO.
#[derive(Debug, Clone, Copy, Default)]
pub struct IoManifest {
    synchronizer: TriggerSynchronizer,
}

impl IoManifest {
    /// Build from configuration.
    pub fn from_config(config: &IoConfig) -> Self {
        Self {
            synchronizer: TriggerSynchronizer::new(config.synchronization.match_mode),
        }
    }

    /// Synchronizer used on prepare.
    pub fn synchronizer(&self) -> &TriggerSynchronizer {
        &self.synchronizer
    }

    /// Handle a lifecycle event. Returns the synchronization report when the
    /// event triggered one.
    pub fn handle<C>(&self, event: LifecycleEvent, controller: &mut C) -> AppResult<Option<SyncReport>>
    where
        C: Controller + ?Sized,
    {
        match event {
            LifecycleEvent::ExperimentPrepare => self.synchronizer.connect_trigger(controller).map(Some),
            other => {
                debug!(event = %other, "No IO action for event");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchMode;
    use crate::hardware::{DaqEngine, Direction, IoController, Timing};
    use std::sync::Arc;

    fn rig() -> IoController {
        let mut controller = IoController::new();
        controller
            .register(Arc::new(
                DaqEngine::new("NI_audio").with_channel("speaker", "PXI1Slot7/ao0", Direction::Out, Timing::Hw, true),
            ))
            .unwrap();
        controller
            .register(Arc::new(
                DaqEngine::new("NI_mic").with_channel("mic", "PXI1Slot8/ai0", Direction::In, Timing::Hw, true),
            ))
            .unwrap();
        controller
    }

    #[test]
    fn prepare_runs_synchronization() {
        let mut controller = rig();
        let manifest = IoManifest::default();

        let report = manifest
            .handle(LifecycleEvent::ExperimentPrepare, &mut controller)
            .unwrap()
            .unwrap();

        assert_eq!(report.master_engine(), Some("NI_audio"));
        assert_eq!(controller.master_engine().map(|e| e.name().to_string()).as_deref(), Some("NI_audio"));
    }

    #[test]
    fn other_events_leave_wiring_alone() {
        let mut controller = rig();
        let manifest = IoManifest::default();

        for event in [LifecycleEvent::ExperimentStart, LifecycleEvent::ExperimentEnd] {
            assert!(manifest.handle(event, &mut controller).unwrap().is_none());
        }
        assert!(controller.master_engine().is_none());
    }

    #[test]
    fn takes_match_mode_from_config() {
        let config = IoConfig::from_toml_str("[synchronization]\nmatch_mode = \"substring\"\n").unwrap();
        let manifest = IoManifest::from_config(&config);
        assert_eq!(manifest.synchronizer().match_mode(), MatchMode::Substring);
        assert_eq!(LifecycleEvent::ExperimentPrepare.to_string(), "experiment_prepare");
    }
}
