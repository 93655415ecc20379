//! IO controller: the ordered engine registry.
//!
//! The controller owns the engines of one experiment run in registration
//! order and records which engine provides the authoritative start trigger.
//! The master engine is written only through
//! [`Controller::set_master_engine`].

use crate::config::IoConfig;
use crate::error::{AppResult, SyncError};
use crate::hardware::channel::Channel;
use crate::hardware::engine::{DaqEngine, Engine};
use std::sync::Arc;
use tracing::debug;

/// Engine registry seen by the trigger synchronizer.
pub trait Controller {
    /// Engines in registration order.
    fn engines(&self) -> Vec<Arc<dyn Engine>>;

    /// Engine whose start trigger all other engines wait on.
    fn master_engine(&self) -> Option<Arc<dyn Engine>>;

    /// Designate the master engine.
    fn set_master_engine(&mut self, engine: Arc<dyn Engine>);
}

/// Default [`Controller`] implementation.
#[derive(Debug, Default)]
pub struct IoController {
    engines: Vec<Arc<dyn Engine>>,
    master_engine: Option<Arc<dyn Engine>>,
}

impl IoController {
    /// Create an empty controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a controller from configuration, registering enabled engines in
    /// file order.
    pub fn from_config(config: &IoConfig) -> AppResult<Self> {
        let mut controller = Self::new();
        for definition in config.enabled_engines() {
            let mut engine = DaqEngine::new(&definition.name);
            for ch in &definition.channels {
                let channel = Channel::new(&ch.name, &ch.channel, &definition.name, ch.direction)
                    .with_timing(ch.timing)
                    .with_active(ch.active)
                    .with_start_trigger(ch.start_trigger.clone());
                engine.add_channel(channel);
            }
            controller.register(Arc::new(engine))?;
        }
        Ok(controller)
    }

    /// Register an engine. Names must be unique.
    pub fn register(&mut self, engine: Arc<dyn Engine>) -> AppResult<()> {
        if self.engine(engine.name()).is_some() {
            return Err(SyncError::DuplicateEngine(engine.name().to_string()));
        }
        debug!(engine = engine.name(), position = self.engines.len(), "Registered engine");
        self.engines.push(engine);
        Ok(())
    }

    /// Look up an engine by name.
    pub fn engine(&self, name: &str) -> Option<Arc<dyn Engine>> {
        self.engines.iter().find(|e| e.name() == name).cloned()
    }

    /// Number of registered engines.
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// True if no engines are registered.
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl Controller for IoController {
    fn engines(&self) -> Vec<Arc<dyn Engine>> {
        self.engines.clone()
    }

    fn master_engine(&self) -> Option<Arc<dyn Engine>> {
        self.master_engine.clone()
    }

    fn set_master_engine(&mut self, engine: Arc<dyn Engine>) {
        debug!(engine = engine.name(), "Master engine set");
        self.master_engine = Some(engine);
    }
}
