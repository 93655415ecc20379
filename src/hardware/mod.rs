//! Hardware model: channels, engines and the IO controller.

pub mod channel;
pub mod controller;
pub mod engine;

pub use channel::{Channel, ChannelPath, Direction, Timing};
pub use controller::{Controller, IoController};
pub use engine::{DaqEngine, Engine};
