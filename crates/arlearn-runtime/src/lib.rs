//! arlearn Runtime - Application shell
//!
//! Wires the state machine, detection dispatcher, scene builder, timeline
//! sequencer and progress store into one [`App`] driven by a cooperative
//! tick. Each tick runs six stages:
//! 1. Advance the simulated clock
//! 2. Fire app timers (AR-ready dwell)
//! 3. Poll the tracking backend
//! 4. Dispatch tracking events
//! 5. Tick the timeline against the live scene
//! 6. Move to the video when the timeline completes

pub mod app;
pub mod config;
pub mod logging;
pub mod status;

pub use app::*;
pub use config::*;
pub use logging::*;
pub use status::*;
