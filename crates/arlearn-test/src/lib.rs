//! arlearn Test Harness - End-to-end simulation
//!
//! This crate provides:
//! - A scripted, noisy tracking backend (SimulatedTracker)
//! - A view that records every write (RecordingView)
//! - A scenario driver that runs whole user sessions against the app
//! - End-to-end and property tests over the full stack

pub mod tracker;
pub mod view;
pub mod scenario;

#[cfg(test)]
mod end_to_end;
#[cfg(test)]
mod properties;

pub use tracker::*;
pub use view::*;
pub use scenario::*;
