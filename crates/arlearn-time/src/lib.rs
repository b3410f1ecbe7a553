//! arlearn Time - Simulated clock and timers
//!
//! This crate implements the suspension points of the cooperative model:
//! - A monotonic simulated clock advanced by host ticks
//! - A cancellable queue of one-shot and repeating timers

pub mod clock;
pub mod timer;

pub use clock::*;
pub use timer::*;
