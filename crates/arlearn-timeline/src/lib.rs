//! arlearn Timeline - One interpreter for every topic's animated scene
//!
//! Scripts from the topic registry are lowered to engine steps and played
//! on an [`AnimationEngine`]. Pause steps hold the engine until a timer or
//! the user's advance control releases it. Step begin/complete actions are
//! applied to a [`StepTarget`], normally the live AR scene.
//!
//! Everything runs on simulated time passed into [`TimelineSequencer::tick`].

pub mod engine;
pub mod action;
pub mod sequencer;

pub use engine::*;
pub use action::*;
pub use sequencer::*;
