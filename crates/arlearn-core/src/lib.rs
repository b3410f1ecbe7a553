//! arlearn Core - Fundamental types and primitives
//!
//! This crate defines the core types shared by every arlearn crate:
//! - Identifiers (TopicId, TargetIndex, AnchorId, ListenerId, TimerId)
//! - Simulated time (SimTime)
//! - Tracking events delivered by the image-tracking backend
//! - The error taxonomy (ArError, ArResult)

pub mod id;
pub mod time;
pub mod event;
pub mod error;

pub use id::*;
pub use time::*;
pub use event::*;
pub use error::*;
