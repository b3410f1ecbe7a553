//! arlearn Scene - AR content for the detected poster
//!
//! The tracking library is reached through [`TrackingBackend`]. A detected
//! target index goes through the [`DetectionDispatcher`], which asks its
//! [`DetectionSink`] to activate the mapped topic. Activation builds a
//! [`Scene`] with the [`SceneBuilder`]: one anchor, one listener, and a
//! placeholder node per topic asset. The live scene is what the timeline
//! animates.
//!
//! At most one scene is alive at a time.

pub mod backend;
pub mod scene;
pub mod builder;
pub mod dispatcher;

pub use backend::*;
pub use scene::*;
pub use builder::*;
pub use dispatcher::*;
