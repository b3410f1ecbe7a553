//! arlearn Content - Static learning content
//!
//! This crate holds everything that is configuration rather than behaviour:
//! - Topic metadata, quiz questions, summaries and AR asset lists
//! - Per-topic timeline scripts (data for the single timeline interpreter)
//! - The target-index to topic bijection
//! - Quiz scoring
//!
//! Content is loaded once at startup, validated, and never mutated.

pub mod asset;
pub mod script;
pub mod topic;
pub mod detection;
pub mod quiz;
pub mod registry;

pub use asset::*;
pub use script::*;
pub use topic::*;
pub use detection::*;
pub use quiz::*;
pub use registry::*;
