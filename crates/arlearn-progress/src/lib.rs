//! arlearn Progress - Which topics the learner has finished
//!
//! The completion set survives restarts through a [`KeyValueStorage`]
//! backend. Loading never fails: a missing or unreadable record means no
//! progress. Saving never fails either: a storage error is logged and the
//! store keeps working in memory.

pub mod storage;
pub mod record;
pub mod store;

pub use storage::*;
pub use record::*;
pub use store::*;
