//! arlearn Flow - The UI state machine
//!
//! Exactly one [`AppState`] is active. Transitions run the old state's exit
//! hooks, switch, run the new state's enter hooks, then notify observers.
//! Every hook is isolated: a failing hook is logged and the rest still run.
//!
//! The machine owns the [`ViewSurface`]; region visibility only changes
//! through transitions.

pub mod state;
pub mod view;
pub mod hook;
pub mod machine;

pub use state::*;
pub use view::*;
pub use hook::*;
pub use machine::*;
