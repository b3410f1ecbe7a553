//! State hooks

use thiserror::Error;

use crate::state::AppState;
use crate::view::ViewSurface;

/// A hook failed. Logged with state context, never propagated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HookError {
    #[error("Missing element: {0}")]
    MissingElement(String),

    #[error("Hook failed: {0}")]
    Failed(String),
}

/// When a hook runs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookKind {
    Enter,
    Exit,
}

impl HookKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HookKind::Enter => "enter",
            HookKind::Exit => "exit",
        }
    }
}

/// What a hook sees
pub struct HookContext<'a> {
    /// State the hook belongs to
    pub state: AppState,
    /// State being left
    pub from: AppState,
    /// State being entered
    pub to: AppState,
    pub view: &'a mut dyn ViewSurface,
}

/// Enter or exit hook
pub type Hook = Box<dyn FnMut(&mut HookContext<'_>) -> Result<(), HookError>>;

/// Standard enter hook: hide everything, show this state's regions
pub(crate) fn show_regions(state: AppState) -> Hook {
    Box::new(move |ctx: &mut HookContext<'_>| {
        for region in crate::state::all_regions() {
            ctx.view.set_visible(region, false);
        }
        for region in state.regions() {
            ctx.view.set_visible(region, true);
        }
        Ok(())
    })
}

/// Standard exit hook: hide this state's regions
pub(crate) fn hide_regions(state: AppState) -> Hook {
    Box::new(move |ctx: &mut HookContext<'_>| {
        for region in state.regions() {
            ctx.view.set_visible(region, false);
        }
        Ok(())
    })
}
