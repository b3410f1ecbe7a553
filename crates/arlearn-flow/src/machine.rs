//! State machine

use std::collections::HashMap;

use serde::Serialize;

use arlearn_core::{ArError, ArResult};

use crate::hook::{hide_regions, show_regions, Hook, HookContext, HookError, HookKind};
use crate::state::AppState;
use crate::view::{DisplayContent, ViewSurface};

/// Observer registration handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Result of a transition request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: AppState,
    pub to: AppState,
    /// False when the target was already current
    pub changed: bool,
    /// Hooks that failed during this transition
    pub hook_failures: usize,
    /// Sequence number of the transition, counting from 1
    pub seq: u64,
}

/// Transition observer
pub type Observer = Box<dyn FnMut(&Transition)>;

#[derive(Default)]
struct StateHooks {
    enter: Vec<Hook>,
    exit: Vec<Hook>,
}

/// Finite UI state machine
pub struct StateMachine {
    current: AppState,
    table: HashMap<AppState, StateHooks>,
    view: Box<dyn ViewSurface>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
    transitions: u64,
}

impl StateMachine {
    /// Start in `Loading` with the standard show/hide hooks for every state
    pub fn new(view: Box<dyn ViewSurface>) -> Self {
        let mut table = HashMap::new();
        for state in AppState::ALL {
            table.insert(
                state,
                StateHooks {
                    enter: vec![show_regions(state)],
                    exit: vec![hide_regions(state)],
                },
            );
        }

        let mut machine = StateMachine {
            current: AppState::Loading,
            table,
            view,
            observers: Vec::new(),
            next_observer: 1,
            transitions: 0,
        };
        machine.run_hooks(AppState::Loading, HookKind::Enter, AppState::Loading, AppState::Loading);
        machine
    }

    pub fn current_state(&self) -> AppState {
        self.current
    }

    pub fn is_in_state(&self, state: AppState) -> bool {
        self.current == state
    }

    /// Number of transitions that changed state
    pub fn transition_count(&self) -> u64 {
        self.transitions
    }

    /// Move to `target`. Unknown targets are rejected and leave the current
    /// state unchanged; the current state itself is a no-op.
    pub fn transition_to(&mut self, target: AppState) -> ArResult<Transition> {
        if !self.table.contains_key(&target) {
            tracing::error!(state = %target, "invalid state");
            return Err(ArError::InvalidState(target.as_str().to_string()));
        }

        let from = self.current;
        if from == target {
            tracing::debug!(state = %target, "already in state");
            return Ok(Transition {
                from,
                to: target,
                changed: false,
                hook_failures: 0,
                seq: self.transitions,
            });
        }

        let mut failures = self.run_hooks(from, HookKind::Exit, from, target);
        self.current = target;
        failures += self.run_hooks(target, HookKind::Enter, from, target);
        self.transitions += 1;

        let transition = Transition {
            from,
            to: target,
            changed: true,
            hook_failures: failures,
            seq: self.transitions,
        };
        tracing::info!(from = %from, to = %target, "state changed");

        for (_, observer) in self.observers.iter_mut() {
            observer(&transition);
        }
        Ok(transition)
    }

    /// Transition by state name
    pub fn transition_to_named(&mut self, name: &str) -> ArResult<Transition> {
        let target = name.parse::<AppState>().map_err(|e| {
            tracing::error!(state = name, "invalid state");
            e
        })?;
        self.transition_to(target)
    }

    fn run_hooks(&mut self, state: AppState, kind: HookKind, from: AppState, to: AppState) -> usize {
        let Some(hooks) = self.table.get_mut(&state) else {
            return 0;
        };
        let hooks = match kind {
            HookKind::Enter => &mut hooks.enter,
            HookKind::Exit => &mut hooks.exit,
        };

        let mut ctx = HookContext {
            state,
            from,
            to,
            view: self.view.as_mut(),
        };
        let mut failures = 0;
        for (index, hook) in hooks.iter_mut().enumerate() {
            if let Err(e) = hook(&mut ctx) {
                failures += 1;
                tracing::warn!(
                    state = %state,
                    hook = kind.as_str(),
                    index,
                    error = %e,
                    "state hook failed"
                );
            }
        }
        failures
    }

    /// Append a hook to a state. Runs after the standard hooks.
    pub fn add_state_hook(
        &mut self,
        state: AppState,
        kind: HookKind,
        hook: impl FnMut(&mut HookContext<'_>) -> Result<(), HookError> + 'static,
    ) -> ArResult<()> {
        let hook: Hook = Box::new(hook);
        let hooks = self
            .table
            .get_mut(&state)
            .ok_or_else(|| ArError::InvalidState(state.as_str().to_string()))?;
        match kind {
            HookKind::Enter => hooks.enter.push(hook),
            HookKind::Exit => hooks.exit.push(hook),
        }
        Ok(())
    }

    /// Take a state out of the table; later transitions to it are rejected.
    /// The current state cannot be removed.
    pub fn remove_state(&mut self, state: AppState) -> bool {
        if state == self.current {
            return false;
        }
        self.table.remove(&state).is_some()
    }

    /// Register an observer, called after every state change in
    /// registration order
    pub fn subscribe(&mut self, observer: impl FnMut(&Transition) + 'static) -> ObserverId {
        let observer: Observer = Box::new(observer);
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, observer));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    /// Refresh display text or lists without a transition
    pub fn update_display<R>(&mut self, f: impl FnOnce(&mut DisplayContent<'_>) -> R) -> R {
        let mut content = DisplayContent::new(self.view.as_mut());
        f(&mut content)
    }

    pub fn view(&self) -> &dyn ViewSurface {
        self.view.as_ref()
    }
}

impl std::fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("transitions", &self.transitions)
            .field("observers", &self.observers.len())
            .finish()
    }
}
