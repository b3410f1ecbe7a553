//! Tracking backend seam
//!
//! The image-tracking library does the camera work. It is driven through
//! [`TrackingBackend`]; everything above this trait is library agnostic.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use arlearn_core::{AnchorId, ArError, ArResult, ListenerId, TargetIndex, TrackingEvent};

use crate::scene::SceneNode;

/// Image-tracking library
pub trait TrackingBackend {
    /// Camera and tracking are usable on this device
    fn is_available(&self) -> bool;

    /// Start scanning. Fails with `TrackingUnavailable` when unsupported.
    fn start(&mut self) -> ArResult<()>;

    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Create an anchor entity bound to a target index
    fn create_anchor(&mut self, target: TargetIndex) -> ArResult<AnchorId>;

    /// Static target configuration of an anchor
    fn anchor_target(&self, anchor: AnchorId) -> Option<TargetIndex>;

    /// Attach content nodes under an anchor
    fn attach_content(&mut self, anchor: AnchorId, nodes: &[SceneNode]) -> ArResult<()>;

    /// Forward found/lost events of an anchor
    fn add_listener(&mut self, anchor: AnchorId) -> ArResult<ListenerId>;

    fn remove_listener(&mut self, listener: ListenerId) -> bool;

    /// Remove an anchor and everything attached to it
    fn remove_anchor(&mut self, anchor: AnchorId) -> bool;

    /// Drain events produced since the last poll
    fn poll_events(&mut self) -> Vec<TrackingEvent>;

    /// Let simulated backends move their camera along
    fn advance(&mut self, _dt: Duration) {}
}

#[derive(Clone, Debug)]
struct AnchorEntry {
    target: TargetIndex,
    content: Vec<String>,
}

/// Deterministic in-process backend. Events are queued by the caller and
/// delivered on the next poll while scanning.
#[derive(Clone, Debug)]
pub struct LoopbackBackend {
    available: bool,
    running: bool,
    anchors: BTreeMap<AnchorId, AnchorEntry>,
    listeners: BTreeMap<ListenerId, AnchorId>,
    next_id: u64,
    queue: VecDeque<TrackingEvent>,
    fail_listeners: bool,
    fail_attach: bool,
}

impl LoopbackBackend {
    pub fn new() -> Self {
        LoopbackBackend {
            available: true,
            running: false,
            anchors: BTreeMap::new(),
            listeners: BTreeMap::new(),
            next_id: 1,
            queue: VecDeque::new(),
            fail_listeners: false,
            fail_attach: false,
        }
    }

    /// A device without camera or tracking support
    pub fn unavailable() -> Self {
        LoopbackBackend {
            available: false,
            ..Self::new()
        }
    }

    pub fn push(&mut self, event: TrackingEvent) {
        self.queue.push_back(event);
    }

    pub fn found(&mut self, index: u32) {
        self.push(TrackingEvent::found(TargetIndex::new(index)));
    }

    pub fn lost(&mut self, index: u32) {
        self.push(TrackingEvent::lost(TargetIndex::new(index)));
    }

    /// Make `add_listener` fail
    pub fn fail_listeners(&mut self, fail: bool) {
        self.fail_listeners = fail;
    }

    /// Make `attach_content` fail
    pub fn fail_attach(&mut self, fail: bool) {
        self.fail_attach = fail;
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Ids of the nodes attached to an anchor
    pub fn content(&self, anchor: AnchorId) -> Option<&[String]> {
        self.anchors.get(&anchor).map(|a| a.content.as_slice())
    }

    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for LoopbackBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackingBackend for LoopbackBackend {
    fn is_available(&self) -> bool {
        self.available
    }

    fn start(&mut self) -> ArResult<()> {
        if !self.available {
            return Err(ArError::TrackingUnavailable);
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
        self.queue.clear();
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn create_anchor(&mut self, target: TargetIndex) -> ArResult<AnchorId> {
        if !self.available {
            return Err(ArError::TrackingUnavailable);
        }
        let id = AnchorId::new(self.next());
        self.anchors.insert(
            id,
            AnchorEntry {
                target,
                content: Vec::new(),
            },
        );
        Ok(id)
    }

    fn anchor_target(&self, anchor: AnchorId) -> Option<TargetIndex> {
        self.anchors.get(&anchor).map(|a| a.target)
    }

    fn attach_content(&mut self, anchor: AnchorId, nodes: &[SceneNode]) -> ArResult<()> {
        if self.fail_attach {
            return Err(ArError::Backend("content rejected".into()));
        }
        let entry = self
            .anchors
            .get_mut(&anchor)
            .ok_or_else(|| ArError::Backend(format!("no anchor {}", anchor)))?;
        entry.content = nodes.iter().map(|n| n.id().to_string()).collect();
        Ok(())
    }

    fn add_listener(&mut self, anchor: AnchorId) -> ArResult<ListenerId> {
        if self.fail_listeners {
            return Err(ArError::Backend("listener rejected".into()));
        }
        if !self.anchors.contains_key(&anchor) {
            return Err(ArError::Backend(format!("no anchor {}", anchor)));
        }
        let id = ListenerId::new(self.next());
        self.listeners.insert(id, anchor);
        Ok(id)
    }

    fn remove_listener(&mut self, listener: ListenerId) -> bool {
        self.listeners.remove(&listener).is_some()
    }

    fn remove_anchor(&mut self, anchor: AnchorId) -> bool {
        self.listeners.retain(|_, a| *a != anchor);
        self.anchors.remove(&anchor).is_some()
    }

    fn poll_events(&mut self) -> Vec<TrackingEvent> {
        if !self.running {
            return Vec::new();
        }
        self.queue.drain(..).collect()
    }
}
