//! Simulated camera
//!
//! A scripted tracking backend: posters enter and leave the view at fixed
//! times, and a seeded RNG adds the tracking noise seen on real devices:
//! - Lost/found flicker while a poster is held in view
//! - Events that arrive without a target index

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use arlearn_core::{AnchorId, ArError, ArResult, ListenerId, TargetIndex, TrackingEvent, TrackingEventKind};
use arlearn_scene::{SceneNode, TrackingBackend};

/// Tracking noise configuration
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    pub seed: u64,
    /// Chance per advance that a held poster blips lost and found again
    pub flicker_prob: f64,
    /// Chance that an event carries only its anchor
    pub missing_index_prob: f64,
    /// Device has camera and tracking
    pub available: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            seed: 7,
            flicker_prob: 0.0,
            missing_index_prob: 0.0,
            available: true,
        }
    }
}

impl TrackerConfig {
    /// Steady hands, good light
    pub fn steady() -> Self {
        Self::default()
    }

    /// Shaky camera: frequent flicker, some events without detail
    pub fn shaky() -> Self {
        TrackerConfig {
            flicker_prob: 0.2,
            missing_index_prob: 0.25,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// One poster held in front of the camera
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sighting {
    pub target: TargetIndex,
    /// Camera time at which the poster enters the view
    pub at: Duration,
    /// How long it stays in view
    pub hold: Duration,
}

#[derive(Clone, Copy, Debug)]
enum CameraMove {
    Enter(TargetIndex),
    Held(TargetIndex),
    Leave(TargetIndex),
}

#[derive(Clone, Debug)]
struct ScriptedSighting {
    sighting: Sighting,
    in_view: bool,
    done: bool,
}

/// Scripted, noisy tracking backend
#[derive(Debug)]
pub struct SimulatedTracker {
    config: TrackerConfig,
    rng: StdRng,
    running: bool,
    elapsed: Duration,
    script: Vec<ScriptedSighting>,
    anchors: BTreeMap<AnchorId, TargetIndex>,
    listeners: BTreeMap<ListenerId, AnchorId>,
    next_id: u64,
    queue: VecDeque<TrackingEvent>,
    emitted: u64,
}

impl SimulatedTracker {
    pub fn new(config: TrackerConfig) -> Self {
        SimulatedTracker {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            running: false,
            elapsed: Duration::ZERO,
            script: Vec::new(),
            anchors: BTreeMap::new(),
            listeners: BTreeMap::new(),
            next_id: 1,
            queue: VecDeque::new(),
            emitted: 0,
        }
    }

    /// Hold poster `target` in view from `at` for `hold`
    pub fn show(mut self, target: u32, at: Duration, hold: Duration) -> Self {
        self.script.push(ScriptedSighting {
            sighting: Sighting {
                target: TargetIndex::new(target),
                at,
                hold,
            },
            in_view: false,
            done: false,
        });
        self
    }

    /// Camera time since construction
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Events queued over the tracker's lifetime
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn sightings(&self) -> impl Iterator<Item = &Sighting> {
        self.script.iter().map(|s| &s.sighting)
    }

    fn emit(&mut self, kind: TrackingEventKind, target: TargetIndex) {
        if !self.running {
            return;
        }
        let anchor = self
            .anchors
            .iter()
            .find(|(_, t)| **t == target)
            .map(|(a, _)| *a);

        let event = match anchor {
            Some(anchor) if self.rng.gen_bool(self.config.missing_index_prob) => {
                TrackingEvent::from_anchor(kind, anchor)
            }
            Some(anchor) => TrackingEvent::new(kind, Some(target)).with_anchor(anchor),
            None => TrackingEvent::new(kind, Some(target)),
        };
        tracing::trace!(kind = kind.as_str(), index = %target, "simulated tracking event");
        self.queue.push_back(event);
        self.emitted += 1;
    }

    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl TrackingBackend for SimulatedTracker {
    fn is_available(&self) -> bool {
        self.config.available
    }

    fn start(&mut self) -> ArResult<()> {
        if !self.config.available {
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
        if !self.config.available {
            return Err(ArError::TrackingUnavailable);
        }
        let id = AnchorId::new(self.next());
        self.anchors.insert(id, target);
        Ok(id)
    }

    fn anchor_target(&self, anchor: AnchorId) -> Option<TargetIndex> {
        self.anchors.get(&anchor).copied()
    }

    fn attach_content(&mut self, anchor: AnchorId, _nodes: &[SceneNode]) -> ArResult<()> {
        if !self.anchors.contains_key(&anchor) {
            return Err(ArError::Backend(format!("no anchor {}", anchor)));
        }
        Ok(())
    }

    fn add_listener(&mut self, anchor: AnchorId) -> ArResult<ListenerId> {
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
        self.queue.drain(..).collect()
    }

    fn advance(&mut self, dt: Duration) {
        self.elapsed += dt;
        let now = self.elapsed;

        let mut moves = Vec::new();
        for entry in &mut self.script {
            if entry.done {
                continue;
            }
            let target = entry.sighting.target;
            let end = entry.sighting.at + entry.sighting.hold;
            if now >= end {
                if entry.in_view {
                    moves.push(CameraMove::Leave(target));
                }
                entry.in_view = false;
                entry.done = true;
            } else if entry.in_view {
                moves.push(CameraMove::Held(target));
            } else if now >= entry.sighting.at {
                entry.in_view = true;
                moves.push(CameraMove::Enter(target));
            }
        }

        for step in moves {
            match step {
                CameraMove::Enter(target) => self.emit(TrackingEventKind::Found, target),
                CameraMove::Leave(target) => self.emit(TrackingEventKind::Lost, target),
                CameraMove::Held(target) => {
                    if self.config.flicker_prob > 0.0 && self.rng.gen_bool(self.config.flicker_prob) {
                        self.emit(TrackingEventKind::Lost, target);
                        self.emit(TrackingEventKind::Found, target);
                    }
                }
            }
        }
    }
}
