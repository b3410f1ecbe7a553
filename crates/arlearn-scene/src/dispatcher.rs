//! Detection dispatcher
//!
//! Turns tracking events into topic activations. Only one topic is current
//! at a time; further acquisitions are ignored until [`DetectionDispatcher::reset`].

use std::fmt;

use arlearn_content::DetectionMap;
use arlearn_core::{AnchorId, ArError, ArResult, TargetIndex, TopicId, TrackingEvent, TrackingEventKind};

/// What the dispatcher drives on activation
pub trait DetectionSink {
    /// Build the topic's scene, enter the AR-ready state, show the result
    fn activate(&mut self, topic: TopicId, target: TargetIndex) -> ArResult<()>;

    /// Hold the active topic's timeline until the advance control. Returns
    /// whether a hold was placed.
    fn pause_timeline(&mut self, topic: TopicId) -> bool;

    /// Tear down the active scene
    fn deactivate(&mut self);

    /// Static target configuration of the anchor that fired an event
    fn anchor_target(&self, anchor: AnchorId) -> Option<TargetIndex>;
}

/// Why an event had no effect
#[derive(Clone, Debug, PartialEq)]
pub enum IgnoreReason {
    /// Neither the payload nor the anchor gave a target index
    MissingIndex,
    UnknownTarget(TargetIndex),
    /// Another acquisition already activated this topic
    AlreadyActive(TopicId),
    /// Lost event for a topic that is not active
    NotActive(TopicId),
    /// Lost event for the active topic with no running timeline to hold
    NothingToPause(TopicId),
    /// The sink failed to activate the topic
    ActivationFailed(ArError),
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::MissingIndex => write!(f, "no target index"),
            IgnoreReason::UnknownTarget(t) => write!(f, "unknown target {}", t),
            IgnoreReason::AlreadyActive(t) => write!(f, "topic {} already active", t),
            IgnoreReason::NotActive(t) => write!(f, "topic {} not active", t),
            IgnoreReason::NothingToPause(t) => write!(f, "topic {} has nothing to pause", t),
            IgnoreReason::ActivationFailed(e) => write!(f, "activation failed: {}", e),
        }
    }
}

/// Result of dispatching one event
#[derive(Clone, Debug, PartialEq)]
pub enum DispatchOutcome {
    Activated(TopicId),
    Paused(TopicId),
    Ignored(IgnoreReason),
}

/// Dispatch counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub found: u64,
    pub lost: u64,
    pub activations: u64,
    pub ignored: u64,
}

/// Single-flight detection dispatcher
#[derive(Clone, Debug)]
pub struct DetectionDispatcher {
    mapping: DetectionMap,
    current: Option<TopicId>,
    stats: DispatchStats,
}

impl DetectionDispatcher {
    pub fn new(mapping: DetectionMap) -> Self {
        DetectionDispatcher {
            mapping,
            current: None,
            stats: DispatchStats::default(),
        }
    }

    /// Topic activated by the last successful acquisition
    pub fn current_topic(&self) -> Option<TopicId> {
        self.current
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn mapping(&self) -> &DetectionMap {
        &self.mapping
    }

    /// Route one tracking event
    pub fn handle(&mut self, event: TrackingEvent, sink: &mut dyn DetectionSink) -> DispatchOutcome {
        match event.kind {
            TrackingEventKind::Found => self.stats.found += 1,
            TrackingEventKind::Lost => self.stats.lost += 1,
        }

        let outcome = match self.resolve(&event, &*sink) {
            Ok(target) => match event.kind {
                TrackingEventKind::Found => self.on_found(target, sink),
                TrackingEventKind::Lost => self.on_lost(target, sink),
            },
            Err(reason) => DispatchOutcome::Ignored(reason),
        };

        if let DispatchOutcome::Ignored(reason) = &outcome {
            self.stats.ignored += 1;
            tracing::debug!(event = event.kind.as_str(), reason = %reason, "tracking event ignored");
        }
        outcome
    }

    /// Payload index first, then the firing anchor's configuration
    fn resolve(&self, event: &TrackingEvent, sink: &dyn DetectionSink) -> Result<TargetIndex, IgnoreReason> {
        if let Some(index) = event.target_index {
            return Ok(index);
        }
        match event.anchor.and_then(|a| sink.anchor_target(a)) {
            Some(index) => {
                tracing::debug!(anchor = ?event.anchor, index = %index, "target index read from anchor");
                Ok(index)
            }
            None => {
                tracing::warn!(event = event.kind.as_str(), "could not determine target index");
                Err(IgnoreReason::MissingIndex)
            }
        }
    }

    fn on_found(&mut self, target: TargetIndex, sink: &mut dyn DetectionSink) -> DispatchOutcome {
        let topic = match self.mapping.topic_for(target) {
            Ok(topic) => topic,
            Err(e) => {
                tracing::warn!(index = %target, error = %e, "target found with no topic");
                return DispatchOutcome::Ignored(IgnoreReason::UnknownTarget(target));
            }
        };

        if let Some(active) = self.current {
            return DispatchOutcome::Ignored(IgnoreReason::AlreadyActive(active));
        }

        tracing::info!(index = %target, topic = %topic, "target found");
        self.current = Some(topic);
        match sink.activate(topic, target) {
            Ok(()) => {
                self.stats.activations += 1;
                DispatchOutcome::Activated(topic)
            }
            Err(e) => {
                self.current = None;
                tracing::error!(topic = %topic, error = %e, "topic activation failed");
                DispatchOutcome::Ignored(IgnoreReason::ActivationFailed(e))
            }
        }
    }

    fn on_lost(&mut self, target: TargetIndex, sink: &mut dyn DetectionSink) -> DispatchOutcome {
        let topic = match self.mapping.topic_for(target) {
            Ok(topic) => topic,
            Err(_) => return DispatchOutcome::Ignored(IgnoreReason::UnknownTarget(target)),
        };
        if self.current != Some(topic) {
            return DispatchOutcome::Ignored(IgnoreReason::NotActive(topic));
        }

        tracing::info!(index = %target, topic = %topic, "target lost");
        if sink.pause_timeline(topic) {
            DispatchOutcome::Paused(topic)
        } else {
            DispatchOutcome::Ignored(IgnoreReason::NothingToPause(topic))
        }
    }

    /// Clear the current topic and dispose its scene
    pub fn reset(&mut self, sink: &mut dyn DetectionSink) {
        if let Some(topic) = self.current.take() {
            tracing::debug!(topic = %topic, "detection reset");
        }
        sink.deactivate();
    }

    /// Simulate an acquisition without a camera
    pub fn manual_detect(&mut self, index: u32, sink: &mut dyn DetectionSink) -> DispatchOutcome {
        tracing::info!(index, "manual detection");
        self.handle(TrackingEvent::found(TargetIndex::new(index)), sink)
    }
}
