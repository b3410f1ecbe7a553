//! Tracking event definitions
//!
//! The image-tracking backend reports when a printed poster enters or leaves
//! the camera view. The payload may lack the target index; consumers then
//! fall back to the static target configuration of the firing anchor.

use crate::{AnchorId, TargetIndex};

/// Tracking event classification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackingEventKind {
    /// A target was acquired by the camera
    Found,
    /// A previously acquired target left the view
    Lost,
}

impl TrackingEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackingEventKind::Found => "targetFound",
            TrackingEventKind::Lost => "targetLost",
        }
    }
}

/// Event emitted by the tracking backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackingEvent {
    /// Found or lost
    pub kind: TrackingEventKind,
    /// Target index carried in the event detail, if the backend supplied one
    pub target_index: Option<TargetIndex>,
    /// Anchor entity that fired the event, if known
    pub anchor: Option<AnchorId>,
}

impl TrackingEvent {
    pub fn new(kind: TrackingEventKind, target_index: Option<TargetIndex>) -> Self {
        TrackingEvent {
            kind,
            target_index,
            anchor: None,
        }
    }

    /// Target acquired with a known index
    pub fn found(index: TargetIndex) -> Self {
        Self::new(TrackingEventKind::Found, Some(index))
    }

    /// Target lost with a known index
    pub fn lost(index: TargetIndex) -> Self {
        Self::new(TrackingEventKind::Lost, Some(index))
    }

    /// Event fired by an anchor with no detail payload
    pub fn from_anchor(kind: TrackingEventKind, anchor: AnchorId) -> Self {
        TrackingEvent {
            kind,
            target_index: None,
            anchor: Some(anchor),
        }
    }

    pub fn with_anchor(mut self, anchor: AnchorId) -> Self {
        self.anchor = Some(anchor);
        self
    }

    #[inline]
    pub fn is_found(&self) -> bool {
        self.kind == TrackingEventKind::Found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_constructors() {
        let found = TrackingEvent::found(TargetIndex::new(2));
        assert!(found.is_found());
        assert_eq!(found.target_index, Some(TargetIndex(2)));
        assert_eq!(found.anchor, None);

        let lost = TrackingEvent::from_anchor(TrackingEventKind::Lost, AnchorId::new(9));
        assert!(!lost.is_found());
        assert_eq!(lost.target_index, None);
        assert_eq!(lost.anchor, Some(AnchorId(9)));
    }

    #[test]
    fn test_event_kind_names() {
        assert_eq!(TrackingEventKind::Found.as_str(), "targetFound");
        assert_eq!(TrackingEventKind::Lost.as_str(), "targetLost");
    }
}
