//! Target-index to topic mapping
//!
//! The compiled tracking-target file lists one image per poster. Index `i`
//! of that file shows topic `mapping[i]`. The relation must be a bijection
//! over the configured target count; an index outside it is an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use arlearn_core::{ArError, ArResult, TargetIndex, TopicId};

/// One row of the mapping as written in content files
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionEntry {
    pub target: TargetIndex,
    pub topic: TopicId,
}

/// Validated target-index to topic bijection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectionMap {
    by_target: BTreeMap<TargetIndex, TopicId>,
    by_topic: BTreeMap<TopicId, TargetIndex>,
}

impl DetectionMap {
    /// Build and validate a mapping over targets `0..target_count` and
    /// topics `1..=target_count`
    pub fn new(
        target_count: u32,
        entries: impl IntoIterator<Item = DetectionEntry>,
    ) -> ArResult<Self> {
        let mut by_target = BTreeMap::new();
        let mut by_topic = BTreeMap::new();

        for DetectionEntry { target, topic } in entries {
            if target.get() >= target_count {
                return Err(ArError::Content(format!(
                    "target {} outside 0..{}",
                    target, target_count
                )));
            }
            if topic.get() == 0 || u32::from(topic.get()) > target_count {
                return Err(ArError::Content(format!(
                    "topic {} outside 1..={}",
                    topic, target_count
                )));
            }
            if by_target.insert(target, topic).is_some() {
                return Err(ArError::Content(format!("target {} mapped twice", target)));
            }
            if by_topic.insert(topic, target).is_some() {
                return Err(ArError::Content(format!("topic {} mapped twice", topic)));
            }
        }

        if by_target.len() as u32 != target_count {
            return Err(ArError::Content(format!(
                "mapping covers {} of {} targets",
                by_target.len(),
                target_count
            )));
        }

        Ok(DetectionMap { by_target, by_topic })
    }

    /// Index `i` shows topic `i + 1`
    pub fn identity(target_count: u8) -> Self {
        let by_target: BTreeMap<_, _> = (0..target_count)
            .map(|i| (TargetIndex::new(u32::from(i)), TopicId::new(i + 1)))
            .collect();
        let by_topic = by_target.iter().map(|(t, p)| (*p, *t)).collect();
        DetectionMap { by_target, by_topic }
    }

    /// Topic shown by a target
    pub fn topic_for(&self, target: TargetIndex) -> ArResult<TopicId> {
        self.by_target
            .get(&target)
            .copied()
            .ok_or(ArError::UnknownTarget(target))
    }

    /// Target that shows a topic
    pub fn target_for(&self, topic: TopicId) -> ArResult<TargetIndex> {
        self.by_topic
            .get(&topic)
            .copied()
            .ok_or(ArError::UnknownTopic(topic))
    }

    pub fn len(&self) -> usize {
        self.by_target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }

    /// Pairs in target order
    pub fn iter(&self) -> impl Iterator<Item = (TargetIndex, TopicId)> + '_ {
        self.by_target.iter().map(|(t, p)| (*t, *p))
    }
}
