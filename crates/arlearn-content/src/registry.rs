//! Topic registry
//!
//! Loaded once from JSON and validated before anything else starts. All
//! lookups after that are infallible reads; accessors for unknown topics
//! return neutral fallbacks instead of failing.

use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;

use arlearn_core::{ArError, ArResult, TopicId};

use crate::detection::{DetectionEntry, DetectionMap};
use crate::script::StepSpec;
use crate::topic::{Answer, Feedback, Topic};

/// Content shipped with the app
const BUILTIN_TOPICS: &str = include_str!("../data/topics.json");

pub const UNKNOWN_TOPIC_TITLE: &str = "Unknown Topic";
pub const DEFAULT_TOPIC_ICON: &str = "📚";
pub const NO_QUESTION: &str = "No question available";

static EMPTY_FEEDBACK: Feedback = Feedback {
    perfect: String::new(),
    partial: String::new(),
};

#[derive(Deserialize)]
struct RegistryFile {
    target_count: u32,
    detection: Vec<DetectionEntry>,
    topics: Vec<Topic>,
}

/// Static topic content and the detection mapping
#[derive(Clone, Debug)]
pub struct TopicRegistry {
    topics: BTreeMap<TopicId, Topic>,
    detection: DetectionMap,
}

impl TopicRegistry {
    /// The embedded content
    pub fn builtin() -> ArResult<Self> {
        Self::from_json(BUILTIN_TOPICS)
    }

    /// Parse and validate a registry document
    pub fn from_json(json: &str) -> ArResult<Self> {
        let file: RegistryFile =
            serde_json::from_str(json).map_err(|e| ArError::Content(e.to_string()))?;
        let detection = DetectionMap::new(file.target_count, file.detection)?;
        Self::new(file.topics, detection)
    }

    /// Validate topics against a mapping
    pub fn new(topics: Vec<Topic>, detection: DetectionMap) -> ArResult<Self> {
        let mut by_id = BTreeMap::new();
        for topic in topics {
            validate_topic(&topic)?;
            let id = topic.id;
            if by_id.insert(id, topic).is_some() {
                return Err(ArError::Content(format!("topic {} defined twice", id)));
            }
        }

        // ids must be exactly 1..=N, N matching the target count
        let expected: Vec<TopicId> = (1..=by_id.len())
            .map(|i| TopicId::new(i as u8))
            .collect();
        if by_id.keys().copied().collect::<Vec<_>>() != expected || by_id.len() != detection.len() {
            return Err(ArError::Content(format!(
                "topic ids {:?} do not match targets 1..={}",
                by_id.keys().collect::<Vec<_>>(),
                detection.len()
            )));
        }

        tracing::debug!(topics = by_id.len(), "topic registry loaded");
        Ok(TopicRegistry {
            topics: by_id,
            detection,
        })
    }

    pub fn topic(&self, id: TopicId) -> Option<&Topic> {
        self.topics.get(&id)
    }

    /// Topic or `UnknownTopic`
    pub fn require(&self, id: TopicId) -> ArResult<&Topic> {
        self.topic(id).ok_or(ArError::UnknownTopic(id))
    }

    pub fn contains(&self, id: TopicId) -> bool {
        self.topics.contains_key(&id)
    }

    pub fn detection(&self) -> &DetectionMap {
        &self.detection
    }

    /// Topic ids in order
    pub fn ids(&self) -> impl Iterator<Item = TopicId> + '_ {
        self.topics.keys().copied()
    }

    pub fn topics(&self) -> impl Iterator<Item = &Topic> {
        self.topics.values()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn title(&self, id: TopicId) -> &str {
        self.topic(id).map_or(UNKNOWN_TOPIC_TITLE, |t| t.title.as_str())
    }

    pub fn icon(&self, id: TopicId) -> &str {
        self.topic(id).map_or(DEFAULT_TOPIC_ICON, |t| t.icon.as_str())
    }

    /// None for an unknown topic; the video player shows its own error
    pub fn video_url(&self, id: TopicId) -> Option<&str> {
        self.topic(id).map(|t| t.video_url.as_str())
    }

    pub fn content(&self, id: TopicId) -> &[String] {
        self.topic(id).map(|t| t.content.as_slice()).unwrap_or_default()
    }

    pub fn question(&self, id: TopicId) -> &str {
        self.topic(id).map_or(NO_QUESTION, |t| t.quiz.question.as_str())
    }

    pub fn answers(&self, id: TopicId) -> &[Answer] {
        self.topic(id).map(|t| t.quiz.answers.as_slice()).unwrap_or_default()
    }

    pub fn feedback(&self, id: TopicId) -> &Feedback {
        self.topic(id).map_or(&EMPTY_FEEDBACK, |t| &t.feedback)
    }

    pub fn summary(&self, id: TopicId) -> &[String] {
        self.topic(id).map(|t| t.summary.as_slice()).unwrap_or_default()
    }

    pub fn timeline(&self, id: TopicId) -> &[StepSpec] {
        self.topic(id).map(|t| t.timeline.as_slice()).unwrap_or_default()
    }

    /// Multi-line dump of one topic for debug output
    pub fn describe(&self, id: TopicId) -> String {
        let Some(topic) = self.topic(id) else {
            let available: Vec<String> = self.ids().map(|i| i.to_string()).collect();
            return format!("Topic {} not found; available: {}", id, available.join(", "));
        };

        let mut out = format!("Topic {} {} {}\n", topic.id, topic.icon, topic.title);
        out.push_str(&format!("  video: {}\n", topic.video_url));
        out.push_str(&format!("  question: {}\n", topic.quiz.question));
        for (i, answer) in topic.quiz.answers.iter().enumerate() {
            let mark = if answer.correct { "*" } else { " " };
            out.push_str(&format!("   {}[{}] {}\n", mark, i, answer.text));
        }
        out.push_str(&format!(
            "  assets: {}, steps: {}, pauses: {}\n",
            topic.assets.len(),
            topic.timeline.len(),
            topic.pause_count()
        ));
        out
    }
}

fn validate_topic(topic: &Topic) -> ArResult<()> {
    let fail = |msg: String| Err(ArError::Content(format!("topic {}: {}", topic.id, msg)));

    if topic.quiz.answers.is_empty() {
        return fail("quiz has no answers".into());
    }
    if !topic.quiz.answers.iter().any(|a| a.correct) {
        return fail("quiz has no correct answer".into());
    }

    let mut ids = HashSet::new();
    for asset in &topic.assets {
        if !ids.insert(asset.id.as_str()) {
            return fail(format!("asset {:?} defined twice", asset.id));
        }
    }

    for (index, step) in topic.timeline.iter().enumerate() {
        for selector in step.selectors() {
            if !topic.assets.iter().any(|a| selector.matches(a)) {
                return fail(format!("step {} selector {} matches no asset", index, selector));
            }
        }
        if let StepSpec::Animate(step) = step {
            if step.targets.is_empty() {
                return fail(format!("step {} has no targets", index));
            }
            for range in &step.properties {
                if !range.from.fits(range.property) || !range.to.fits(range.property) {
                    return fail(format!(
                        "step {} has a bad {} range",
                        index,
                        range.property.as_str()
                    ));
                }
            }
        }
    }

    Ok(())
}
