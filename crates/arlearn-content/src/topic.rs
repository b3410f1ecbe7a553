//! Learning topics

use serde::{Deserialize, Serialize};

use arlearn_core::TopicId;

use crate::asset::AssetSpec;
use crate::script::StepSpec;

/// One quiz answer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub correct: bool,
}

/// Multiple-choice question; several answers may be correct
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub question: String,
    pub answers: Vec<Answer>,
}

/// Feedback shown after the quiz
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Feedback {
    pub perfect: String,
    pub partial: String,
}

/// A learning topic, immutable after load
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
    pub icon: String,
    pub video_url: String,
    pub content: Vec<String>,
    pub quiz: Quiz,
    pub feedback: Feedback,
    pub summary: Vec<String>,
    #[serde(default)]
    pub assets: Vec<AssetSpec>,
    #[serde(default)]
    pub timeline: Vec<StepSpec>,
}

impl Topic {
    pub fn asset(&self, id: &str) -> Option<&AssetSpec> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Number of pause steps in the script
    pub fn pause_count(&self) -> usize {
        self.timeline.iter().filter(|s| s.is_pause()).count()
    }
}
