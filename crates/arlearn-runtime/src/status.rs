//! Status snapshot for debugging and the CLI

use serde::Serialize;

use arlearn_core::TopicId;
use arlearn_flow::AppState;
use arlearn_progress::ProgressSummary;

/// Timeline part of the snapshot
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineStatus {
    pub loaded: bool,
    pub started: bool,
    pub paused: bool,
    pub completed: bool,
    pub playback_rate: f64,
    pub advance_prompt: String,
    pub current_step: Option<usize>,
    pub step_count: usize,
    pub position_ms: u64,
}

/// Whole-app snapshot
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStatus {
    pub state: AppState,
    pub campus: Option<String>,
    pub ar_supported: bool,
    pub active_topic: Option<TopicId>,
    pub detected_topic: Option<TopicId>,
    pub scene_topic: Option<TopicId>,
    pub visible_nodes: Vec<String>,
    pub timeline: TimelineStatus,
    pub progress: ProgressSummary,
    pub transitions: u64,
    pub ticks: u64,
    pub now_ms: u64,
}

impl AppStatus {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}
