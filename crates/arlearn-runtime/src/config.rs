//! Application configuration
//!
//! Every field has a default, so a config file only lists what it changes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use arlearn_core::{ArError, ArResult};
use arlearn_progress::{ProgressConfig, PROGRESS_KEY};
use arlearn_time::ClockConfig;
use arlearn_timeline::SequencerConfig;

/// App configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Largest tick accepted by the clock; 0 disables clamping
    pub max_tick_ms: u64,
    /// How long the AR-ready screen shows before the animation starts;
    /// 0 waits for an explicit start
    pub ar_ready_dwell_ms: u64,
    pub pause_marker_ms: u64,
    pub countdown_interval_ms: u64,
    /// Step the `]` debug key jumps to
    pub seek_key_step: usize,
    pub progress_key: String,
    /// Directory for file-backed progress; in memory when unset
    pub store_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            max_tick_ms: 250,
            ar_ready_dwell_ms: 2000,
            pause_marker_ms: 100,
            countdown_interval_ms: 1000,
            seek_key_step: 10,
            progress_key: PROGRESS_KEY.to_string(),
            store_dir: None,
        }
    }
}

impl AppConfig {
    /// No AR-ready dwell: the animation starts on `start_experience` only
    pub fn manual() -> Self {
        AppConfig {
            ar_ready_dwell_ms: 0,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> ArResult<Self> {
        serde_json::from_str(json).map_err(|e| ArError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> ArResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ArError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn ar_ready_dwell(&self) -> Duration {
        Duration::from_millis(self.ar_ready_dwell_ms)
    }

    pub fn clock_config(&self) -> ClockConfig {
        if self.max_tick_ms == 0 {
            ClockConfig::unclamped()
        } else {
            ClockConfig {
                max_tick: Duration::from_millis(self.max_tick_ms),
            }
        }
    }

    pub fn sequencer_config(&self) -> SequencerConfig {
        SequencerConfig {
            pause_marker: Duration::from_millis(self.pause_marker_ms),
            countdown_interval: Duration::from_millis(self.countdown_interval_ms.max(1)),
        }
    }

    pub fn progress_config(&self, total_topics: u8) -> ProgressConfig {
        ProgressConfig {
            key: self.progress_key.clone(),
            total_topics,
        }
    }
}
