//! Progress store

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use arlearn_content::TopicRegistry;
use arlearn_core::{ArError, ArResult, TopicId};

use crate::record::{ProgressRecord, PROGRESS_KEY};
use crate::storage::KeyValueStorage;

/// Progress store configuration
#[derive(Clone, Debug)]
pub struct ProgressConfig {
    /// Storage key of the record
    pub key: String,
    /// Valid topic ids are `1..=total_topics`
    pub total_topics: u8,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        ProgressConfig {
            key: PROGRESS_KEY.to_string(),
            total_topics: 4,
        }
    }
}

/// Debug snapshot of the store
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub completed_topics: Vec<TopicId>,
    pub completed_topic_names: Vec<String>,
    pub completion_count: usize,
    pub completion_percentage: u8,
    pub total_topics: u8,
}

/// What the menu shows about progress
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuProgress {
    /// "N of 4 completed"
    pub counter_text: String,
    /// "✓ Title" per completed topic
    pub items: Vec<String>,
    /// The list is hidden while empty
    pub list_visible: bool,
    /// Width of the progress bar in percent
    pub bar_percent: u8,
}

/// Set of completed topics backed by durable storage
/// INVARIANT: only ids in `1..=total_topics` are ever held
pub struct ProgressStore {
    config: ProgressConfig,
    storage: Box<dyn KeyValueStorage>,
    completed: BTreeSet<TopicId>,
    last_updated: Option<DateTime<Utc>>,
    /// Set while the last save failed; progress then lives in memory only
    degraded: bool,
}

impl ProgressStore {
    /// Open with the default key and load any saved progress
    pub fn open(storage: Box<dyn KeyValueStorage>) -> Self {
        Self::with_config(storage, ProgressConfig::default())
    }

    pub fn with_config(storage: Box<dyn KeyValueStorage>, config: ProgressConfig) -> Self {
        let mut store = ProgressStore {
            config,
            storage,
            completed: BTreeSet::new(),
            last_updated: None,
            degraded: false,
        };
        store.reload();
        store
    }

    /// Replace in-memory state with the stored record. Missing or malformed
    /// data yields empty progress.
    pub fn reload(&mut self) {
        self.completed.clear();
        self.last_updated = None;

        let raw = match self.storage.get(&self.config.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key = %self.config.key, "no saved progress, starting fresh");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read progress, starting fresh");
                return;
            }
        };

        let record = match ProgressRecord::from_json(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "malformed progress record, starting fresh");
                return;
            }
        };

        for id in record.completed_topics {
            match self.validate(id) {
                Ok(topic) => {
                    self.completed.insert(topic);
                }
                Err(_) => tracing::warn!(topic = id, "dropping out-of-range topic from saved progress"),
            }
        }
        self.last_updated = record.last_updated;
        tracing::debug!(completed = ?self.completed, "progress loaded");
    }

    fn validate(&self, id: i64) -> ArResult<TopicId> {
        if id >= 1 && id <= i64::from(self.config.total_topics) {
            Ok(TopicId::new(id as u8))
        } else {
            Err(ArError::UnknownTopic(TopicId::new(id.clamp(0, 255) as u8)))
        }
    }

    fn save(&mut self) {
        let record = ProgressRecord::now(self.completed.iter().map(|t| i64::from(t.get())).collect());
        let result = record
            .to_json()
            .map_err(|e| ArError::Storage(e.to_string()))
            .and_then(|json| self.storage.set(&self.config.key, &json));

        match result {
            Ok(()) => {
                self.degraded = false;
                self.last_updated = record.last_updated;
            }
            Err(e) => {
                self.degraded = true;
                tracing::error!(error = %e, "failed to save progress, keeping it in memory");
            }
        }
    }

    /// Add a topic to the completed set. Returns whether it was new.
    pub fn mark_topic_completed(&mut self, topic: TopicId) -> ArResult<bool> {
        let topic = self.validate(i64::from(topic.get()))?;
        let added = self.completed.insert(topic);
        self.save();
        tracing::info!(
            topic = %topic,
            completed = self.completed.len(),
            total = self.config.total_topics,
            "topic marked completed"
        );
        Ok(added)
    }

    pub fn is_completed(&self, topic: TopicId) -> bool {
        self.completed.contains(&topic)
    }

    /// Completed ids in ascending order
    pub fn completed_topics(&self) -> Vec<TopicId> {
        self.completed.iter().copied().collect()
    }

    pub fn count(&self) -> usize {
        self.completed.len()
    }

    pub fn total(&self) -> u8 {
        self.config.total_topics
    }

    /// Rounded percentage of topics completed
    pub fn percentage(&self) -> u8 {
        if self.config.total_topics == 0 {
            return 0;
        }
        let pct = self.completed.len() as f64 / f64::from(self.config.total_topics) * 100.0;
        pct.round() as u8
    }

    /// Titles of completed topics, in id order
    pub fn completed_names(&self, registry: &TopicRegistry) -> Vec<String> {
        self.completed
            .iter()
            .map(|&id| registry.title(id).to_string())
            .collect()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Whether the last save failed
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Forget all progress
    pub fn clear_all(&mut self) {
        self.completed.clear();
        self.save();
        tracing::info!("all progress cleared");
    }

    /// Replace the completed set. Out-of-range ids are skipped.
    pub fn set_completed(&mut self, topics: &[TopicId]) {
        self.completed.clear();
        for &topic in topics {
            match self.validate(i64::from(topic.get())) {
                Ok(topic) => {
                    self.completed.insert(topic);
                }
                Err(e) => tracing::warn!(error = %e, "skipping topic"),
            }
        }
        self.save();
        tracing::info!(completed = ?self.completed, "progress set");
    }

    /// Mark every topic completed
    pub fn complete_all(&mut self) {
        let all: Vec<TopicId> = (1..=self.config.total_topics).map(TopicId::new).collect();
        self.set_completed(&all);
    }

    pub fn summary(&self, registry: &TopicRegistry) -> ProgressSummary {
        ProgressSummary {
            completed_topics: self.completed_topics(),
            completed_topic_names: self.completed_names(registry),
            completion_count: self.count(),
            completion_percentage: self.percentage(),
            total_topics: self.config.total_topics,
        }
    }

    /// Menu display model
    pub fn menu_view(&self, registry: &TopicRegistry) -> MenuProgress {
        let items: Vec<String> = self
            .completed_names(registry)
            .into_iter()
            .map(|name| format!("✓ {}", name))
            .collect();
        MenuProgress {
            counter_text: format!("{} of {} completed", self.count(), self.config.total_topics),
            list_visible: !items.is_empty(),
            items,
            bar_percent: self.percentage(),
        }
    }
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("key", &self.config.key)
            .field("completed", &self.completed)
            .field("degraded", &self.degraded)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, MemoryStorage};

    struct BrokenStorage;

    impl KeyValueStorage for BrokenStorage {
        fn get(&self, _key: &str) -> ArResult<Option<String>> {
            Err(ArError::Storage("quota".into()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> ArResult<()> {
            Err(ArError::Storage("quota exceeded".into()))
        }

        fn remove(&mut self, _key: &str) -> ArResult<()> {
            Ok(())
        }
    }

    fn topic(id: u8) -> TopicId {
        TopicId::new(id)
    }

    #[test]
    fn test_mark_and_reload() {
        let storage = MemoryStorage::new();
        let mut store = ProgressStore::open(Box::new(storage.clone()));

        assert!(store.mark_topic_completed(topic(2)).unwrap());

        let reloaded = ProgressStore::open(Box::new(storage.clone()));
        assert!(reloaded.is_completed(topic(2)));
        assert_eq!(reloaded.count(), 1);
        assert!(reloaded.last_updated().is_some());
        assert!(storage.raw(PROGRESS_KEY).unwrap().contains(r#""completedTopics":[2]"#));
    }

    #[test]
    fn test_mark_is_idempotent() {
        let mut store = ProgressStore::open(Box::new(MemoryStorage::new()));

        assert!(store.mark_topic_completed(topic(3)).unwrap());
        assert!(!store.mark_topic_completed(topic(3)).unwrap());

        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let mut store = ProgressStore::open(Box::new(MemoryStorage::new()));

        assert_eq!(
            store.mark_topic_completed(topic(5)),
            Err(ArError::UnknownTopic(topic(5)))
        );
        assert!(store.mark_topic_completed(topic(0)).is_err());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_malformed_record_loads_empty() {
        for raw in ["not json", r#"{"completedTopics": "x"}"#, "[]"] {
            let mut storage = MemoryStorage::new();
            storage.set(PROGRESS_KEY, raw).unwrap();

            let store = ProgressStore::open(Box::new(storage));
            assert_eq!(store.count(), 0, "record {:?}", raw);
        }
    }

    #[test]
    fn test_out_of_range_saved_ids_dropped() {
        let mut storage = MemoryStorage::new();
        storage
            .set(PROGRESS_KEY, r#"{"completedTopics":[4,1,9,-2,1]}"#)
            .unwrap();

        let store = ProgressStore::open(Box::new(storage));

        assert_eq!(store.completed_topics(), vec![topic(1), topic(4)]);
    }

    #[test]
    fn test_save_failure_keeps_memory_state() {
        let mut store = ProgressStore::open(Box::new(BrokenStorage));

        assert!(store.mark_topic_completed(topic(1)).unwrap());

        assert!(store.is_completed(topic(1)));
        assert!(store.is_degraded());
    }

    #[test]
    fn test_percentage_rounding() {
        let mut store = ProgressStore::open(Box::new(MemoryStorage::new()));
        assert_eq!(store.percentage(), 0);

        store.set_completed(&[topic(1)]);
        assert_eq!(store.percentage(), 25);

        let mut thirds = ProgressStore::with_config(
            Box::new(MemoryStorage::new()),
            ProgressConfig {
                total_topics: 3,
                ..Default::default()
            },
        );
        thirds.set_completed(&[topic(1), topic(2)]);
        assert_eq!(thirds.percentage(), 67);
    }

    #[test]
    fn test_test_hooks() {
        let mut store = ProgressStore::open(Box::new(MemoryStorage::new()));

        store.set_completed(&[topic(3), topic(1), topic(7)]);
        assert_eq!(store.completed_topics(), vec![topic(1), topic(3)]);

        store.complete_all();
        assert_eq!(store.count(), 4);
        assert_eq!(store.percentage(), 100);

        store.clear_all();
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_menu_view() {
        let registry = TopicRegistry::builtin().unwrap();
        let mut store = ProgressStore::open(Box::new(MemoryStorage::new()));

        let empty = store.menu_view(&registry);
        assert_eq!(empty.counter_text, "0 of 4 completed");
        assert!(!empty.list_visible);

        store.set_completed(&[topic(4), topic(1)]);
        let view = store.menu_view(&registry);

        assert_eq!(view.counter_text, "2 of 4 completed");
        assert_eq!(
            view.items,
            vec!["✓ Protecting Yourself Online", "✓ Seeking Help and Support"]
        );
        assert!(view.list_visible);
        assert_eq!(view.bar_percent, 50);
    }

    #[test]
    fn test_summary_serialises_camel_case() {
        let registry = TopicRegistry::builtin().unwrap();
        let mut store = ProgressStore::open(Box::new(MemoryStorage::new()));
        store.mark_topic_completed(topic(2)).unwrap();

        let json = serde_json::to_string(&store.summary(&registry)).unwrap();

        assert!(json.contains(r#""completedTopics":[2]"#));
        assert!(json.contains(r#""completedTopicNames":["Navigating Difficult Situations"]"#));
        assert!(json.contains(r#""completionPercentage":25"#));
        assert!(json.contains(r#""totalTopics":4"#));
    }

    #[test]
    fn test_file_backed_round_trip() {
        let dir = tempfile::tempdir().unwrap();

        let mut store = ProgressStore::open(Box::new(FileStorage::new(dir.path())));
        store.mark_topic_completed(topic(2)).unwrap();
        drop(store);

        let store = ProgressStore::open(Box::new(FileStorage::new(dir.path())));
        assert_eq!(store.completed_topics(), vec![topic(2)]);
    }
}
