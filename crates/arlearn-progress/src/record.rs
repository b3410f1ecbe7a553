//! Persisted progress layout
//!
//! `{"completedTopics": [1, 3], "lastUpdated": "2024-05-01T09:30:00.000Z"}`

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Storage key of the progress record
pub const PROGRESS_KEY: &str = "arLearningApp_progress";

/// Progress record as stored
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    #[serde(default)]
    pub completed_topics: Vec<i64>,
    #[serde(default, serialize_with = "serialize_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

fn serialize_timestamp<S: serde::Serializer>(
    ts: &Option<DateTime<Utc>>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => s.serialize_none(),
    }
}

impl ProgressRecord {
    /// Record stamped with the current wall-clock time
    pub fn now(completed_topics: Vec<i64>) -> Self {
        ProgressRecord {
            completed_topics,
            last_updated: Some(Utc::now()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        let record = ProgressRecord::now(vec![1, 3]);
        let json = record.to_json().unwrap();

        assert!(json.starts_with(r#"{"completedTopics":[1,3],"lastUpdated":""#));
        assert!(json.ends_with(r#"Z"}"#));
        assert_eq!(ProgressRecord::from_json(&json).unwrap(), record_rounded(&record));
    }

    fn record_rounded(record: &ProgressRecord) -> ProgressRecord {
        // serialisation keeps millisecond precision only
        let ts = record
            .last_updated
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|t| t.with_timezone(&Utc));
        ProgressRecord {
            completed_topics: record.completed_topics.clone(),
            last_updated: ts,
        }
    }

    #[test]
    fn test_parses_browser_record() {
        let record = ProgressRecord::from_json(
            r#"{"completedTopics":[2,4],"lastUpdated":"2024-05-01T09:30:00.000Z"}"#,
        )
        .unwrap();

        assert_eq!(record.completed_topics, vec![2, 4]);
        assert!(record.last_updated.is_some());
    }

    #[test]
    fn test_missing_fields_default() {
        let record = ProgressRecord::from_json("{}").unwrap();

        assert!(record.completed_topics.is_empty());
        assert_eq!(record.last_updated, None);
    }
}
