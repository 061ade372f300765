//! Script bookkeeping models.
//!
//! The metadata index is a JSON object mapping script name to
//! [`ScriptMetadata`], kept in insertion order.

use bsm_core::types::Timestamp;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Bookkeeping attributes of one script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptMetadata {
    pub created: Timestamp,
    pub last_modified: Timestamp,
    pub last_executed: Option<Timestamp>,
    #[serde(default)]
    pub execution_count: u64,
}

impl ScriptMetadata {
    /// Metadata for a script created at `now` and never executed.
    pub fn new(now: Timestamp) -> Self {
        Self {
            created: now,
            last_modified: now,
            last_executed: None,
            execution_count: 0,
        }
    }

    /// Record one saved execution result.
    pub fn record_execution(&mut self, now: Timestamp) {
        self.last_executed = Some(now);
        self.execution_count += 1;
    }
}

/// A listing entry: the script name plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptSummary {
    pub name: String,
    #[serde(flatten)]
    pub metadata: ScriptMetadata,
}

/// Name → metadata, in insertion order.
pub type MetadataIndex = IndexMap<String, ScriptMetadata>;

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn new_metadata_is_unexecuted() {
        let meta = ScriptMetadata::new(at(10));
        assert_eq!(meta.created, at(10));
        assert_eq!(meta.last_modified, at(10));
        assert_eq!(meta.last_executed, None);
        assert_eq!(meta.execution_count, 0);
    }

    #[test]
    fn record_execution_bumps_count_and_timestamp() {
        let mut meta = ScriptMetadata::new(at(10));
        meta.record_execution(at(20));
        meta.record_execution(at(30));
        assert_eq!(meta.execution_count, 2);
        assert_eq!(meta.last_executed, Some(at(30)));
        assert_eq!(meta.last_modified, at(10));
    }

    #[test]
    fn missing_execution_count_defaults_to_zero() {
        let json = r#"{
            "created": "2024-05-01T10:00:00Z",
            "last_modified": "2024-05-01T10:00:00Z",
            "last_executed": null
        }"#;
        let meta: ScriptMetadata = serde_json::from_str(json).expect("parse");
        assert_eq!(meta.execution_count, 0);
    }

    #[test]
    fn summary_serializes_flat() {
        let summary = ScriptSummary {
            name: "cube".to_string(),
            metadata: ScriptMetadata::new(at(0)),
        };
        let value = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(value["name"], "cube");
        assert_eq!(value["execution_count"], 0);
        assert!(value["last_executed"].is_null());
        assert!(value["created"].is_string());
    }

    #[test]
    fn index_keeps_insertion_order() {
        let mut index = MetadataIndex::new();
        for name in ["zeta", "alpha", "mid"] {
            index.insert(name.to_string(), ScriptMetadata::new(at(0)));
        }
        let json = serde_json::to_string(&index).expect("serialize");
        let back: MetadataIndex = serde_json::from_str(&json).expect("parse");
        let names: Vec<_> = back.keys().map(String::as_str).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }
}
