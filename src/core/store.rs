//! Namespaced JSON store over a [`Backend`]
//!
//! Reads never fail: a missing, unreadable or malformed value degrades to the
//! caller's fallback. Writes never fail either: a serialization or backend
//! error drops the write, logs it, and queues a [`StoreWarning`] for the user.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

use crate::core::backend::Backend;

/// Default namespace prefixed to every key
pub const DEFAULT_NAMESPACE: &str = "awb";

/// Result of a [`Store::save`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The value is now persisted
    Written,
    /// The write failed and was dropped; a warning was queued
    Dropped,
}

impl WriteOutcome {
    pub fn is_written(self) -> bool {
        self == WriteOutcome::Written
    }
}

/// A non-fatal problem the user should hear about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWarning {
    /// The value could not be serialized
    Serialize { key: String, reason: String },
    /// The backend refused the write (quota, IO, ...)
    Write { key: String, reason: String },
    /// The backend refused a removal
    Remove { key: String, reason: String },
}

impl fmt::Display for StoreWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreWarning::Serialize { key, reason } => {
                write!(f, "could not serialize '{}': {}; change not saved", key, reason)
            }
            StoreWarning::Write { key, reason } => {
                write!(f, "could not save '{}': {}; change not saved", key, reason)
            }
            StoreWarning::Remove { key, reason } => {
                write!(f, "could not remove '{}': {}", key, reason)
            }
        }
    }
}

/// JSON key-value store with a fixed key namespace
pub struct Store {
    backend: Box<dyn Backend>,
    namespace: String,
    warnings: Vec<StoreWarning>,
}

impl Store {
    /// Wrap a backend using the default namespace
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self::with_namespace(backend, DEFAULT_NAMESPACE)
    }

    /// Wrap a backend with an explicit namespace
    pub fn with_namespace(backend: Box<dyn Backend>, namespace: &str) -> Self {
        Self {
            backend,
            namespace: namespace.to_string(),
            warnings: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}.{}", self.namespace, key)
    }

    /// Load the value at `key`, or `fallback` if absent, unreadable or invalid
    pub fn load<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        let full_key = self.full_key(key);
        let raw = match self.backend.read(&full_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return fallback,
            Err(e) => {
                tracing::warn!(key = %full_key, error = %e, "storage read failed; using fallback");
                return fallback;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %full_key, error = %e, "stored value is not valid; using fallback");
                fallback
            }
        }
    }

    /// Load the value at `key` if present and valid
    pub fn load_opt<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.load(key, None)
    }

    /// Serialize and persist `value` at `key`
    pub fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> WriteOutcome {
        let full_key = self.full_key(key);
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %full_key, error = %e, "serialization failed; write dropped");
                self.warnings.push(StoreWarning::Serialize {
                    key: key.to_string(),
                    reason: e.to_string(),
                });
                return WriteOutcome::Dropped;
            }
        };

        match self.backend.write(&full_key, &raw) {
            Ok(()) => {
                tracing::debug!(key = %full_key, bytes = raw.len(), "saved");
                WriteOutcome::Written
            }
            Err(e) => {
                tracing::warn!(key = %full_key, error = %e, "storage write failed; write dropped");
                self.warnings.push(StoreWarning::Write {
                    key: key.to_string(),
                    reason: e.to_string(),
                });
                WriteOutcome::Dropped
            }
        }
    }

    /// Whether a raw value exists at `key` (valid or not)
    pub fn contains(&self, key: &str) -> bool {
        matches!(self.backend.read(&self.full_key(key)), Ok(Some(_)))
    }

    /// Remove `key`; returns false if the backend refused
    pub fn remove(&mut self, key: &str) -> bool {
        let full_key = self.full_key(key);
        match self.backend.remove(&full_key) {
            Ok(()) => {
                tracing::debug!(key = %full_key, "removed");
                true
            }
            Err(e) => {
                tracing::warn!(key = %full_key, error = %e, "storage remove failed");
                self.warnings.push(StoreWarning::Remove {
                    key: key.to_string(),
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    /// Keys in this namespace, with the namespace stripped
    pub fn keys(&self) -> Vec<String> {
        let prefix = format!("{}.", self.namespace);
        match self.backend.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "could not list storage keys");
                Vec::new()
            }
        }
    }

    /// Warnings queued since the last call
    pub fn take_warnings(&mut self) -> Vec<StoreWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Warnings queued and not yet taken
    pub fn warnings(&self) -> &[StoreWarning] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::{MemoryBackend, SqliteBackend};
    use crate::entities::sprint::{BoardItem, CommentType, PlannerItem, Sprint};
    use crate::entities::story::{Story, StoryDraft};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn memory_store() -> Store {
        Store::new(Box::new(MemoryBackend::new()))
    }

    #[test]
    fn test_save_then_load() {
        let mut store = memory_store();
        let value = vec!["a".to_string(), "b".to_string()];
        assert!(store.save("list", &value).is_written());
        assert_eq!(store.load::<Vec<String>>("list", Vec::new()), value);
    }

    fn sample_sprints() -> Vec<Sprint> {
        let story = Story::new(
            StoryDraft {
                role: "buyer".to_string(),
                action: "pay by card".to_string(),
                story_points: 5,
                ..Default::default()
            },
            &[],
        );
        let mut sprint = Sprint::new("Sprint 1");
        sprint.goal = "Ship checkout".to_string();
        sprint.start_date = NaiveDate::from_ymd_opt(2024, 5, 1);
        let item = sprint.add_item(BoardItem::from_story(&story)).unwrap();
        sprint.assign(&item, "Alice").unwrap();
        sprint
            .add_comment(&item, CommentType::User, "needs design review")
            .unwrap();
        sprint.add_item(BoardItem::from_text("Spike", 2)).unwrap();
        sprint
            .add_planner_item(PlannerItem::from_story(&story, Some(7.5)))
            .unwrap();
        sprint.add_planner_item(PlannerItem::new("Docs", 1, None)).unwrap();
        vec![sprint, Sprint::new("Sprint 2")]
    }

    #[test]
    fn test_entity_collection_round_trips() {
        let sprints = sample_sprints();

        let mut store = memory_store();
        assert!(store.save("sprints-p1", &sprints).is_written());
        assert_eq!(store.load::<Vec<Sprint>>("sprints-p1", Vec::new()), sprints);

        let tmp = tempfile::TempDir::new().unwrap();
        let backend = SqliteBackend::open(&tmp.path().join("store.db")).unwrap();
        let mut store = Store::new(Box::new(backend));
        assert!(store.save("sprints-p1", &sprints).is_written());
        assert_eq!(store.load::<Vec<Sprint>>("sprints-p1", Vec::new()), sprints);
    }

    #[test]
    fn test_load_missing_returns_fallback() {
        let store = memory_store();
        assert_eq!(store.load("nothing", 42u32), 42);
        assert!(store.load_opt::<u32>("nothing").is_none());
    }

    #[test]
    fn test_load_invalid_json_returns_fallback() {
        let mut backend = MemoryBackend::new();
        backend.insert_raw("awb.broken", "{not json");
        let store = Store::new(Box::new(backend));
        assert_eq!(store.load("broken", vec![1u8]), vec![1u8]);
        // The raw value is still there
        assert!(store.contains("broken"));
    }

    #[test]
    fn test_load_wrong_shape_returns_fallback() {
        let mut store = memory_store();
        store.save("shape", &HashMap::from([("a", 1)]));
        assert_eq!(store.load::<Vec<u8>>("shape", vec![]), Vec::<u8>::new());
    }

    #[test]
    fn test_load_when_read_fails_returns_fallback() {
        let mut backend = MemoryBackend::new();
        backend.insert_raw("awb.k", "1");
        backend.set_fail_reads(true);
        let store = Store::new(Box::new(backend));
        assert_eq!(store.load("k", 7u8), 7);
    }

    #[test]
    fn test_quota_failure_is_a_warning() {
        let mut store = Store::new(Box::new(MemoryBackend::new().with_quota(16)));
        let outcome = store.save("big", &"x".repeat(100));

        assert_eq!(outcome, WriteOutcome::Dropped);
        let warnings = store.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], StoreWarning::Write { .. }));
        assert!(warnings[0].to_string().contains("quota"));
        assert!(store.take_warnings().is_empty());
    }

    #[test]
    fn test_keys_are_namespaced() {
        let mut backend = MemoryBackend::new();
        backend.insert_raw("other.app", "1");
        let mut store = Store::with_namespace(Box::new(backend), "awb");
        store.save("projects", &1);

        assert_eq!(store.keys(), vec!["projects".to_string()]);
    }
}
