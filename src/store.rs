use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

/// The latest cached payload for one key, with its capture timestamp.
/// Persisted verbatim as the JSON served to display clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    pub data: Value,
}

/// Logical key for a snapshot file. Two fixed resources plus a per-match
/// point-table family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotKey {
    Upcoming,
    Live,
    PointTable(String),
}

impl SnapshotKey {
    fn file_name(&self) -> String {
        match self {
            SnapshotKey::Upcoming => "upcoming.json".to_string(),
            SnapshotKey::Live => "live.json".to_string(),
            SnapshotKey::PointTable(match_id) => format!("pointtable_{}.json", match_id),
        }
    }
}

/// File-backed snapshot store: one JSON file per key under `dir`.
///
/// Writes go to a temp sibling and are renamed into place, so a concurrent
/// reader never observes a half-written file. There is no locking; each fixed
/// key has a single writer, and the point-table key's scheduled-vs-on-demand
/// race is last-writer-wins over idempotent data.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SnapshotStore { dir: dir.into() }
    }

    fn path(&self, key: &SnapshotKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Persist `data` under `key`, stamped with the current time, fully
    /// replacing any prior snapshot. Returns the snapshot as written.
    pub fn write(&self, key: &SnapshotKey, data: Value) -> Result<Snapshot> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create store directory {}", self.dir.display()))?;

        let snapshot = Snapshot {
            updated_at: Utc::now(),
            data,
        };
        let json = serde_json::to_vec_pretty(&snapshot).context("Failed to serialize snapshot")?;

        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to move snapshot into {}", path.display()))?;

        Ok(snapshot)
    }

    /// The last written snapshot for `key`, or `None` if never written or the
    /// file is missing/corrupt.
    pub fn read(&self, key: &SnapshotKey) -> Option<Snapshot> {
        let content = fs::read_to_string(self.path(key)).ok()?;
        serde_json::from_str(&content).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (SnapshotStore, TempDir) {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = SnapshotStore::new(dir.path());
        (store, dir)
    }

    #[test]
    fn test_read_absent_key_returns_none() {
        let (store, _dir) = store();
        assert!(store.read(&SnapshotKey::Upcoming).is_none());
        assert!(store.read(&SnapshotKey::PointTable("42".into())).is_none());
    }

    #[test]
    fn test_write_then_read_returns_payload() {
        let (store, _dir) = store();
        let payload = json!({"matches": [{"id": 1}]});

        store.write(&SnapshotKey::Upcoming, payload.clone()).unwrap();

        let snap = store.read(&SnapshotKey::Upcoming).unwrap();
        assert_eq!(snap.data, payload);
    }

    #[test]
    fn test_persisted_file_layout() {
        let (store, dir) = store();
        store
            .write(&SnapshotKey::PointTable("42".into()), json!({"a": 1}))
            .unwrap();

        let path = dir.path().join("pointtable_42.json");
        assert!(path.exists());
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("\"updatedAt\""));
        assert!(content.contains("\"data\""));
        // No leftover temp file after the rename.
        assert!(!dir.path().join("pointtable_42.json.tmp").exists());
    }

    #[test]
    fn test_overwrite_fully_replaces() {
        let (store, _dir) = store();
        store
            .write(&SnapshotKey::Live, json!({"match_id": "a", "extra": true}))
            .unwrap();
        store.write(&SnapshotKey::Live, json!({"match_id": "b"})).unwrap();

        let snap = store.read(&SnapshotKey::Live).unwrap();
        assert_eq!(snap.data, json!({"match_id": "b"}));
    }

    #[test]
    fn test_updated_at_non_decreasing() {
        let (store, _dir) = store();
        let first = store.write(&SnapshotKey::Live, json!(1)).unwrap();
        let second = store.write(&SnapshotKey::Live, json!(2)).unwrap();
        assert!(second.updated_at >= first.updated_at);

        let read_back = store.read(&SnapshotKey::Live).unwrap();
        assert_eq!(read_back.updated_at, second.updated_at);
    }

    #[test]
    fn test_corrupt_file_reads_as_absent() {
        let (store, dir) = store();
        fs::write(dir.path().join("live.json"), "{not json").unwrap();
        assert!(store.read(&SnapshotKey::Live).is_none());
    }

    #[test]
    fn test_keys_map_to_distinct_files() {
        let (store, _dir) = store();
        store.write(&SnapshotKey::Upcoming, json!("u")).unwrap();
        store.write(&SnapshotKey::Live, json!("l")).unwrap();
        store
            .write(&SnapshotKey::PointTable("7".into()), json!("p"))
            .unwrap();

        assert_eq!(store.read(&SnapshotKey::Upcoming).unwrap().data, json!("u"));
        assert_eq!(store.read(&SnapshotKey::Live).unwrap().data, json!("l"));
        assert_eq!(
            store.read(&SnapshotKey::PointTable("7".into())).unwrap().data,
            json!("p")
        );
    }
}
