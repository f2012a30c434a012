//! Storage backends - flat string-keyed persistence
//!
//! A backend knows nothing about JSON, namespaces or projects. It maps an
//! opaque string key to an opaque string value, the same contract as a
//! browser's `localStorage`. Three implementations are provided:
//!
//! - [`FileBackend`]: one file per key in a directory (the default)
//! - [`SqliteBackend`]: a single `kv` table in an SQLite database
//! - [`MemoryBackend`]: in-process map with quota and fault injection, for tests

use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

/// File extension used for values stored by [`FileBackend`]
const VALUE_EXT: &str = "json";

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("storage quota exceeded: {needed} bytes needed, {available} bytes available")]
    QuotaExceeded { needed: usize, available: usize },

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// A flat, string-keyed persistent store
pub trait Backend {
    /// Read the raw value at `key`, `Ok(None)` if absent
    fn read(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Write `value` at `key`, replacing any previous value
    fn write(&mut self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Remove `key`; removing an absent key is not an error
    fn remove(&mut self, key: &str) -> Result<(), BackendError>;

    /// List every key currently present
    fn keys(&self) -> Result<Vec<String>, BackendError>;
}

// =========================================================================
// File backend
// =========================================================================

/// Stores each key as `<dir>/<encoded-key>.json`
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (creating if needed) a file backend rooted at `dir`
    pub fn open(dir: &Path) -> Result<Self, BackendError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Directory holding the value files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", encode_key(key), VALUE_EXT))
    }
}

impl Backend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        let path = self.path_for(key);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, value)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), BackendError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        let mut keys = Vec::new();
        for entry in walkdir::WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| BackendError::Unavailable(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().map_or(true, |e| e != VALUE_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(decode_key(stem));
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Make a key safe to use as a file name.
///
/// ASCII alphanumerics, `-`, `_` and `.` pass through; every other byte is
/// written as `%XX`.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn decode_key(encoded: &str) -> String {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
            if let Ok(byte) = u8::from_str_radix(hex, 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

// =========================================================================
// SQLite backend
// =========================================================================

/// Stores every key as a row of a single `kv` table
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open (creating if needed) the database at `path`
    pub fn open(path: &Path) -> Result<Self, BackendError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            );",
        )?;
        Ok(Self { conn })
    }
}

impl Backend for SqliteBackend {
    fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), BackendError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut keys = Vec::new();
        for key in rows {
            keys.push(key?);
        }
        Ok(keys)
    }
}

// =========================================================================
// Memory backend
// =========================================================================

/// In-memory backend with an optional byte quota and injectable faults
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total stored bytes (keys plus values), like a browser quota
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Make every subsequent read fail
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Make every subsequent write fail
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Store a raw value directly, bypassing quota and faults
    pub fn insert_raw(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn used_bytes_excluding(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Backend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
        if self.fail_reads {
            return Err(BackendError::Unavailable("read refused".to_string()));
        }
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        if self.fail_writes {
            return Err(BackendError::Unavailable("write refused".to_string()));
        }
        if let Some(quota) = self.quota {
            let used = self.used_bytes_excluding(key);
            let needed = key.len() + value.len();
            if used + needed > quota {
                return Err(BackendError::QuotaExceeded {
                    needed,
                    available: quota.saturating_sub(used),
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), BackendError> {
        if self.fail_writes {
            return Err(BackendError::Unavailable("remove refused".to_string()));
        }
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        if self.fail_reads {
            return Err(BackendError::Unavailable("read refused".to_string()));
        }
        Ok(self.entries.keys().cloned().collect())
    }
}

/// Shared handle, so a test can keep access to a backend a `Store` owns
impl<B: Backend> Backend for Rc<RefCell<B>> {
    fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
        self.borrow().read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        self.borrow_mut().write(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), BackendError> {
        self.borrow_mut().remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        self.borrow().keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_encode_key_roundtrip() {
        for key in ["awb.projects", "awb.epics-PROJ-01ABC", "we:ird/key name"] {
            assert_eq!(decode_key(&encode_key(key)), key);
        }
        assert_eq!(encode_key("a/b"), "a%2Fb");
    }

    #[test]
    fn test_file_backend_read_write_remove() {
        let tmp = tempdir().unwrap();
        let mut backend = FileBackend::open(&tmp.path().join("store")).unwrap();

        assert!(backend.read("awb.epics").unwrap().is_none());
        backend.write("awb.epics", "[]").unwrap();
        assert_eq!(backend.read("awb.epics").unwrap().as_deref(), Some("[]"));
        assert_eq!(backend.keys().unwrap(), vec!["awb.epics".to_string()]);

        backend.remove("awb.epics").unwrap();
        assert!(backend.read("awb.epics").unwrap().is_none());
        // Removing twice is fine
        backend.remove("awb.epics").unwrap();
    }

    #[test]
    fn test_file_backend_keys_ignore_temp_files() {
        let tmp = tempdir().unwrap();
        let mut backend = FileBackend::open(tmp.path()).unwrap();
        backend.write("a", "1").unwrap();
        fs::write(tmp.path().join("b.tmp"), "x").unwrap();

        assert_eq!(backend.keys().unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn test_sqlite_backend_upsert() {
        let tmp = tempdir().unwrap();
        let mut backend = SqliteBackend::open(&tmp.path().join("store.db")).unwrap();

        backend.write("k", "1").unwrap();
        backend.write("k", "2").unwrap();
        assert_eq!(backend.read("k").unwrap().as_deref(), Some("2"));
        assert_eq!(backend.keys().unwrap(), vec!["k".to_string()]);

        backend.remove("k").unwrap();
        assert!(backend.read("k").unwrap().is_none());
    }

    #[test]
    fn test_memory_backend_quota() {
        let mut backend = MemoryBackend::new().with_quota(10);
        backend.write("k", "12345").unwrap();
        // Replacing a value only counts the new size
        backend.write("k", "123456789").unwrap();

        let err = backend.write("k2", "abcdef").unwrap_err();
        assert!(matches!(err, BackendError::QuotaExceeded { .. }));
        assert!(backend.read("k2").unwrap().is_none());
    }

    #[test]
    fn test_memory_backend_faults() {
        let mut backend = MemoryBackend::new();
        backend.write("k", "v").unwrap();

        backend.set_fail_reads(true);
        assert!(backend.read("k").is_err());

        backend.set_fail_writes(true);
        assert!(backend.write("k", "w").is_err());
        backend.set_fail_reads(false);
        assert_eq!(backend.read("k").unwrap().as_deref(), Some("v"));
    }
}
