// src/browser/store.rs
//! Small persistent key/value stores backing the per-page style memory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

use crate::error::{Result, TenfootError};

/// Bump when the table layout changes; older files are moved aside.
pub const SCHEMA_VERSION: i64 = 1;

pub trait KeyStore {
    fn id_exists(&self, key: &str) -> bool;
    fn get_data(&self, key: &str) -> Option<String>;
    fn set_data(&mut self, key: &str, value: &str);

    /// One-time user-visible warning produced while opening the store.
    fn take_warning(&mut self) -> Option<String> {
        None
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryStore {
    fn id_exists(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    fn get_data(&self, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }

    fn set_data(&mut self, key: &str, value: &str) {
        self.data.insert(key.to_string(), value.to_string());
    }
}

pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
    warning: Option<String>,
}

fn table_exists(conn: &Connection, name: &str) -> bool {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1",
        [name],
        |_row| Ok(()),
    )
    .is_ok()
}

fn schema_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        PRAGMA user_version = {SCHEMA_VERSION};"
    ))
}

impl SqliteStore {
    /// Open (or create) the store at `path`. A file written with another
    /// schema version, or one that is not a database at all, is renamed aside
    /// and replaced by an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut warning = None;
        let conn = Connection::open(path)?;
        let compatible = match schema_version(&conn) {
            Ok(0) if !table_exists(&conn, "kv") => {
                init_schema(&conn)?;
                true
            }
            Ok(v) => v == SCHEMA_VERSION,
            Err(err) => {
                warn!("style store {} unreadable: {err}", path.display());
                false
            }
        };

        let conn = if compatible {
            conn
        } else {
            drop(conn);
            let backup = Self::move_aside(path)?;
            let msg = format!(
                "The view-style database was created by another version and has been reset. The old file was kept as {}.",
                backup.display()
            );
            warn!("{msg}");
            warning = Some(msg);
            let fresh = Connection::open(path)?;
            init_schema(&fresh)?;
            fresh
        };

        info!("style store ready at {}", path.display());
        Ok(Self {
            conn,
            path: path.to_path_buf(),
            warning,
        })
    }

    fn move_aside(path: &Path) -> Result<PathBuf> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("store");
        let dest = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(format!("{stem}_backup_{stamp}.db"));
        fs::rename(path, &dest)
            .map_err(|e| TenfootError::Store(format!("rename {}: {e}", path.display())))?;
        Ok(dest)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyStore for SqliteStore {
    fn id_exists(&self, key: &str) -> bool {
        self.conn
            .query_row("SELECT 1 FROM kv WHERE key = ?1", [key], |_row| Ok(()))
            .is_ok()
    }

    fn get_data(&self, key: &str) -> Option<String> {
        match self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
        {
            Ok(value) => value,
            Err(err) => {
                warn!("style store read failed for {key}: {err}");
                None
            }
        }
    }

    fn set_data(&mut self, key: &str, value: &str) {
        if let Err(err) = self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        ) {
            warn!("style store write failed for {key}: {err}");
        }
    }

    fn take_warning(&mut self) -> Option<String> {
        self.warning.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(!store.id_exists("k"));
        store.set_data("k", "v");
        assert!(store.id_exists("k"));
        assert_eq!(store.get_data("k").as_deref(), Some("v"));
    }

    #[test]
    fn sqlite_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("styles.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            assert!(store.take_warning().is_none());
            store.set_data("a", "List");
            store.set_data("a", "PosterGrid");
        }
        let mut store = SqliteStore::open(&path).unwrap();
        assert!(store.take_warning().is_none());
        assert!(store.id_exists("a"));
        assert!(!store.id_exists("b"));
        assert_eq!(store.get_data("a").as_deref(), Some("PosterGrid"));
        assert_eq!(store.get_data("b"), None);
    }

    #[test]
    fn schema_mismatch_moves_file_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("styles.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE kv (key TEXT PRIMARY KEY, value TEXT NOT NULL);
                 INSERT INTO kv VALUES ('a', 'List');
                 PRAGMA user_version = 99;",
            )
            .unwrap();
        }

        let mut store = SqliteStore::open(&path).unwrap();
        let warning = store.take_warning().expect("mismatch should warn");
        assert!(warning.contains("reset"));
        assert!(store.take_warning().is_none());
        assert!(!store.id_exists("a"));

        let backups = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("styles_backup_"))
            .count();
        assert_eq!(backups, 1);
    }

    #[test]
    fn garbage_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("styles.db");
        fs::write(&path, b"this is definitely not sqlite, just some bytes to trip the header check")
            .unwrap();
        let mut store = SqliteStore::open(&path).unwrap();
        assert!(store.take_warning().is_some());
        store.set_data("x", "CoverGrid");
        assert_eq!(store.get_data("x").as_deref(), Some("CoverGrid"));
    }
}
