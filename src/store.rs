// 💾 Persisted UI state - key/value store for the `map.*` keys
//
// Two backends:
// - MemoryStore: tests and ephemeral sessions
// - SqliteStore: `kv` table in a SQLite file (WAL mode)

use crate::geo::LatLng;
use crate::widget::FilterCircle;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const KEY_SHOW_USERS: &str = "map.showUsers";
pub const KEY_SHOW_COMPANIES: &str = "map.showCompanies";
pub const KEY_LAST_EXPORT: &str = "map.lastExport";
pub const KEY_FILTER_CIRCLE: &str = "map.filterCircle";

pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

// ============================================================================
// MEMORY BACKEND
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

// ============================================================================
// SQLITE BACKEND
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store file, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open state database {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_store(&conn)?;
        Ok(SqliteStore { conn })
    }
}

/// Create the `kv` table. Safe to run on every startup.
pub fn setup_store(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

// ============================================================================
// TYPED ACCESSORS
// ============================================================================

/// Stored shape of the filter circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct StoredCircle {
    lat: f64,
    lng: f64,
    radius: f64,
}

/// `None` when never saved. Anything but `"true"` reads as `false`.
pub fn load_toggle(store: &dyn KeyValueStore, key: &str) -> Result<Option<bool>> {
    Ok(store.get(key)?.map(|v| v == "true"))
}

pub fn save_toggle(store: &mut dyn KeyValueStore, key: &str, value: bool) -> Result<()> {
    store.set(key, if value { "true" } else { "false" })
}

pub fn load_filter_circle(store: &dyn KeyValueStore) -> Result<Option<FilterCircle>> {
    let Some(raw) = store.get(KEY_FILTER_CIRCLE)? else {
        return Ok(None);
    };
    let stored: StoredCircle =
        serde_json::from_str(&raw).context("Stored filter circle is not valid JSON")?;
    Ok(Some(FilterCircle {
        center: LatLng::new(stored.lat, stored.lng),
        radius_meters: stored.radius,
    }))
}

pub fn save_filter_circle(store: &mut dyn KeyValueStore, circle: &FilterCircle) -> Result<()> {
    let stored = StoredCircle {
        lat: circle.center.lat,
        lng: circle.center.lng,
        radius: circle.radius_meters,
    };
    store.set(KEY_FILTER_CIRCLE, &serde_json::to_string(&stored)?)
}

pub fn clear_filter_circle(store: &mut dyn KeyValueStore) -> Result<()> {
    store.remove(KEY_FILTER_CIRCLE)
}

pub fn load_last_export(store: &dyn KeyValueStore) -> Result<Option<String>> {
    store.get(KEY_LAST_EXPORT)
}

pub fn save_last_export(store: &mut dyn KeyValueStore, json: &str) -> Result<()> {
    store.set(KEY_LAST_EXPORT, json)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));
        assert_eq!(store.len(), 1);

        store.remove("a").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_toggles() {
        let mut store = MemoryStore::new();
        assert_eq!(load_toggle(&store, KEY_SHOW_USERS).unwrap(), None);

        save_toggle(&mut store, KEY_SHOW_USERS, false).unwrap();
        save_toggle(&mut store, KEY_SHOW_COMPANIES, true).unwrap();

        assert_eq!(store.get(KEY_SHOW_USERS).unwrap().as_deref(), Some("false"));
        assert_eq!(load_toggle(&store, KEY_SHOW_USERS).unwrap(), Some(false));
        assert_eq!(load_toggle(&store, KEY_SHOW_COMPANIES).unwrap(), Some(true));

        store.set(KEY_SHOW_USERS, "yes").unwrap();
        assert_eq!(load_toggle(&store, KEY_SHOW_USERS).unwrap(), Some(false));
    }

    #[test]
    fn test_filter_circle_shape() {
        let mut store = MemoryStore::new();
        let circle = FilterCircle {
            center: LatLng::new(48.85, 2.35),
            radius_meters: 25_000.0,
        };
        save_filter_circle(&mut store, &circle).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&store.get(KEY_FILTER_CIRCLE).unwrap().unwrap()).unwrap();
        assert_eq!(raw["lat"], 48.85);
        assert_eq!(raw["lng"], 2.35);
        assert_eq!(raw["radius"], 25_000.0);

        assert_eq!(load_filter_circle(&store).unwrap(), Some(circle));

        clear_filter_circle(&mut store).unwrap();
        assert_eq!(load_filter_circle(&store).unwrap(), None);
    }

    #[test]
    fn test_corrupt_filter_circle() {
        let mut store = MemoryStore::new();
        store.set(KEY_FILTER_CIRCLE, "{oops").unwrap();
        assert!(load_filter_circle(&store).is_err());
    }

    #[test]
    fn test_sqlite_store_persists_across_connections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            save_toggle(&mut store, KEY_SHOW_COMPANIES, false).unwrap();
            save_last_export(&mut store, "[]").unwrap();
            save_last_export(&mut store, r#"[{"type":"User"}]"#).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(load_toggle(&store, KEY_SHOW_COMPANIES).unwrap(), Some(false));
        assert_eq!(
            load_last_export(&store).unwrap().as_deref(),
            Some(r#"[{"type":"User"}]"#)
        );
    }

    #[test]
    fn test_sqlite_remove() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.set("k", "v").unwrap();
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
