//! User preferences: favorites, map style and last known location
//!
//! Values live in a string key/value store under fixed keys, encoded as
//! JSON. Reads never fail: an absent or malformed value reads as the
//! default. There is no schema migration; a key's format changes by
//! bumping its version suffix.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexSet;
use serde_json::Value;
use tracing::warn;

use crate::record::Coordinates;
use crate::{Error, Result};

pub const FAVORITES_KEY: &str = "ao_favorites_v1";
pub const MAP_STYLE_KEY: &str = "ao_map_style_v1";
pub const LAST_LOCATION_KEY: &str = "ao_last_location_v1";

// ── Key/value backends ────────────────────────────────────

/// Raw string storage keyed by fixed names
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store, lost on drop
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object file.
///
/// Every write rewrites the whole file. A missing file reads as empty; an
/// unreadable or corrupt file also reads as empty, and the next write
/// replaces it.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(Error::Storage(format!("{}: {}", self.path.display(), e))),
        };
        match serde_json::from_str(&text) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "corrupt preference file; starting empty"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| Error::Storage(format!("{}: {}", parent.display(), e)))?;
            }
        }
        let text = serde_json::to_string_pretty(entries)
            .map_err(|e| Error::Storage(e.to_string()))?;
        fs::write(&self.path, text)
            .map_err(|e| Error::Storage(format!("{}: {}", self.path.display(), e)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value);
        self.save(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

// ── Typed preferences ─────────────────────────────────────

/// Base map rendering style
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MapStyle {
    #[default]
    Light,
    Dark,
}

impl MapStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            MapStyle::Light => "light",
            MapStyle::Dark => "dark",
        }
    }

    pub fn from_text(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "light" => Some(MapStyle::Light),
            "dark" => Some(MapStyle::Dark),
            _ => None,
        }
    }

    /// The other style
    pub fn toggled(self) -> Self {
        match self {
            MapStyle::Light => MapStyle::Dark,
            MapStyle::Dark => MapStyle::Light,
        }
    }
}

/// Last position reported by the device, with its capture time
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LastLocation {
    pub lat: f64,
    pub lon: f64,
    /// Unix time in milliseconds
    #[serde(default)]
    pub ts: u64,
}

impl LastLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

/// Typed access to preferences over any [`KeyValueStore`]
#[derive(Debug, Clone)]
pub struct Preferences<K> {
    store: K,
}

impl<K: KeyValueStore> Preferences<K> {
    pub fn new(store: K) -> Self {
        Preferences { store }
    }

    pub fn into_inner(self) -> K {
        self.store
    }

    /// Favorited restaurant ids, in the order they were added
    pub fn favorites(&self) -> IndexSet<String> {
        match self.read(FAVORITES_KEY) {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(id) => Some(id),
                    _ => None,
                })
                .collect(),
            _ => IndexSet::new(),
        }
    }

    pub fn save_favorites(&mut self, favorites: &IndexSet<String>) -> Result<()> {
        let encoded =
            serde_json::to_string(favorites).map_err(|e| Error::Storage(e.to_string()))?;
        self.store.set(FAVORITES_KEY, encoded)
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites().contains(id)
    }

    /// Flip an id's membership; returns whether it is now a favorite
    pub fn toggle_favorite(&mut self, id: &str) -> Result<bool> {
        let mut favorites = self.favorites();
        let now_favorite = if favorites.shift_remove(id) {
            false
        } else {
            favorites.insert(id.to_string());
            true
        };
        self.save_favorites(&favorites)?;
        Ok(now_favorite)
    }

    pub fn map_style(&self) -> MapStyle {
        self.raw(MAP_STYLE_KEY)
            .and_then(|text| MapStyle::from_text(&text))
            .unwrap_or_default()
    }

    pub fn set_map_style(&mut self, style: MapStyle) -> Result<()> {
        self.store.set(MAP_STYLE_KEY, style.as_str().to_string())
    }

    /// Last saved location; `None` when absent or not two numbers
    pub fn last_location(&self) -> Option<LastLocation> {
        let value = self.read(LAST_LOCATION_KEY)?;
        let location: LastLocation = serde_json::from_value(value).ok()?;
        (location.lat.is_finite() && location.lon.is_finite()).then_some(location)
    }

    /// Save a location stamped with the current time
    pub fn save_last_location(&mut self, at: Coordinates) -> Result<LastLocation> {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let location = LastLocation {
            lat: at.lat,
            lon: at.lon,
            ts,
        };
        let encoded =
            serde_json::to_string(&location).map_err(|e| Error::Storage(e.to_string()))?;
        self.store.set(LAST_LOCATION_KEY, encoded)?;
        Ok(location)
    }

    fn raw(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "preference read failed; using default");
                None
            }
        }
    }

    fn read(&self, key: &str) -> Option<Value> {
        serde_json::from_str(&self.raw(key)?).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs() -> Preferences<MemoryStore> {
        Preferences::new(MemoryStore::new())
    }

    #[test]
    fn test_toggle_favorite() {
        let mut p = prefs();
        assert!(!p.is_favorite("arepera"));
        assert!(p.toggle_favorite("arepera").unwrap());
        assert!(p.is_favorite("arepera"));
        assert!(!p.toggle_favorite("arepera").unwrap());
        assert!(!p.is_favorite("arepera"));
    }

    #[test]
    fn test_favorites_keep_insertion_order() {
        let mut p = prefs();
        for id in ["c", "a", "b"] {
            p.toggle_favorite(id).unwrap();
        }
        p.toggle_favorite("a").unwrap();
        let order: Vec<String> = p.favorites().into_iter().collect();
        assert_eq!(order, vec!["c", "b"]);
    }

    #[test]
    fn test_malformed_favorites_read_as_empty() {
        let mut store = MemoryStore::new();
        store.set(FAVORITES_KEY, "{not json".into()).unwrap();
        assert!(Preferences::new(store).favorites().is_empty());

        let mut store = MemoryStore::new();
        store.set(FAVORITES_KEY, r#"{"a": 1}"#.into()).unwrap();
        assert!(Preferences::new(store).favorites().is_empty());

        let mut store = MemoryStore::new();
        store.set(FAVORITES_KEY, r#"["a", 2, null, "b"]"#.into()).unwrap();
        assert_eq!(Preferences::new(store).favorites().len(), 2);
    }

    #[test]
    fn test_map_style_default_and_toggle() {
        let mut p = prefs();
        assert_eq!(p.map_style(), MapStyle::Light);
        p.set_map_style(p.map_style().toggled()).unwrap();
        assert_eq!(p.map_style(), MapStyle::Dark);

        let mut store = MemoryStore::new();
        store.set(MAP_STYLE_KEY, "sepia".into()).unwrap();
        assert_eq!(Preferences::new(store).map_style(), MapStyle::Light);
    }

    #[test]
    fn test_last_location_roundtrip_and_malformed() {
        let mut p = prefs();
        assert!(p.last_location().is_none());

        let saved = p
            .save_last_location(Coordinates {
                lat: 45.5,
                lon: -73.57,
            })
            .unwrap();
        let loaded = p.last_location().unwrap();
        assert_eq!(loaded, saved);
        assert!(loaded.ts > 0);

        let mut store = MemoryStore::new();
        store
            .set(LAST_LOCATION_KEY, r#"{"lat": "45.5", "lon": -73.5}"#.into())
            .unwrap();
        assert!(Preferences::new(store).last_location().is_none());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let mut p = Preferences::new(FileStore::new(&path));
        p.toggle_favorite("dominos-pizza-gf").unwrap();
        p.set_map_style(MapStyle::Dark).unwrap();

        let reopened = Preferences::new(FileStore::new(&path));
        assert!(reopened.is_favorite("dominos-pizza-gf"));
        assert_eq!(reopened.map_style(), MapStyle::Dark);
    }

    #[test]
    fn test_file_store_corrupt_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "not json at all").unwrap();

        let mut store = FileStore::new(&path);
        assert_eq!(store.get(FAVORITES_KEY).unwrap(), None);
        store.set(MAP_STYLE_KEY, "dark".into()).unwrap();
        assert_eq!(store.get(MAP_STYLE_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_file_store_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("prefs.json"));
        store.set("k", "v".into()).unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        store.remove("missing").unwrap();
    }
}
