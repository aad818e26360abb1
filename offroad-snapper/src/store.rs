use std::path::PathBuf;

use anyhow::{Context, Result};
use route_record::RouteRecord;

use crate::{decode_collection, DecodedRoute, Event, Observer};

/// Somewhere the saved route collection lives, as one JSON document.
pub trait RouteStore {
    /// None if nothing has ever been saved
    fn load_raw(&self) -> Result<Option<String>>;
    fn save_raw(&mut self, raw: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryStore {
    pub contents: Option<String>,
}

impl RouteStore for MemoryStore {
    fn load_raw(&self) -> Result<Option<String>> {
        Ok(self.contents.clone())
    }

    fn save_raw(&mut self, raw: &str) -> Result<()> {
        self.contents = Some(raw.to_string());
        Ok(())
    }
}

pub struct FileStore {
    pub path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RouteStore for FileStore {
    fn load_raw(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        Ok(Some(raw))
    }

    fn save_raw(&mut self, raw: &str) -> Result<()> {
        std::fs::write(&self.path, raw).with_context(|| format!("writing {}", self.path.display()))
    }
}

/// Loads every saved route. Unreadable or corrupt storage is reported and treated as empty.
pub fn load_collection(store: &dyn RouteStore, observer: &dyn Observer) -> Vec<DecodedRoute> {
    let raw = match store.load_raw() {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            observer.emit(&Event::CorruptStorage {
                error: err.to_string(),
            });
            return Vec::new();
        }
    };
    match decode_collection(&raw) {
        Ok(routes) => routes,
        Err(err) => {
            observer.emit(&Event::CorruptStorage {
                error: err.to_string(),
            });
            Vec::new()
        }
    }
}

/// Appends one route to the stored collection and returns the whole collection as stored.
/// Earlier entries are carried over as raw JSON, untouched. If the stored collection can't be
/// read, nothing is saved and the stored data is left alone.
pub fn append_route(store: &mut dyn RouteStore, record: &RouteRecord) -> Result<Vec<serde_json::Value>> {
    let mut entries: Vec<serde_json::Value> = match store.load_raw()? {
        Some(raw) => serde_json::from_str(&raw)
            .context("saved routes are unreadable; not overwriting them")?,
        None => Vec::new(),
    };
    entries.push(serde_json::to_value(record)?);
    store.save_raw(&serde_json::to_string(&entries)?)?;
    Ok(entries)
}
