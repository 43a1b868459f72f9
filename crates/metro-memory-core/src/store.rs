// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::catalog::StationId;
use crate::found::{format_timestamp, parse_timestamp, FoundState};
use crate::{MetroError, Result};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Key-value persistence for per-city progress. Values are JSON.
pub trait ProgressStore {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// All keys in one pretty-printed JSON object, rewritten on every change.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileStore {
    pub fn default_path() -> PathBuf {
        crate::get_config_root().join("progress.json")
    }

    /// Opens `path`, starting empty when the file does not exist yet. A file
    /// that is not a JSON object is an error so it never gets overwritten.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Ok(Self {
                path,
                values: Map::new(),
            });
        }

        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Self {
                path,
                values: Map::new(),
            });
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(values) => Ok(Self { path, values }),
            _ => Err(MetroError::Store(format!(
                "{} does not contain a JSON object",
                path.display()
            ))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl ProgressStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Store keys for one city.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressKeys {
    pub found: String,
    pub found_at: String,
    pub is_new_player: String,
}

impl ProgressKeys {
    pub fn for_city(city: &str) -> Self {
        Self {
            found: format!("{}-stations", city),
            found_at: format!("{}-stations-found-at", city),
            is_new_player: format!("{}-stations-is-new-player", city),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedProgress {
    pub found: FoundState,
    pub is_new_player: bool,
}

impl Default for SavedProgress {
    fn default() -> Self {
        Self {
            found: FoundState::default(),
            is_new_player: true,
        }
    }
}

/// Reads a city's progress. Malformed values fall back to their defaults.
pub fn load_progress<S: ProgressStore + ?Sized>(store: &S, keys: &ProgressKeys) -> Result<SavedProgress> {
    let ids = match store.get(&keys.found)? {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => serde_json::from_value::<Vec<StationId>>(value).unwrap_or_else(|e| {
            log::warn!("[Store] Ignoring malformed '{}': {}", keys.found, e);
            Vec::new()
        }),
    };

    let mut timestamps = BTreeMap::new();
    match store.get(&keys.found_at)? {
        None | Some(Value::Null) => {}
        Some(Value::Object(map)) => {
            for (id, stamp) in map {
                let parsed = id
                    .parse::<StationId>()
                    .ok()
                    .zip(stamp.as_str().and_then(parse_timestamp));
                match parsed {
                    Some((id, t)) => {
                        timestamps.insert(id, t);
                    }
                    None => log::warn!("[Store] Ignoring timestamp entry {}: {}", id, stamp),
                }
            }
        }
        Some(other) => log::warn!("[Store] Ignoring malformed '{}': {}", keys.found_at, other),
    }

    let is_new_player = match store.get(&keys.is_new_player)? {
        Some(Value::Bool(b)) => b,
        None | Some(Value::Null) => true,
        Some(other) => {
            log::warn!("[Store] Ignoring malformed '{}': {}", keys.is_new_player, other);
            true
        }
    };

    Ok(SavedProgress {
        found: FoundState::new(ids, timestamps),
        is_new_player,
    })
}

pub fn save_progress<S: ProgressStore + ?Sized>(
    store: &mut S,
    keys: &ProgressKeys,
    found: &FoundState,
    is_new_player: bool,
) -> Result<()> {
    let stamps: Map<String, Value> = found
        .timestamps()
        .iter()
        .map(|(id, t)| (id.to_string(), Value::from(format_timestamp(t))))
        .collect();

    store.set(&keys.found, Value::from(found.ids().to_vec()))?;
    store.set(&keys.found_at, Value::Object(stamps))?;
    store.set(&keys.is_new_player, Value::Bool(is_new_player))?;
    Ok(())
}
