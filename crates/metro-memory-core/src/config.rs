// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::cluster::DEFAULT_CLUSTER_DISTANCE;
use crate::search::SearchOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Tunable matching behavior, stored as `match_config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Schema version for migration. Increment when defaults change meaning.
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub search: SearchOptions,
    /// Coordinate-degree radius under which two stations are the same place.
    #[serde(default = "default_cluster_distance")]
    pub cluster_distance: f64,
    /// Canonical name to extra accepted spellings.
    #[serde(default)]
    pub extra_aliases: BTreeMap<String, Vec<String>>,
}

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

fn current_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

fn default_cluster_distance() -> f64 {
    DEFAULT_CLUSTER_DISTANCE
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            search: SearchOptions::default(),
            cluster_distance: DEFAULT_CLUSTER_DISTANCE,
            extra_aliases: BTreeMap::new(),
        }
    }
}

impl MatchConfig {
    pub fn default_path() -> PathBuf {
        crate::get_config_root().join("match_config.json")
    }

    /// Loads `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("[Config] No match config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: MatchConfig = serde_json::from_str(&content).map_err(|e| {
            log::error!("[Config] JSON parse error for {:?}: {}", path, e);
            e
        })?;

        if config.schema_version > CURRENT_SCHEMA_VERSION {
            log::warn!(
                "[Config] {:?} has schema v{}, newer than v{}; unknown fields are ignored",
                path,
                config.schema_version,
                CURRENT_SCHEMA_VERSION
            );
        } else if config.schema_version < CURRENT_SCHEMA_VERSION {
            log::info!(
                "[Config] Stamping match_config.json from schema v{} to v{}",
                config.schema_version,
                CURRENT_SCHEMA_VERSION
            );
            config.schema_version = CURRENT_SCHEMA_VERSION;
            if let Err(e) = config.save(path) {
                log::warn!("[Config] Could not write migrated config: {}", e);
            }
        }

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize match config")?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = MatchConfig::load(&dir.path().join("absent.json"))?;
        assert_eq!(config, MatchConfig::default());
        Ok(())
    }

    #[test]
    fn test_roundtrip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("cfg").join("match_config.json");

        let mut config = MatchConfig::default();
        config.search.threshold = 0.2;
        config
            .extra_aliases
            .insert("Grand Central".into(), vec!["GCT".into()]);
        config.save(&path)?;

        assert_eq!(MatchConfig::load(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_partial_file_fills_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("match_config.json");
        fs::write(
            &path,
            r#"{"schema_version": 1, "search": {"threshold": 0.1}}"#,
        )?;

        let config = MatchConfig::load(&path)?;
        assert_eq!(config.search.threshold, 0.1);
        assert_eq!(config.search.distance, 10);
        assert_eq!(config.cluster_distance, DEFAULT_CLUSTER_DISTANCE);
        Ok(())
    }

    #[test]
    fn test_versionless_file_is_left_alone() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("match_config.json");
        let written = r#"{"search":{"threshold":0.25},"cluster_distance":0.001}"#;
        fs::write(&path, written)?;

        let config = MatchConfig::load(&path)?;
        assert_eq!(config.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(config.search.threshold, 0.25);
        assert_eq!(config.search.distance, 10);
        assert_eq!(config.cluster_distance, 0.001);
        assert_eq!(fs::read_to_string(&path)?, written);
        Ok(())
    }

    #[test]
    fn test_older_version_is_stamped_not_reset() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("match_config.json");
        fs::write(
            &path,
            r#"{"schema_version": 0, "search": {"threshold": 0.3},
                "extra_aliases": {"Grand Central": ["GCT"]}}"#,
        )?;

        let config = MatchConfig::load(&path)?;
        assert_eq!(config.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(config.search.threshold, 0.3);
        assert_eq!(config.extra_aliases["Grand Central"], vec!["GCT".to_string()]);

        let on_disk: MatchConfig = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(on_disk, config);
        Ok(())
    }
}
