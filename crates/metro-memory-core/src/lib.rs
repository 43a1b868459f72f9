// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod aliases;
pub mod catalog;
pub mod cluster;
pub mod config;
pub mod found;
pub mod normalize;
pub mod progress;
pub mod resolver;
pub mod search;
pub mod session;
pub mod store;

use std::path::PathBuf;
use thiserror::Error;

pub use catalog::{Catalog, Coord, FocusTarget, Geometry, Station, StationId};
pub use config::MatchConfig;
pub use found::FoundState;
pub use progress::{Progress, SortOrder, StationKey};
pub use resolver::{MatchOutcome, Resolver};
pub use session::GameSession;
pub use store::{JsonFileStore, MemoryStore, ProgressStore};

#[derive(Error, Debug)]
pub enum MetroError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, MetroError>;

/// Directory holding `match_config.json` and `progress.json`.
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("org", "metro-memory", "metro-memory")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".metro-memory"))
}
