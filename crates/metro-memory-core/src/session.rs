// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::catalog::{Catalog, FocusTarget, StationId};
use crate::config::MatchConfig;
use crate::found::FoundState;
use crate::progress::{found_list, FoundGroup, Progress, SortOrder};
use crate::resolver::{MatchOutcome, Resolver};
use crate::store::{load_progress, save_progress, ProgressKeys, ProgressStore};
use crate::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// One city's game: owns the found state and writes it through to the store
/// after every change.
pub struct GameSession<S: ProgressStore> {
    resolver: Resolver,
    found: FoundState,
    is_new_player: bool,
    keys: ProgressKeys,
    store: S,
}

impl<S: ProgressStore> GameSession<S> {
    /// Restores saved progress for `city`. Ids the catalog does not know are
    /// kept in the store but ignored; known ids without a timestamp get the
    /// load time.
    pub fn open(catalog: Arc<Catalog>, config: &MatchConfig, city: &str, store: S) -> Result<Self> {
        Self::open_at(catalog, config, city, store, Utc::now())
    }

    pub fn open_at(
        catalog: Arc<Catalog>,
        config: &MatchConfig,
        city: &str,
        mut store: S,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let keys = ProgressKeys::for_city(city);
        let saved = load_progress(&store, &keys)?;

        let found = saved.found.backfilled(now, |id| catalog.contains(id));
        let stale = found.ids().iter().filter(|&&id| !catalog.contains(id)).count();
        if stale > 0 {
            log::debug!(
                "[Session] {} saved stations for '{}' are not in this catalog",
                stale,
                city
            );
        }
        if found != saved.found {
            log::info!(
                "[Session] Backfilled timestamps for '{}' ({} stations)",
                city,
                found.len()
            );
            save_progress(&mut store, &keys, &found, saved.is_new_player)?;
        }

        Ok(Self {
            resolver: Resolver::new(catalog, config.search.clone()),
            found,
            is_new_player: saved.is_new_player,
            keys,
            store,
        })
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        self.resolver.catalog()
    }

    pub fn found(&self) -> &FoundState {
        &self.found
    }

    pub fn is_new_player(&self) -> bool {
        self.is_new_player
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn submit(&mut self, input: &str) -> Result<Option<MatchOutcome>> {
        self.submit_at(input, Utc::now())
    }

    pub fn submit_at(&mut self, input: &str, now: DateTime<Utc>) -> Result<Option<MatchOutcome>> {
        let outcome = self.resolver.resolve(input, &self.found);
        if let Some(MatchOutcome::Success {
            newly_found_ids, ..
        }) = &outcome
        {
            self.found = self.found.recorded(newly_found_ids, now);
            self.is_new_player = false;
            self.persist()?;
        }
        Ok(outcome)
    }

    pub fn reset(&mut self) -> Result<()> {
        self.found = FoundState::default();
        self.is_new_player = true;
        self.persist()
    }

    /// Marks every station found. Existing timestamps are kept.
    pub fn reveal_all(&mut self) -> Result<()> {
        self.reveal_all_at(Utc::now())
    }

    pub fn reveal_all_at(&mut self, now: DateTime<Utc>) -> Result<()> {
        let all: Vec<StationId> = self.catalog().ids().collect();
        self.found = self.found.recorded(&all, now);
        self.is_new_player = false;
        self.persist()
    }

    pub fn progress(&self) -> Progress {
        Progress::compute(self.catalog(), &self.found)
    }

    pub fn found_list(&self, sort: SortOrder, filter: Option<&str>) -> Vec<FoundGroup> {
        found_list(self.catalog(), &self.found, sort, filter)
    }

    pub fn focus_target(&self, id: StationId) -> Option<FocusTarget> {
        self.catalog().focus_target(id)
    }

    fn persist(&mut self) -> Result<()> {
        save_progress(&mut self.store, &self.keys, &self.found, self.is_new_player)
    }
}
