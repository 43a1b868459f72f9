// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::catalog::{Catalog, FocusTarget, StationId};
use crate::found::FoundState;
use crate::normalize::normalize;
use crate::search::{FuzzyIndex, SearchOptions, StationSearch};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Result of one explicit submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum MatchOutcome {
    #[serde(rename_all = "camelCase")]
    Success {
        /// Best textual match first.
        newly_found_ids: Vec<StationId>,
        /// Every station the input resolved to, found before or not.
        highlighted: Vec<StationId>,
        focus: Option<FocusTarget>,
    },
    AlreadyFound,
    Wrong,
}

impl MatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, MatchOutcome::Success { .. })
    }

    pub fn newly_found_ids(&self) -> &[StationId] {
        match self {
            MatchOutcome::Success {
                newly_found_ids, ..
            } => newly_found_ids,
            _ => &[],
        }
    }
}

/// Turns free text into station ids against one catalog.
pub struct Resolver<S: StationSearch = FuzzyIndex> {
    catalog: Arc<Catalog>,
    index: S,
    options: SearchOptions,
}

impl Resolver<FuzzyIndex> {
    pub fn new(catalog: Arc<Catalog>, options: SearchOptions) -> Self {
        let index = FuzzyIndex::build(catalog.stations(), options.clone());
        Self {
            catalog,
            index,
            options,
        }
    }
}

impl<S: StationSearch> Resolver<S> {
    pub fn with_index(catalog: Arc<Catalog>, index: S, options: SearchOptions) -> Self {
        Self {
            catalog,
            index,
            options,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Resolves `input` against the current found state. Blank input yields
    /// `None`; the state itself is never touched here.
    pub fn resolve(&self, input: &str, found: &FoundState) -> Option<MatchOutcome> {
        let pattern = normalize(input);
        if pattern.is_empty() {
            return None;
        }
        let pattern_len = pattern.chars().count();

        let hits = match self.index.search(&pattern) {
            Ok(hits) => hits,
            Err(e) => {
                log::error!("[Resolver] Search failed for {:?}: {}", input, e);
                return Some(MatchOutcome::Wrong);
            }
        };

        let mut candidates: Vec<StationId> = Vec::new();
        for hit in hits.iter().filter(|h| self.options.is_candidate(h, pattern_len)) {
            if !candidates.contains(&hit.id) {
                candidates.push(hit.id);
            }
        }
        if candidates.is_empty() {
            log::debug!("[Resolver] {:?}: {} raw hits, no candidate", pattern, hits.len());
            return Some(MatchOutcome::Wrong);
        }

        let expanded = self.expand(&candidates);
        let newly_found: Vec<StationId> = expanded
            .iter()
            .copied()
            .filter(|id| !found.contains(*id))
            .collect();

        log::debug!(
            "[Resolver] {:?}: candidates {:?}, expanded {:?}, new {:?}",
            pattern,
            candidates,
            expanded,
            newly_found
        );

        if newly_found.is_empty() {
            return Some(MatchOutcome::AlreadyFound);
        }

        let focus = self.catalog.focus_target(newly_found[0]);
        Some(MatchOutcome::Success {
            newly_found_ids: newly_found,
            highlighted: expanded,
            focus,
        })
    }

    /// Candidates in ranking order, each followed by its cluster siblings.
    /// Ids unknown to the catalog are dropped.
    fn expand(&self, candidates: &[StationId]) -> Vec<StationId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for &id in candidates {
            if !self.catalog.contains(id) {
                continue;
            }
            if seen.insert(id) {
                out.push(id);
            }
            if let Some(members) = self.catalog.cluster_of(id) {
                for &member in members {
                    if seen.insert(member) {
                        out.push(member);
                    }
                }
            }
        }
        out
    }
}
