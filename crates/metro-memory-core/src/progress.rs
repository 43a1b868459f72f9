// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::catalog::{Catalog, Geometry, Station, StationId};
use crate::found::FoundState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Two records with the same key count as one station: same name at the same
/// spot (to six decimals), or the same name and id for non-point records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StationKey(String);

impl StationKey {
    pub fn of(station: &Station) -> Self {
        let name = station.name.trim().to_lowercase();
        match &station.geometry {
            Some(Geometry::Point(c)) => StationKey(format!("{}|{:.6}|{:.6}", name, c.lon, c.lat)),
            _ => StationKey(format!("{}|{}", name, station.id)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineProgress {
    pub found: usize,
    pub total: usize,
}

impl LineProgress {
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.found >= self.total
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Progress {
    pub found_unique: usize,
    pub total_unique: usize,
    pub found_proportion: f64,
    pub lines: BTreeMap<String, LineProgress>,
}

impl Progress {
    pub fn compute(catalog: &Catalog, found: &FoundState) -> Self {
        let found_ids: HashSet<StationId> = found.ids().iter().copied().collect();

        let mut all_keys = HashSet::new();
        let mut found_keys = HashSet::new();
        let mut per_line: BTreeMap<String, (HashSet<StationKey>, HashSet<StationKey>)> =
            BTreeMap::new();

        for station in catalog.stations() {
            let key = StationKey::of(station);
            let is_found = found_ids.contains(&station.id);
            if is_found {
                found_keys.insert(key.clone());
            }
            if let Some(line) = &station.line {
                let (total, hit) = per_line.entry(line.clone()).or_default();
                if is_found {
                    hit.insert(key.clone());
                }
                total.insert(key.clone());
            }
            all_keys.insert(key);
        }

        let total_unique = all_keys.len();
        let found_unique = found_keys.len();
        let found_proportion = if total_unique == 0 {
            0.0
        } else {
            found_unique as f64 / total_unique as f64
        };

        let lines = per_line
            .into_iter()
            .map(|(line, (total, hit))| {
                (
                    line,
                    LineProgress {
                        found: hit.len(),
                        total: total.len(),
                    },
                )
            })
            .collect();

        Self {
            found_unique,
            total_unique,
            found_proportion,
            lines,
        }
    }

    /// Lines complete now that were not complete in `previous`.
    pub fn newly_completed_lines(&self, previous: &Progress) -> Vec<String> {
        self.lines
            .iter()
            .filter(|(_, p)| p.is_complete())
            .filter(|(line, _)| {
                !previous
                    .lines
                    .get(*line)
                    .map(LineProgress::is_complete)
                    .unwrap_or(false)
            })
            .map(|(line, _)| line.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SortOrder {
    /// Most recently found first.
    #[default]
    Order,
    Name,
    NameDesc,
    Line,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "order" => Ok(SortOrder::Order),
            "name" => Ok(SortOrder::Name),
            "name-desc" => Ok(SortOrder::NameDesc),
            "line" => Ok(SortOrder::Line),
            other => Err(format!(
                "unknown sort '{}', expected order, name, name-desc or line",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoundEntry {
    pub id: StationId,
    pub name: String,
    pub line: Option<String>,
    pub found_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoundGroup {
    pub key: StationKey,
    pub stations: Vec<FoundEntry>,
}

/// Found stations sorted, filtered and grouped by [`StationKey`].
pub fn found_list(
    catalog: &Catalog,
    found: &FoundState,
    sort: SortOrder,
    filter: Option<&str>,
) -> Vec<FoundGroup> {
    let position: HashMap<StationId, usize> = found
        .ids()
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i))
        .collect();

    let mut stations: Vec<&Station> = found.ids().iter().filter_map(|&id| catalog.get(id)).collect();

    match sort {
        SortOrder::Order => stations.sort_by(|a, b| {
            match (found.timestamp(a.id), found.timestamp(b.id)) {
                (Some(ta), Some(tb)) => tb.cmp(&ta),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => position[&a.id].cmp(&position[&b.id]),
            }
        }),
        SortOrder::Name => stations.sort_by_key(|s| s.name.to_lowercase()),
        SortOrder::NameDesc => {
            stations.sort_by_key(|s| s.name.to_lowercase());
            stations.reverse();
        }
        SortOrder::Line => stations.sort_by(|a, b| {
            let order = |s: &Station| {
                s.line
                    .as_deref()
                    .and_then(|l| catalog.line_order(l))
                    .unwrap_or(i64::MAX)
            };
            order(*a)
                .cmp(&order(*b))
                .then_with(|| line_position_cmp(a, b))
        }),
    }

    let needle = filter.map(|f| f.trim().to_lowercase()).unwrap_or_default();
    if !needle.is_empty() {
        stations.retain(|s| {
            s.name.to_lowercase().contains(&needle)
                || s
                    .alternate_names
                    .iter()
                    .any(|a| a.to_lowercase().contains(&needle))
        });
    }

    let mut groups: Vec<FoundGroup> = Vec::new();
    let mut slot: HashMap<StationKey, usize> = HashMap::new();
    for station in stations {
        let key = StationKey::of(station);
        let entry = FoundEntry {
            id: station.id,
            name: station.name.clone(),
            line: station.line.clone(),
            found_at: found.timestamp(station.id),
        };
        match slot.get(&key) {
            Some(&i) => groups[i].stations.push(entry),
            None => {
                slot.insert(key.clone(), groups.len());
                groups.push(FoundGroup {
                    key,
                    stations: vec![entry],
                });
            }
        }
    }
    groups
}

/// Points by `100 * lon + lat`, then everything else by name.
fn line_position_cmp(a: &Station, b: &Station) -> Ordering {
    let pos = |s: &Station| s.coord().map(|c| 100.0 * c.lon + c.lat);
    match (pos(a), pos(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    }
}

/// Lines that have every distinct station found.
pub fn completed_lines(progress: &Progress) -> BTreeSet<&str> {
    progress
        .lines
        .iter()
        .filter(|(_, p)| p.is_complete())
        .map(|(l, _)| l.as_str())
        .collect()
}
