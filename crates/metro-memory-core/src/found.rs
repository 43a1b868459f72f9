// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::catalog::StationId;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::{BTreeMap, HashSet};

/// Found station ids in discovery order plus first-found timestamps.
///
/// Values are replaced wholesale by the session; every mutator returns a new
/// state instead of editing in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoundState {
    ids: Vec<StationId>,
    timestamps: BTreeMap<StationId, DateTime<Utc>>,
}

impl FoundState {
    pub fn new(ids: Vec<StationId>, timestamps: BTreeMap<StationId, DateTime<Utc>>) -> Self {
        let mut seen = HashSet::with_capacity(ids.len());
        let ids = ids.into_iter().filter(|id| seen.insert(*id)).collect();
        Self { ids, timestamps }
    }

    pub fn ids(&self) -> &[StationId] {
        &self.ids
    }

    pub fn timestamps(&self) -> &BTreeMap<StationId, DateTime<Utc>> {
        &self.timestamps
    }

    pub fn contains(&self, id: StationId) -> bool {
        self.ids.contains(&id)
    }

    pub fn timestamp(&self, id: StationId) -> Option<DateTime<Utc>> {
        self.timestamps.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Appends `new_ids`; timestamps are only written where none exists.
    pub fn recorded(&self, new_ids: &[StationId], now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        let mut present: HashSet<StationId> = next.ids.iter().copied().collect();
        for &id in new_ids {
            if present.insert(id) {
                next.ids.push(id);
            }
            next.timestamps.entry(id).or_insert(now);
        }
        next
    }

    /// Gives every found id accepted by `known` that has no timestamp the
    /// time `now`. Other ids are left as they are.
    pub fn backfilled<F>(&self, now: DateTime<Utc>, known: F) -> Self
    where
        F: Fn(StationId) -> bool,
    {
        let mut next = self.clone();
        for &id in self.ids.iter().filter(|&&id| known(id)) {
            next.timestamps.entry(id).or_insert(now);
        }
        next
    }
}

/// `2026-01-02T03:04:05.678Z`
pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_new_dedupes_in_order() {
        let state = FoundState::new(vec![3, 1, 3, 2, 1], BTreeMap::new());
        assert_eq!(state.ids(), &[3, 1, 2]);
    }

    #[test]
    fn test_recorded_never_overwrites() {
        let state = FoundState::default().recorded(&[5], at(0));
        let next = state.recorded(&[5, 9], at(60));

        assert_eq!(next.ids(), &[5, 9]);
        assert_eq!(next.timestamp(5), Some(at(0)));
        assert_eq!(next.timestamp(9), Some(at(60)));
        // the original value is untouched
        assert_eq!(state.ids(), &[5]);
    }

    #[test]
    fn test_backfill_skips_unknown_ids() {
        let mut stamps = BTreeMap::new();
        stamps.insert(1, at(0));
        let state = FoundState::new(vec![1, 2, 42], stamps).backfilled(at(100), |id| id < 10);
        assert_eq!(state.timestamp(1), Some(at(0)));
        assert_eq!(state.timestamp(2), Some(at(100)));
        assert_eq!(state.timestamp(42), None);
        assert_eq!(state.ids(), &[1, 2, 42]);
    }

    #[test]
    fn test_timestamp_format() {
        let t = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let s = format_timestamp(&t);
        assert_eq!(s, "2023-11-14T22:13:20.123Z");
        assert_eq!(parse_timestamp(&s), Some(t));
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
