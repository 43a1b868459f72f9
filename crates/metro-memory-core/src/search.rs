// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Approximate substring search over normalized station fields.
//!
//! Each indexed value is aligned against the pattern with a semi-global edit
//! distance (Sellers): the pattern must be consumed entirely, the text may be
//! entered and left anywhere. The alignment also carries the text offset it
//! started from, which feeds the positional part of the score.

use crate::catalog::{Station, StationId};
use crate::normalize::normalize;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Pattern of {len} characters exceeds the limit of {max}")]
    PatternTooLong { len: usize, max: usize },
    #[error("Search index error: {0}")]
    Internal(String),
}

/// Accessor for one searchable string field of a station.
pub trait SearchableField {
    fn values<'a>(&self, station: &'a Station) -> Vec<&'a str>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SearchField {
    Name,
    LongName,
    ShortName,
    AlternateNames,
}

impl SearchField {
    pub const ALL: [SearchField; 4] = [
        SearchField::Name,
        SearchField::LongName,
        SearchField::ShortName,
        SearchField::AlternateNames,
    ];
}

impl SearchableField for SearchField {
    fn values<'a>(&self, station: &'a Station) -> Vec<&'a str> {
        match self {
            SearchField::Name => vec![station.name.as_str()],
            SearchField::LongName => station.long_name.as_deref().into_iter().collect(),
            SearchField::ShortName => station.short_name.as_deref().into_iter().collect(),
            SearchField::AlternateNames => {
                station.alternate_names.iter().map(String::as_str).collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Upper bound for `errors / pattern_len + start / distance`.
    pub threshold: f64,
    /// How fast the score decays with the match's start offset.
    pub distance: usize,
    pub min_match_chars: usize,
    /// Field characters a candidate may leave after its last exact match.
    /// A substituted final character counts as unmatched.
    pub max_unmatched_tail: usize,
    /// Candidate length difference must stay strictly below this.
    pub max_length_gap: usize,
    pub max_pattern_len: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threshold: 0.15,
            distance: 10,
            min_match_chars: 2,
            max_unmatched_tail: 0,
            max_length_gap: 4,
            max_pattern_len: 64,
        }
    }
}

impl SearchOptions {
    pub fn score(&self, errors: usize, start: usize, pattern_len: usize) -> f64 {
        let accuracy = errors as f64 / pattern_len.max(1) as f64;
        let proximity = if self.distance == 0 {
            if start == 0 {
                0.0
            } else {
                1.0
            }
        } else {
            start as f64 / self.distance as f64
        };
        accuracy + proximity
    }

    /// Anchored at the start, covering the field, and of similar length.
    pub fn is_candidate(&self, hit: &SearchHit, pattern_len: usize) -> bool {
        hit.start == 0
            && hit.field_len.saturating_sub(hit.matched_end) <= self.max_unmatched_tail
            && hit.field_len.abs_diff(pattern_len) < self.max_length_gap
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: StationId,
    pub field: SearchField,
    /// Normalized field value that matched.
    pub value: String,
    pub errors: usize,
    pub start: usize,
    /// Exclusive end offset, in characters.
    pub end: usize,
    /// Exclusive end of the last character matched exactly.
    pub matched_end: usize,
    pub field_len: usize,
    pub score: f64,
}

/// Anything the resolver can query. Implementations must normalize the
/// pattern themselves or expect it normalized already.
pub trait StationSearch {
    fn search(&self, pattern: &str) -> Result<Vec<SearchHit>, SearchError>;
}

#[derive(Debug, Clone)]
struct IndexEntry {
    id: StationId,
    field: SearchField,
    text: String,
    chars: Vec<char>,
}

/// Pre-normalized values of every searchable field in a catalog.
#[derive(Debug, Clone)]
pub struct FuzzyIndex {
    entries: Vec<IndexEntry>,
    options: SearchOptions,
}

impl FuzzyIndex {
    pub fn build(stations: &[Station], options: SearchOptions) -> Self {
        Self::build_with_fields(stations, &SearchField::ALL, options)
    }

    pub fn build_with_fields(
        stations: &[Station],
        fields: &[SearchField],
        options: SearchOptions,
    ) -> Self {
        let mut entries = Vec::new();
        for station in stations {
            for field in fields {
                for raw in field.values(station) {
                    let text = normalize(raw);
                    if text.is_empty() {
                        continue;
                    }
                    entries.push(IndexEntry {
                        id: station.id,
                        field: *field,
                        chars: text.chars().collect(),
                        text,
                    });
                }
            }
        }
        log::debug!("[Search] Indexed {} field values", entries.len());
        Self { entries, options }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StationSearch for FuzzyIndex {
    fn search(&self, pattern: &str) -> Result<Vec<SearchHit>, SearchError> {
        let pattern: Vec<char> = normalize(pattern).chars().collect();
        if pattern.len() < self.options.min_match_chars.max(1) {
            return Ok(Vec::new());
        }
        if pattern.len() > self.options.max_pattern_len {
            return Err(SearchError::PatternTooLong {
                len: pattern.len(),
                max: self.options.max_pattern_len,
            });
        }

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let alignment = best_alignment(&pattern, &entry.chars, &self.options)?;
                (alignment.score <= self.options.threshold).then(|| SearchHit {
                    id: entry.id,
                    field: entry.field,
                    value: entry.text.clone(),
                    errors: alignment.errors,
                    start: alignment.start,
                    end: alignment.end,
                    matched_end: alignment.matched_end,
                    field_len: entry.chars.len(),
                    score: alignment.score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            a.errors
                .cmp(&b.errors)
                .then(a.score.total_cmp(&b.score))
                .then(a.id.cmp(&b.id))
        });
        Ok(hits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alignment {
    pub errors: usize,
    pub start: usize,
    pub end: usize,
    pub matched_end: usize,
    pub score: f64,
}

/// DP cell: edit cost, text offset the path entered at, and the end of the
/// last text character the path matched exactly.
#[derive(Debug, Clone, Copy)]
struct Cell {
    cost: usize,
    start: usize,
    matched_end: usize,
}

impl Cell {
    fn rank(&self) -> (usize, usize, Reverse<usize>) {
        (self.cost, self.start, Reverse(self.matched_end))
    }

    fn min(self, other: Cell) -> Cell {
        if other.rank() < self.rank() {
            other
        } else {
            self
        }
    }

    fn step(self) -> Cell {
        Cell {
            cost: self.cost + 1,
            ..self
        }
    }
}

/// Best-scoring semi-global alignment of `pattern` inside `text`. Ties keep
/// the alignment that reaches further into the text.
pub fn best_alignment(pattern: &[char], text: &[char], options: &SearchOptions) -> Option<Alignment> {
    let m = pattern.len();
    if m == 0 || text.is_empty() {
        return None;
    }

    // one cell per pattern prefix length, for the current text column
    let mut column: Vec<Cell> = (0..=m)
        .map(|i| Cell {
            cost: i,
            start: 0,
            matched_end: 0,
        })
        .collect();
    let mut best: Option<Alignment> = None;

    for (j, &tc) in text.iter().enumerate() {
        let end = j + 1;
        let mut diag = column[0];
        column[0] = Cell {
            cost: 0,
            start: end,
            matched_end: 0,
        };
        for i in 1..=m {
            let above = column[i];
            let substitute = if pattern[i - 1] == tc {
                Cell {
                    matched_end: end,
                    ..diag
                }
            } else {
                diag.step()
            };
            let skip_text = above.step();
            let skip_pattern = column[i - 1].step();
            diag = above;
            column[i] = substitute.min(skip_text).min(skip_pattern);
        }

        let Cell {
            cost: errors,
            start,
            matched_end,
        } = column[m];
        if errors >= m {
            continue;
        }
        let score = options.score(errors, start, m);
        let better = match &best {
            None => true,
            Some(b) => score <= b.score,
        };
        if better {
            best = Some(Alignment {
                errors,
                start,
                end,
                matched_end,
                score,
            });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn align(pattern: &str, text: &str) -> Option<Alignment> {
        best_alignment(&chars(pattern), &chars(text), &SearchOptions::default())
    }

    #[test]
    fn test_exact_alignment() {
        let a = align("times sq", "times sq").unwrap();
        assert_eq!((a.errors, a.start, a.end), (0, 0, 8));
        assert_eq!(a.score, 0.0);
    }

    #[test]
    fn test_prefix_alignment_leaves_tail() {
        let a = align("central", "central park").unwrap();
        assert_eq!((a.errors, a.start, a.end), (0, 0, 7));
    }

    #[test]
    fn test_offset_alignment() {
        let a = align("park", "central park").unwrap();
        assert!(a.start > 0);
        assert!(a.score > SearchOptions::default().threshold);
    }

    #[test]
    fn test_typo_alignment() {
        let a = align("tims sq", "times sq").unwrap();
        assert_eq!(a.errors, 1);
        assert_eq!(a.start, 0);
        assert_eq!(a.end, 8);
    }

    #[test]
    fn test_tie_prefers_longer_reach() {
        // one error ending at 1, 2 or 3, all anchored at 0
        let a = align("ab", "axb").unwrap();
        assert_eq!((a.errors, a.start, a.end), (1, 0, 3));
        assert_eq!(a.matched_end, 3);

        let b = align("ab", "abb").unwrap();
        assert_eq!((b.errors, b.end), (0, 2));
    }

    #[test]
    fn test_substituted_last_char_is_not_matched() {
        let a = align("avenue h", "avenue i").unwrap();
        assert_eq!((a.errors, a.start, a.end), (1, 0, 8));
        assert_eq!(a.matched_end, 7);

        let b = align("centrl park", "central park").unwrap();
        assert_eq!(b.matched_end, 12);
    }

    #[test]
    fn test_candidate_needs_exact_last_char() {
        let options = SearchOptions::default();
        let stations = vec![
            Station::point(1, "Avenue H", None, 0.0, 0.0),
            Station::point(2, "Avenue I", None, 1.0, 1.0),
        ];
        let index = FuzzyIndex::build(&stations, options.clone());

        let hits = index.search("Avenue H").unwrap();
        assert_eq!(hits.iter().map(|h| h.id).collect::<Vec<_>>(), vec![1, 2]);
        let candidates: Vec<_> = hits
            .iter()
            .filter(|h| options.is_candidate(h, 8))
            .map(|h| h.id)
            .collect();
        assert_eq!(candidates, vec![1]);
    }

    fn catalog_stations() -> Vec<Station> {
        let mut wtc = Station::point(3, "World Trade Center", Some("E"), -74.01, 40.71);
        wtc.alternate_names.insert("WTC".to_string());
        let mut blank = Station::point(4, "  ", Some("E"), 0.0, 0.0);
        blank.short_name = Some("--".to_string());
        vec![
            Station::point(1, "Central", Some("1"), 0.0, 0.0),
            Station::point(2, "Central Park", Some("1"), 0.0, 0.0),
            wtc,
            blank,
        ]
    }

    #[test]
    fn test_empty_values_not_indexed() {
        let index = FuzzyIndex::build(&catalog_stations(), SearchOptions::default());
        // 3 names + 1 alternate; the blank station contributes nothing
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_search_ranks_and_filters() {
        let options = SearchOptions::default();
        let index = FuzzyIndex::build(&catalog_stations(), options.clone());

        let hits = index.search("Central").unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![1, 2]);

        let candidates: Vec<_> = hits
            .iter()
            .filter(|h| options.is_candidate(h, 7))
            .map(|h| h.id)
            .collect();
        assert_eq!(candidates, vec![1]);
    }

    #[test]
    fn test_alternate_field_hit() {
        let index = FuzzyIndex::build(&catalog_stations(), SearchOptions::default());
        let hits = index.search("wtc").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].field, SearchField::AlternateNames);
        assert_eq!(hits[0].value, "wtc");
    }

    #[test]
    fn test_short_and_garbage_patterns() {
        let index = FuzzyIndex::build(&catalog_stations(), SearchOptions::default());
        assert!(index.search("c").unwrap().is_empty());
        assert!(index.search("qqqqqq").unwrap().is_empty());
        assert!(index.search("   ").unwrap().is_empty());
    }

    #[test]
    fn test_pattern_too_long() {
        let index = FuzzyIndex::build(&catalog_stations(), SearchOptions::default());
        let long = "a".repeat(65);
        assert_eq!(
            index.search(&long),
            Err(SearchError::PatternTooLong { len: 65, max: 64 })
        );
    }
}
