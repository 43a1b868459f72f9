// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Folds a station name or a player guess into the form the search index
/// compares: diacritics stripped, lowercase, apostrophes dropped, every other
/// punctuation run collapsed to a single space.
///
/// Catalog fields and player input must go through this same function,
/// otherwise "Châtelet" and "chatelet" stop agreeing.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;

    for c in input.nfd() {
        if is_combining_mark(c) || is_apostrophe(c) {
            continue;
        }

        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            for lower in c.to_lowercase() {
                if !is_combining_mark(lower) {
                    out.push(lower);
                }
            }
        } else {
            pending_space = true;
        }
    }

    out
}

fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}' | '\u{2018}' | '`' | '\u{00B4}')
}
