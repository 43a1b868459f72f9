// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Alternate-name generation for station names.
//!
//! Every rule is applied independently and the results are unioned. The
//! output never contains blank strings or the canonical name itself.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Splitters tried on every name. The joiner for the reversed form is the
/// separator itself.
const CONNECTORS: [&str; 3] = [" - ", " / ", " & "];

const PABT: &str = "PABT";

/// Curated aliases for names no rule can derive.
const MANUAL_ALIASES: &[(&str, &[&str])] = &[(
    "42 St - Port Authority Bus Terminal",
    &[
        "Port Authority Bus Terminal",
        "Port Authority Bus Terminal 42 St",
        "42 St Port Authority Bus Terminal",
        "PABT",
        "42 St PABT",
        "PABT 42 St",
    ],
)];

struct Shortening {
    pattern: Regex,
    replacements: &'static [&'static str],
}

fn shortenings() -> &'static [Shortening] {
    static RULES: OnceLock<Vec<Shortening>> = OnceLock::new();
    RULES.get_or_init(|| {
        let table: [(&str, &'static [&'static str]); 9] = [
            (r"(?i)\bpark\b", &["Pk"]),
            (r"(?i)\bplaza\b", &["Plz"]),
            (r"(?i)\bpoint\b", &["Pt"]),
            (r"(?i)\broute\b", &["Rte"]),
            (r"(?i)\bavenue\b", &["Ave"]),
            (r"(?i)\bbroadway\b", &["Bway", "B'way"]),
            (r"(?i)\bboulevard\b", &["Blvd"]),
            (r"(?i)\bstation\b", &["Stn"]),
            (r"(?i)\bport authority bus terminal\b", &[PABT]),
        ];
        table
            .into_iter()
            .map(|(pattern, replacements)| Shortening {
                pattern: Regex::new(pattern).unwrap(),
                replacements,
            })
            .collect()
    })
}

fn directional_re() -> &'static Regex {
    static DIR_RE: OnceLock<Regex> = OnceLock::new();
    DIR_RE.get_or_init(|| Regex::new(r"(?i)\b(east|west|north|south)\b").unwrap())
}

fn beach_re() -> &'static Regex {
    static BEACH_RE: OnceLock<Regex> = OnceLock::new();
    BEACH_RE.get_or_init(|| Regex::new(r"(?i)^beach (\d+)(?:st|nd|rd|th)? st\b(.*)$").unwrap())
}

/// Aliases derived for one canonical name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedAliases {
    pub alternates: BTreeSet<String>,
    /// Set when the directional abbreviation changes the name.
    pub display_name: Option<String>,
}

/// Owns the manual override table; build one per catalog load.
#[derive(Debug, Clone)]
pub struct AliasGenerator {
    manual: BTreeMap<String, Vec<String>>,
}

impl Default for AliasGenerator {
    fn default() -> Self {
        Self::new(&BTreeMap::new())
    }
}

impl AliasGenerator {
    /// Built-in overrides extended with `extra`, keyed case-insensitively.
    pub fn new(extra: &BTreeMap<String, Vec<String>>) -> Self {
        let mut manual: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, aliases) in MANUAL_ALIASES {
            manual
                .entry(name.trim().to_lowercase())
                .or_default()
                .extend(aliases.iter().map(|a| a.to_string()));
        }
        for (name, aliases) in extra {
            manual
                .entry(name.trim().to_lowercase())
                .or_default()
                .extend(aliases.iter().cloned());
        }
        Self { manual }
    }

    pub fn generate(&self, name: &str) -> GeneratedAliases {
        let canonical = name.trim();
        if canonical.is_empty() {
            return GeneratedAliases::default();
        }

        let mut out = BTreeSet::new();
        let mut display_name = None;

        let mut bases = vec![canonical.to_string()];
        if let Some(short) = abbreviate_directions(canonical) {
            out.insert(short.clone());
            display_name = Some(short.clone());
            bases.push(short);
        }

        for base in &bases {
            split_connectors(base, &mut out);
            for rule in shortenings() {
                if !rule.pattern.is_match(base) {
                    continue;
                }
                for replacement in rule.replacements {
                    let replaced = rule.pattern.replace_all(base, *replacement);
                    if replaced != base.as_str() {
                        out.insert(replaced.into_owned());
                    }
                }
                if rule.replacements.contains(&PABT) {
                    out.insert(PABT.to_string());
                }
            }
        }

        beach_numbers(canonical, &mut out);

        let mut lookups: Vec<String> = bases.clone();
        lookups.extend(out.iter().cloned());
        for variant in lookups {
            if let Some(aliases) = self.manual.get(&variant.to_lowercase()) {
                out.extend(aliases.iter().map(|a| a.trim().to_string()));
            }
        }

        out.retain(|alt| !alt.trim().is_empty() && alt != canonical);

        GeneratedAliases {
            alternates: out,
            display_name,
        }
    }
}

/// "North Station" -> "N Station". Single-word names are left alone.
pub fn abbreviate_directions(name: &str) -> Option<String> {
    if !name.contains(char::is_whitespace) {
        return None;
    }
    let short = directional_re().replace_all(name, |caps: &regex::Captures| {
        caps[1]
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase().to_string())
            .unwrap_or_default()
    });
    (short != name).then(|| short.into_owned())
}

fn split_connectors(name: &str, out: &mut BTreeSet<String>) {
    for sep in CONNECTORS {
        if !name.contains(sep) {
            continue;
        }
        let parts: Vec<&str> = name
            .split(sep)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 2 {
            continue;
        }
        let reversed: Vec<&str> = parts.iter().rev().copied().collect();
        out.insert(parts.join(" "));
        out.insert(reversed.join(sep));
        out.insert(reversed.join(" "));
    }
}

fn beach_numbers(name: &str, out: &mut BTreeSet<String>) {
    let Some(caps) = beach_re().captures(name) else {
        return;
    };
    let number = &caps[1];
    let rest = &caps[2];
    out.insert(format!("B {} St{}", number, rest));
    out.insert(format!("B {}th St{}", number, rest));
    if let Ok(n) = number.parse::<u64>() {
        out.insert(format!("B {}{} St{}", number, ordinal_suffix(n), rest));
    }
}

pub fn ordinal_suffix(n: u64) -> &'static str {
    if (11..=13).contains(&(n % 100)) {
        return "th";
    }
    match n % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}
