// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use chrono::{TimeZone, Utc};
use metro_memory_core::catalog::Station;
use metro_memory_core::search::SearchOptions;
use metro_memory_core::{Catalog, FoundState, MatchConfig, MatchOutcome, Resolver};
use std::sync::Arc;

fn resolver(stations: Vec<Station>) -> Resolver {
    let catalog = Catalog::from_stations(stations, None, &MatchConfig::default());
    Resolver::new(Arc::new(catalog), SearchOptions::default())
}

#[test]
fn test_prefix_name_stays_separate_from_neighbour() {
    // "Central" and "Central Park" a few dozen meters apart
    let r = resolver(vec![
        Station::point(1, "Central", Some("1"), -73.95, 40.8),
        Station::point(2, "Central Park", Some("1"), -73.9505, 40.8002),
    ]);

    assert!(r.catalog().clusters().is_empty(), "distinct names must not merge");
    let outcome = r.resolve("Central", &FoundState::default()).unwrap();
    assert_eq!(outcome.newly_found_ids(), &[1]);
}

#[test]
fn test_same_place_on_two_lines_found_together() {
    let r = resolver(vec![
        Station::point(10, "Times Sq", Some("N"), -73.986229, 40.755983),
        Station::point(11, "Times Sq", Some("Q"), -73.986229, 40.755983),
    ]);

    let outcome = r.resolve("Times Sq", &FoundState::default()).unwrap();
    assert_eq!(outcome.newly_found_ids(), &[10, 11]);
}

#[test]
fn test_port_authority_variants() {
    let r = resolver(vec![
        Station::point(3, "42 St - Port Authority Bus Terminal", Some("A"), -73.989938, 40.757308),
        Station::point(4, "Times Sq", Some("N"), -73.986229, 40.755983),
    ]);

    for input in [
        "Port Authority Bus Terminal",
        "PABT",
        "42 St PABT",
        "PABT 42 St",
        "Port Authority Bus Terminal - 42 St",
        "42 st port authority bus terminal",
    ] {
        let outcome = r.resolve(input, &FoundState::default());
        assert_eq!(
            outcome.as_ref().map(|o| o.newly_found_ids().to_vec()),
            Some(vec![3]),
            "input {:?} gave {:?}",
            input,
            outcome
        );
    }
}

#[test]
fn test_nonsense_is_wrong_and_changes_nothing() {
    let r = resolver(vec![
        Station::point(1, "Times Sq", Some("N"), -73.986229, 40.755983),
        Station::point(2, "Canal St", Some("N"), -74.0, 40.719),
    ]);
    let found = FoundState::default().recorded(&[2], Utc::now());
    let before = found.clone();

    assert_eq!(r.resolve("qqqqqq", &found), Some(MatchOutcome::Wrong));
    assert_eq!(found, before);
}

#[test]
fn test_cluster_sibling_gets_own_timestamp() {
    let r = resolver(vec![
        Station::point(5, "Fulton St", Some("A"), -74.007691, 40.710197),
        Station::point(9, "Broadway-Nassau St", Some("2"), -74.0077, 40.7103),
    ]);
    let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let later = Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 0).unwrap();
    let found = FoundState::default().recorded(&[5], t);

    let outcome = r.resolve("Broadway-Nassau St", &found).unwrap();
    assert_eq!(outcome.newly_found_ids(), &[9]);

    let found = found.recorded(outcome.newly_found_ids(), later);
    assert_eq!(found.timestamp(5), Some(t));
    assert_eq!(found.timestamp(9), Some(later));
}

#[test]
fn test_repeat_submission_is_already_found() {
    let r = resolver(vec![
        Station::point(1, "Times Sq", Some("N"), -73.986229, 40.755983),
        Station::point(2, "Times Sq", Some("Q"), -73.986229, 40.755983),
    ]);
    let first = r.resolve("times sq", &FoundState::default()).unwrap();
    let found = FoundState::default().recorded(first.newly_found_ids(), Utc::now());

    for _ in 0..3 {
        assert_eq!(r.resolve("Times Sq", &found), Some(MatchOutcome::AlreadyFound));
    }
}

#[test]
fn test_directional_abbreviation_matches() {
    let r = resolver(vec![Station::point(6, "North Station", Some("B"), -71.06, 42.366)]);
    assert_eq!(r.catalog().get(6).unwrap().label(), "N Station");

    for input in ["N Station", "north station", "N Stn"] {
        let outcome = r.resolve(input, &FoundState::default()).unwrap();
        assert_eq!(outcome.newly_found_ids(), &[6], "input {:?}", input);
    }
}

#[test]
fn test_names_differing_in_last_token_stay_apart() {
    let r = resolver(vec![
        Station::point(1, "Avenue H", Some("Q"), -73.961, 40.629),
        Station::point(2, "Avenue I", Some("F"), -73.976, 40.625),
        Station::point(3, "Avenue J", Some("Q"), -73.957, 40.625),
        Station::point(4, "103 St", Some("1"), -73.968, 40.799),
        Station::point(5, "104 St", Some("A"), -73.837, 40.681),
    ]);

    for (input, id) in [
        ("Avenue H", 1),
        ("Avenue I", 2),
        ("Avenue J", 3),
        ("103 St", 4),
        ("104 St", 5),
    ] {
        let outcome = r.resolve(input, &FoundState::default()).unwrap();
        assert_eq!(outcome.newly_found_ids(), &[id], "input {:?}", input);
    }

    let found = FoundState::default().recorded(&[4], Utc::now());
    assert_eq!(r.resolve("103 St", &found), Some(MatchOutcome::AlreadyFound));
}
