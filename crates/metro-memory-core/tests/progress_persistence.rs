// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use chrono::{TimeZone, Utc};
use metro_memory_core::catalog::Station;
use metro_memory_core::{Catalog, GameSession, JsonFileStore, MatchConfig, ProgressStore, SortOrder};
use std::sync::Arc;

fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::from_stations(
        vec![
            Station::point(1, "Times Sq", Some("N"), -73.986229, 40.755983),
            Station::point(2, "Times Sq", Some("Q"), -73.986229, 40.755983),
            Station::point(3, "Canal St", Some("N"), -74.0, 40.719),
            Station::point(4, "Atlantic Av", Some("Q"), -73.977, 40.684),
        ],
        None,
        &MatchConfig::default(),
    ))
}

#[test]
fn test_progress_survives_reopen() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("progress.json");
    let config = MatchConfig::default();
    let t = Utc.with_ymd_and_hms(2024, 3, 9, 18, 45, 0).unwrap();

    {
        let store = JsonFileStore::open(&path)?;
        let mut session = GameSession::open(catalog(), &config, "ny", store)?;
        session.submit_at("Times Sq", t)?;
    }

    let store = JsonFileStore::open(&path)?;
    assert_eq!(
        store.get("ny-stations-found-at")?.and_then(|v| v.get("1").cloned()),
        Some(serde_json::json!("2024-03-09T18:45:00.000Z"))
    );

    let session = GameSession::open(catalog(), &config, "ny", store)?;
    assert_eq!(session.found().ids(), &[1, 2]);
    assert_eq!(session.found().timestamp(2), Some(t));
    assert!(!session.is_new_player());

    // Same name and coordinates on two lines count once
    let progress = session.progress();
    assert_eq!(progress.total_unique, 3);
    assert_eq!(progress.found_unique, 1);
    Ok(())
}

#[test]
fn test_cities_do_not_share_progress() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("progress.json");
    let config = MatchConfig::default();

    let mut ny = GameSession::open(catalog(), &config, "ny", JsonFileStore::open(&path)?)?;
    ny.submit("Canal St")?;
    drop(ny);

    let other = GameSession::open(catalog(), &config, "philly", JsonFileStore::open(&path)?)?;
    assert!(other.found().is_empty());
    assert!(other.is_new_player());
    Ok(())
}

#[test]
fn test_reset_and_reveal_persist() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("progress.json");
    let config = MatchConfig::default();
    let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let later = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

    let mut session = GameSession::open(catalog(), &config, "ny", JsonFileStore::open(&path)?)?;
    session.submit_at("Canal St", t)?;
    session.reveal_all_at(later)?;
    drop(session);

    let session = GameSession::open(catalog(), &config, "ny", JsonFileStore::open(&path)?)?;
    assert_eq!(session.found().len(), 4);
    assert_eq!(session.found().timestamp(3), Some(t));
    assert_eq!(session.found().timestamp(4), Some(later));

    let groups = session.found_list(SortOrder::Order, None);
    assert_eq!(groups.len(), 3, "Times Sq records share one group");
    assert_eq!(groups.last().map(|g| g.stations[0].id), Some(3));

    let mut session = session;
    session.reset()?;
    drop(session);

    let session = GameSession::open(catalog(), &config, "ny", JsonFileStore::open(&path)?)?;
    assert!(session.found().is_empty());
    assert!(session.found().timestamps().is_empty());
    assert!(session.is_new_player());
    Ok(())
}

#[test]
fn test_narrower_catalog_keeps_saved_progress() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("progress.json");
    let config = MatchConfig::default();
    let t = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();

    let mut session = GameSession::open(catalog(), &config, "ny", JsonFileStore::open(&path)?)?;
    session.submit_at("Atlantic Av", t)?;
    session.submit_at("Canal St", t)?;
    drop(session);

    // Only the N line survives, so Atlantic Av is unknown for this run
    let n_only = Arc::new(Catalog::from_stations(
        vec![
            Station::point(1, "Times Sq", Some("N"), -73.986229, 40.755983),
            Station::point(3, "Canal St", Some("N"), -74.0, 40.719),
        ],
        None,
        &config,
    ));
    let narrow = GameSession::open(n_only, &config, "ny", JsonFileStore::open(&path)?)?;
    assert_eq!(narrow.progress().found_unique, 1);
    drop(narrow);

    let session = GameSession::open(catalog(), &config, "ny", JsonFileStore::open(&path)?)?;
    assert_eq!(session.found().ids(), &[4, 3]);
    assert_eq!(session.found().timestamp(4), Some(t));
    assert_eq!(session.progress().found_unique, 2);
    Ok(())
}
