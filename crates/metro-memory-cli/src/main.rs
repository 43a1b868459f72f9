// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metro_memory_core::catalog::{self, Catalog};
use metro_memory_core::progress::{completed_lines, SortOrder};
use metro_memory_core::{FocusTarget, GameSession, JsonFileStore, MatchConfig, MatchOutcome};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the city's features.json
    #[arg(short, long, env = "METRO_CATALOG", global = true)]
    catalog: Option<PathBuf>,

    /// Path to the city's lines.json; stations on other lines are dropped
    #[arg(short, long, global = true)]
    lines: Option<PathBuf>,

    /// Progress key prefix (defaults to the catalog's directory name)
    #[arg(long, global = true)]
    city: Option<String>,

    /// Progress file (defaults to progress.json in the config directory)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Match configuration file
    #[arg(long, env = "METRO_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Print outcomes and listings as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List cities (directories holding a features.json) under a data directory
    Cities { data_dir: PathBuf },
    /// Show the accepted alternate names, optionally for matching stations only
    Aliases { filter: Option<String> },
    /// Show stations grouped as one physical place
    Clusters,
    /// Submit one or more guesses
    Guess {
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Interactive game; `:quit` exits
    Play,
    /// Show overall and per-line progress
    Progress,
    /// List found stations
    Found {
        #[arg(long, default_value = "order")]
        sort: SortOrder,
        #[arg(long)]
        filter: Option<String>,
    },
    /// Forget all found stations for this city
    Reset,
    /// Mark every station as found
    Reveal,
    /// Write the enriched catalog as GeoJSON
    Export { out: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    if let Commands::Cities { data_dir } = &cli.command {
        return list_cities(data_dir);
    }

    let catalog_path = cli.catalog.clone().ok_or_else(|| {
        anyhow::anyhow!("No catalog given. Please specify --catalog or METRO_CATALOG.")
    })?;
    let config_path = cli.config.clone().unwrap_or_else(MatchConfig::default_path);
    let config = MatchConfig::load(&config_path)?;

    let lines = match &cli.lines {
        Some(path) => Some(
            catalog::load_lines(path).with_context(|| format!("Failed to load {}", path.display()))?,
        ),
        None => None,
    };
    let catalog = Arc::new(
        Catalog::load(&catalog_path, lines, &config)
            .with_context(|| format!("Failed to load {}", catalog_path.display()))?,
    );
    log::info!("Loaded {} stations from {:?}", catalog.len(), catalog_path);

    match &cli.command {
        Commands::Aliases { filter } => {
            print_aliases(&catalog, filter.as_deref());
            return Ok(());
        }
        Commands::Clusters => {
            print_clusters(&catalog);
            return Ok(());
        }
        Commands::Export { out } => {
            let fc = catalog.to_feature_collection();
            let content = serde_json::to_string_pretty(&fc)?;
            std::fs::write(out, content).with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Exported {} stations to {}", catalog.len(), out.display());
            return Ok(());
        }
        _ => {}
    }

    let city = cli
        .city
        .clone()
        .or_else(|| city_from_path(&catalog_path))
        .unwrap_or_else(|| "default".to_string());
    let store_path = cli.store.clone().unwrap_or_else(JsonFileStore::default_path);
    let store = JsonFileStore::open(&store_path)
        .with_context(|| format!("Failed to open progress store {}", store_path.display()))?;
    let mut session = GameSession::open(catalog, &config, &city, store)?;

    match &cli.command {
        Commands::Guess { inputs } => {
            for input in inputs {
                guess(&mut session, input, cli.json)?;
            }
        }
        Commands::Play => play(&mut session, cli.json)?,
        Commands::Progress => print_progress(&session, cli.json)?,
        Commands::Found { sort, filter } => {
            let groups = session.found_list(*sort, filter.as_deref());
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&groups)?);
            } else {
                for group in &groups {
                    let lines: Vec<&str> = group
                        .stations
                        .iter()
                        .filter_map(|e| e.line.as_deref())
                        .collect();
                    let when = group.stations[0]
                        .found_at
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default();
                    println!("{:<40} {:<16} {}", group.stations[0].name, lines.join(","), when);
                }
                println!("{} stations", groups.len());
            }
        }
        Commands::Reset => {
            session.reset()?;
            println!("Progress for '{}' cleared.", city);
        }
        Commands::Reveal => {
            session.reveal_all()?;
            println!("Revealed all {} stations of '{}'.", session.catalog().len(), city);
        }
        Commands::Cities { .. }
        | Commands::Aliases { .. }
        | Commands::Clusters
        | Commands::Export { .. } => {}
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    TermLogger::init(
        level,
        ConfigBuilder::new().set_time_level(LevelFilter::Off).build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;
    Ok(())
}

fn city_from_path(path: &Path) -> Option<String> {
    path.parent()?
        .file_name()?
        .to_str()
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
}

fn list_cities(data_dir: &Path) -> Result<()> {
    let mut count = 0;
    for entry in WalkDir::new(data_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == "features.json")
    {
        let city = city_from_path(entry.path()).unwrap_or_default();
        println!("{:<20} {}", city, entry.path().display());
        count += 1;
    }
    if count == 0 {
        println!("No features.json found under {}", data_dir.display());
    }
    Ok(())
}

fn print_aliases(catalog: &Catalog, filter: Option<&str>) {
    let needle = filter.map(|f| f.to_lowercase());
    for station in catalog.stations() {
        if let Some(n) = &needle {
            if !station.name.to_lowercase().contains(n) {
                continue;
            }
        }
        println!("{} [{}]", station.label(), station.id);
        for alt in &station.alternate_names {
            println!("    {}", alt);
        }
    }
}

fn print_clusters(catalog: &Catalog) {
    for (key, members) in catalog.clusters() {
        let names: Vec<String> = members
            .iter()
            .filter_map(|id| catalog.get(*id))
            .map(|s| format!("{} ({})", s.name, s.line.as_deref().unwrap_or("-")))
            .collect();
        println!("{:>6}: {}", key, names.join(", "));
    }
    println!("{} clusters", catalog.clusters().len());
}

fn guess(session: &mut GameSession<JsonFileStore>, input: &str, json: bool) -> Result<()> {
    let before = session.progress();
    let Some(outcome) = session.submit(input)? else {
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string(&outcome)?);
        return Ok(());
    }

    match &outcome {
        MatchOutcome::Success {
            newly_found_ids,
            focus,
            ..
        } => {
            let names: Vec<&str> = newly_found_ids
                .iter()
                .filter_map(|id| session.catalog().get(*id))
                .map(|s| s.label())
                .collect();
            println!("Found: {}", names.join(", "));
            if let Some(target) = focus {
                println!("  {}", describe_focus(target));
            }
            let after = session.progress();
            for line in after.newly_completed_lines(&before) {
                println!("  Line {} complete!", line);
            }
            println!(
                "  {}/{} ({:.1}%)",
                after.found_unique,
                after.total_unique,
                after.found_proportion * 100.0
            );
        }
        MatchOutcome::AlreadyFound => println!("Already found: {}", input.trim()),
        MatchOutcome::Wrong => println!("No station matches '{}'", input.trim()),
    }
    Ok(())
}

fn describe_focus(target: &FocusTarget) -> String {
    match target {
        FocusTarget::Point(c) => format!("at {:.5}, {:.5}", c.lat, c.lon),
        FocusTarget::Bounds(b) => format!(
            "within {:.5},{:.5} .. {:.5},{:.5}",
            b.min_lat, b.min_lon, b.max_lat, b.max_lon
        ),
    }
}

fn play(session: &mut GameSession<JsonFileStore>, json: bool) -> Result<()> {
    if session.is_new_player() {
        println!("Name as many stations as you can. Type :quit to stop.");
    }
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == ":quit" {
            break;
        }
        guess(session, input, json)?;
    }
    Ok(())
}

fn print_progress(session: &GameSession<JsonFileStore>, json: bool) -> Result<()> {
    let progress = session.progress();
    if json {
        println!("{}", serde_json::to_string_pretty(&progress)?);
        return Ok(());
    }

    println!(
        "{}/{} stations ({:.1}%)",
        progress.found_unique,
        progress.total_unique,
        progress.found_proportion * 100.0
    );
    let catalog = session.catalog();
    let complete = completed_lines(&progress);
    let mut lines: Vec<_> = progress.lines.iter().collect();
    lines.sort_by_key(|(line, _)| (catalog.line_order(line).unwrap_or(i64::MAX), line.to_string()));
    for (line, p) in lines {
        let name = catalog
            .lines()
            .and_then(|l| l.get(line.as_str()))
            .map(|info| info.name.as_str())
            .unwrap_or(line.as_str());
        let mark = if complete.contains(line.as_str()) { " *" } else { "" };
        println!("  {:<24} {:>4}/{:<4}{}", name, p.found, p.total, mark);
    }
    Ok(())
}
