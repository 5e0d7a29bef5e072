use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use matchedge::ledger;
use matchedge::synthetic::{SyntheticConfig, generate_ledger};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    matchedge::init_logging();

    let defaults = SyntheticConfig::default();
    let cfg = SyntheticConfig {
        seed: parse_u64_arg("--seed").unwrap_or(defaults.seed),
        divisions: parse_divisions_arg().unwrap_or(defaults.divisions),
        teams_per_division: parse_u64_arg("--teams")
            .map(|n| n as usize)
            .unwrap_or(defaults.teams_per_division)
            .clamp(2, 40),
        seasons: parse_u64_arg("--seasons")
            .map(|n| n as usize)
            .unwrap_or(defaults.seasons)
            .clamp(1, 30),
        ..defaults
    };
    if cfg.divisions.is_empty() {
        return Err(anyhow!("no divisions to seed"));
    }

    let db_path = parse_db_path_arg()
        .or_else(ledger::default_db_path)
        .context("unable to resolve sqlite path")?;
    let mut conn = ledger::open_db(&db_path)?;

    let matches = generate_ledger(&cfg);
    let upserted = ledger::upsert_matches(&mut conn, &matches)?;

    println!("Synthetic ledger seeded");
    println!("DB: {}", db_path.display());
    println!("Divisions: {:?}", cfg.divisions);
    println!(
        "Teams/division: {}  Seasons: {}  Seed: {}",
        cfg.teams_per_division, cfg.seasons, cfg.seed
    );
    println!("Matches upserted: {upserted}");
    Ok(())
}

fn parse_db_path_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db"
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}

fn parse_u64_arg(name: &str) -> Option<u64> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && let Ok(v) = raw.trim().parse::<u64>()
        {
            return Some(v);
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && let Ok(v) = next.trim().parse::<u64>()
        {
            return Some(v);
        }
    }
    None
}

fn parse_divisions_arg() -> Option<Vec<String>> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        let raw = match arg.strip_prefix("--divisions=") {
            Some(raw) => raw,
            None if arg == "--divisions" => match args.get(idx + 1) {
                Some(next) => next.as_str(),
                None => continue,
            },
            None => continue,
        };
        let divisions = raw
            .split([',', ';', ' '])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        if !divisions.is_empty() {
            return Some(divisions);
        }
    }
    None
}
