use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use matchedge::config::EngineConfig;
use matchedge::dataset::{FeatureSchema, InferenceMatrix, TrainingSet};
use matchedge::engine::build_feature_rows;
use matchedge::ledger;
use matchedge::matches::MatchRecord;
use matchedge::odds::overround;
use matchedge::performance::analyze;
use matchedge::prediction::{evaluate_predictions, join_predictions, load_model_outputs};
use matchedge::standings::StandingsTable;
use matchedge::value::find_value_bets;

const USAGE: &str = "usage: matchedge <features|inference|standings|value-bets|performance> [--db PATH] [--division CODE] ...";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    matchedge::init_logging();

    let Some(command) = std::env::args().nth(1) else {
        return Err(anyhow!(USAGE));
    };
    let cfg = apply_cli_overrides(EngineConfig::from_env());

    let db_path = parse_path_arg("--db")
        .or_else(ledger::default_db_path)
        .context("unable to resolve sqlite path")?;
    let mut conn = ledger::open_db(&db_path)?;
    let division = parse_string_arg("--division");

    match command.as_str() {
        "features" => {
            let matches = ledger::load_matches(&conn, division.as_deref())?;
            let rows = build_feature_rows(&matches, &cfg.features)?;
            let training = TrainingSet::from_rows(&rows, &FeatureSchema::canonical().names);

            let out = parse_path_arg("--out").unwrap_or_else(|| PathBuf::from("features.jsonl"));
            let mut writer = BufWriter::new(
                File::create(&out).with_context(|| format!("create {}", out.display()))?,
            );
            for row in &rows {
                serde_json::to_writer(&mut writer, row).context("serialize feature row")?;
                writer.write_all(b"\n").context("write feature row")?;
            }
            writer.flush().context("flush feature rows")?;

            let schema_path =
                parse_path_arg("--schema").unwrap_or_else(|| out.with_extension("schema.json"));
            training.schema.save(&schema_path)?;

            println!("Feature rows: {}", rows.len());
            println!("Complete rows: {}", training.len());
            println!("Dropped (missing features): {}", training.dropped);
            println!("Rows: {}", out.display());
            println!("Schema: {}", schema_path.display());
        }
        "inference" => {
            let schema_path = parse_path_arg("--schema").context("--schema is required")?;
            let schema = FeatureSchema::load(&schema_path)?;
            let matches = ledger::load_matches(&conn, division.as_deref())?;
            let rows = build_feature_rows(&matches, &cfg.features)?;
            let matrix = InferenceMatrix::build(&rows, &schema)?;

            let out = parse_path_arg("--out").unwrap_or_else(|| PathBuf::from("inference.json"));
            let json = serde_json::to_string(&matrix).context("serialize inference matrix")?;
            std::fs::write(&out, json).with_context(|| format!("write {}", out.display()))?;
            println!("Inference rows: {} -> {}", matrix.x.len(), out.display());
        }
        "standings" => {
            let division = division.context("--division is required")?;
            let season = parse_string_arg("--season");
            let matches = ledger::load_matches(&conn, Some(&division))?;
            let table = StandingsTable::from_matches(
                matches
                    .iter()
                    .filter(|m| season.is_none() || m.season == season),
            );
            print_standings(&division, season.as_deref(), &table);
        }
        "value-bets" => {
            let pred_path = parse_path_arg("--predictions").context("--predictions is required")?;
            let outputs = load_model_outputs(&pred_path)?;
            let matches = ledger::load_matches(&conn, division.as_deref())?;
            let rows = build_feature_rows(&matches, &cfg.features)?;
            let predictions = join_predictions(&rows, &outputs);
            let bets = find_value_bets(&predictions, &cfg.value)?;

            if let Some(m) = evaluate_predictions(&predictions) {
                println!(
                    "Model: n={} accuracy={:.3} log_loss={:.4} brier={:.4}",
                    m.samples, m.accuracy, m.log_loss, m.brier
                );
            }
            print_value_bets(&bets, &matches, parse_usize_arg("--limit").unwrap_or(25));

            if has_flag("--record") {
                let n = ledger::insert_value_bets(&mut conn, &bets)?;
                println!("Recorded {n} value bets in {}", db_path.display());
            }
        }
        "performance" => {
            ledger::settle_value_bets(&conn)?;
            let bets = ledger::load_value_bets(&conn)?;
            match analyze(&bets) {
                Some(s) => {
                    println!("Settled bets: {}", s.total_bets);
                    println!("Wins/Losses: {}/{}", s.wins, s.losses);
                    println!("Win rate: {:.1}%", s.win_rate * 100.0);
                    println!("Profit (flat): {:+.2}u", s.total_profit);
                    println!("ROI: {:+.1}%", s.roi_pct);
                    println!("Avg odds: {:.2}", s.avg_odds);
                    println!("Avg edge: {:.3}", s.avg_edge);
                    println!(
                        "Kelly: staked {:.3} profit {:+.4} yield {:+.1}%",
                        s.kelly_staked, s.kelly_profit, s.kelly_yield_pct
                    );
                }
                None => println!("No settled bets in {}", db_path.display()),
            }
        }
        other => return Err(anyhow!("unknown command {other:?}\n{USAGE}")),
    }

    Ok(())
}

fn print_standings(division: &str, season: Option<&str>, table: &StandingsTable) {
    println!("{division} {}", season.unwrap_or("(all seasons)"));
    println!(
        "{:>3}  {:<24} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4} {:>4}",
        "#", "Team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts"
    );
    for row in table.ranked() {
        println!(
            "{:>3}  {:<24} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>+4} {:>4}",
            row.rank,
            row.team,
            row.played,
            row.won,
            row.drawn,
            row.lost,
            row.goals_for,
            row.goals_against,
            row.goal_difference,
            row.points
        );
    }
}

fn print_value_bets(
    bets: &[matchedge::value::ValueBetCandidate],
    matches: &[MatchRecord],
    limit: usize,
) {
    let by_id: HashMap<u64, &MatchRecord> = matches.iter().map(|m| (m.id, m)).collect();
    println!("Value bets: {}", bets.len());
    for b in bets.iter().take(limit) {
        let margin = by_id
            .get(&b.match_id)
            .and_then(|m| overround(&m.odds))
            .map(|o| format!("{:.1}%", o * 100.0))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "{} {:<4} {} v {} | {:<8} @ {:.2} model {:.3} fair {:.3} edge {:+.3} ev {:+.3} kelly {:.3} conf {:.2} margin {}",
            b.date,
            b.division,
            b.home_team,
            b.away_team,
            b.label,
            b.odds,
            b.model_prob,
            b.fair_prob,
            b.edge,
            b.expected_value,
            b.kelly_fraction,
            b.confidence,
            margin
        );
    }
}

fn apply_cli_overrides(mut cfg: EngineConfig) -> EngineConfig {
    if let Some(v) = parse_f64_arg("--min-edge") {
        cfg.value.min_edge = v.clamp(0.0, 0.5);
    }
    if let Some(v) = parse_f64_arg("--kelly-cap") {
        cfg.value.kelly_cap = v.clamp(0.0, 1.0);
    }
    if has_flag("--all-outcomes") {
        cfg.value.one_outcome_per_match = false;
    }
    if let Some(v) = parse_usize_arg("--form-window") {
        cfg.features.form_window = v.clamp(3, 38);
    }
    cfg
}

fn parse_string_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    parse_string_arg(name).map(PathBuf::from)
}

fn parse_f64_arg(name: &str) -> Option<f64> {
    parse_string_arg(name)
        .and_then(|raw| raw.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn parse_usize_arg(name: &str) -> Option<usize> {
    parse_string_arg(name).and_then(|raw| raw.parse::<usize>().ok())
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
