use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;

use matchedge::ledger;
use matchedge::matches::OddsTriplet;
use matchedge::outcome::{Outcome, Prob3};
use matchedge::performance::analyze;
use matchedge::prediction::MatchPrediction;
use matchedge::synthetic::{SyntheticConfig, generate_ledger};
use matchedge::value::find_value_bets;

fn temp_db(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!(
        "matchedge-{tag}-{}-{nanos}.sqlite",
        std::process::id()
    ))
}

#[test]
fn synthetic_ledger_round_trips_through_sqlite() {
    let path = temp_db("roundtrip");
    let mut conn = ledger::open_db(&path).unwrap();
    let matches = generate_ledger(&SyntheticConfig::default());
    assert_eq!(ledger::upsert_matches(&mut conn, &matches).unwrap(), matches.len());
    // Upserting again is idempotent.
    ledger::upsert_matches(&mut conn, &matches).unwrap();

    let mut expected = matches.clone();
    expected.sort_by_key(|m| m.order_key());
    let loaded = ledger::load_matches(&conn, None).unwrap();
    assert_eq!(loaded, expected);

    let sp1 = ledger::load_matches(&conn, Some("SP1")).unwrap();
    assert_eq!(sp1.len(), matches.iter().filter(|m| m.division == "SP1").count());

    drop(conn);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn recorded_bets_settle_from_the_ledger() {
    let path = temp_db("settle");
    let mut conn = ledger::open_db(&path).unwrap();
    let matches = generate_ledger(&SyntheticConfig {
        divisions: vec!["E0".to_string()],
        seasons: 1,
        ..SyntheticConfig::default()
    });
    ledger::upsert_matches(&mut conn, &matches).unwrap();

    // A model that always backs the away side hard, with results unknown at bet time.
    let predictions: Vec<MatchPrediction> = matches
        .iter()
        .filter(|m| m.odds.has_any_valid())
        .take(20)
        .map(|m| MatchPrediction {
            match_id: m.id,
            division: m.division.clone(),
            date: m.date,
            home_team: m.home_team.clone(),
            away_team: m.away_team.clone(),
            probs: Prob3::new(0.05, 0.05, 0.90),
            odds: m.odds,
            actual: None,
        })
        .collect();
    let bets = find_value_bets(&predictions, &Default::default()).unwrap();
    assert_eq!(bets.len(), 20);
    assert!(bets.iter().all(|b| b.outcome == Outcome::Away));

    ledger::insert_value_bets(&mut conn, &bets).unwrap();
    assert!(analyze(&ledger::load_value_bets(&conn).unwrap()).is_none());

    assert_eq!(ledger::settle_value_bets(&conn).unwrap(), 20);
    assert_eq!(ledger::settle_value_bets(&conn).unwrap(), 0);

    let stored = ledger::load_value_bets(&conn).unwrap();
    assert_eq!(stored.len(), 20);
    assert!(stored.windows(2).all(|w| w[0].edge >= w[1].edge));
    let summary = analyze(&stored).unwrap();
    assert_eq!(summary.total_bets, 20);
    let away_wins = matches
        .iter()
        .filter(|m| stored.iter().any(|b| b.match_id == m.id))
        .filter(|m| m.result == Outcome::Away)
        .count();
    assert_eq!(summary.wins, away_wins);

    drop(conn);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn unknown_odds_survive_storage_as_absent() {
    let path = temp_db("odds");
    let mut conn = ledger::open_db(&path).unwrap();
    let date = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
    let m = matchedge::matches::MatchRecord::new(5, "F1", date, "Lyon", "Nice", 0, 2).with_odds(
        OddsTriplet {
            home: Some(2.1),
            draw: None,
            away: Some(3.9),
        },
    );
    ledger::upsert_matches(&mut conn, std::slice::from_ref(&m)).unwrap();
    let loaded = ledger::load_matches(&conn, Some("F1")).unwrap();
    assert_eq!(loaded, vec![m]);

    drop(conn);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn reseeding_with_more_seasons_upserts_in_place() {
    let path = temp_db("reseed");
    let mut conn = ledger::open_db(&path).unwrap();
    let base = SyntheticConfig::default();
    ledger::upsert_matches(&mut conn, &generate_ledger(&base)).unwrap();

    let grown = SyntheticConfig {
        seasons: base.seasons + 1,
        ..base.clone()
    };
    let mut expected = generate_ledger(&grown);
    ledger::upsert_matches(&mut conn, &expected).unwrap();

    expected.sort_by_key(|m| m.order_key());
    let loaded = ledger::load_matches(&conn, None).unwrap();
    assert_eq!(loaded.len(), 2 * 3 * 90);
    assert_eq!(loaded, expected);

    drop(conn);
    let _ = std::fs::remove_file(&path);
}
