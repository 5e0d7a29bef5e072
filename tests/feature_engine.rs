use chrono::NaiveDate;

use matchedge::config::FeatureConfig;
use matchedge::dataset::TrainingSet;
use matchedge::engine::{FeatureRow, build_feature_rows};
use matchedge::error::EngineError;
use matchedge::features::canonical_feature_names;
use matchedge::matches::MatchRecord;
use matchedge::outcome::classify_outcome;
use matchedge::synthetic::{SyntheticConfig, generate_ledger};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn row_for(rows: &[FeatureRow], id: u64) -> &FeatureRow {
    rows.iter().find(|r| r.match_id == id).unwrap()
}

#[test]
fn win_win_draw_form() {
    let ledger = vec![
        MatchRecord::new(1, "E0", day(1), "Rovers", "United", 2, 0),
        MatchRecord::new(2, "E0", day(8), "City", "Rovers", 0, 1),
        MatchRecord::new(3, "E0", day(15), "Rovers", "Athletic", 1, 1),
        MatchRecord::new(4, "E0", day(22), "Rovers", "Town", 0, 0),
    ];
    let rows = build_feature_rows(&ledger, &FeatureConfig::default()).unwrap();
    let f = &row_for(&rows, 4).features;
    assert!((f.value("home_form_points").unwrap() - 7.0 / 3.0).abs() < 1e-9);
    assert!((f.value("home_form_win_rate").unwrap() - 2.0 / 3.0).abs() < 1e-9);
    assert!((f.value("home_form_goals_scored").unwrap() - 4.0 / 3.0).abs() < 1e-9);
    assert!((f.value("home_form_goals_conceded").unwrap() - 1.0 / 3.0).abs() < 1e-9);
    // Town has never played.
    assert_eq!(f.get("away_form_points"), Some(None));
}

#[test]
fn two_prior_matches_leave_form_missing() {
    let ledger = vec![
        MatchRecord::new(1, "E0", day(1), "Rovers", "United", 2, 0),
        MatchRecord::new(2, "E0", day(8), "City", "Rovers", 0, 1),
        MatchRecord::new(3, "E0", day(15), "Rovers", "Athletic", 1, 1),
    ];
    let rows = build_feature_rows(&ledger, &FeatureConfig::default()).unwrap();
    let f = &row_for(&rows, 3).features;
    for suffix in [
        "form_points",
        "form_goals_scored",
        "form_goals_conceded",
        "form_win_rate",
        "form_shots",
        "form_shots_target",
        "form_corners",
    ] {
        assert_eq!(f.get(&format!("home_{suffix}")), Some(None), "home_{suffix}");
    }
}

#[test]
fn empty_ledger_is_rejected() {
    assert_eq!(
        build_feature_rows(&[], &FeatureConfig::default()),
        Err(EngineError::EmptyLedger)
    );
}

#[test]
fn future_matches_never_change_past_features() {
    let ledger = generate_ledger(&SyntheticConfig::default());
    let cfg = FeatureConfig::default();
    let baseline = build_feature_rows(&ledger, &cfg).unwrap();

    let mut dates: Vec<NaiveDate> = ledger.iter().map(|m| m.date).collect();
    dates.sort();
    let cutoff = dates[dates.len() / 2];

    let mut rewritten = ledger.clone();
    for m in rewritten.iter_mut().filter(|m| m.date > cutoff) {
        m.home_goals = (m.home_goals + 3) % 6;
        m.away_goals = (m.away_goals + 1) % 4;
        m.result = classify_outcome(m.home_goals, m.away_goals);
        m.odds.home = m.odds.home.map(|o| o + 0.5);
    }
    let changed = build_feature_rows(&rewritten, &cfg).unwrap();

    let truncated: Vec<MatchRecord> = ledger.iter().filter(|m| m.date <= cutoff).cloned().collect();
    let prefix_only = build_feature_rows(&truncated, &cfg).unwrap();

    let past = |rows: &[FeatureRow]| -> Vec<FeatureRow> {
        rows.iter().filter(|r| r.date <= cutoff).cloned().collect()
    };
    assert!(!prefix_only.is_empty());
    assert_eq!(past(&baseline), past(&changed));
    assert_eq!(past(&baseline), prefix_only);
}

#[test]
fn divisions_do_not_leak_into_each_other() {
    let alone = generate_ledger(&SyntheticConfig {
        divisions: vec!["E0".to_string()],
        ..SyntheticConfig::default()
    });

    let mut other = generate_ledger(&SyntheticConfig {
        seed: 99,
        divisions: vec!["D1".to_string()],
        ..SyntheticConfig::default()
    });
    for m in &mut other {
        m.id += 100_000;
    }
    let mut mixed = alone.clone();
    mixed.extend(other);

    let fc = FeatureConfig::default();
    let solo_rows = build_feature_rows(&alone, &fc).unwrap();
    let mixed_rows = build_feature_rows(&mixed, &fc).unwrap();
    let e0: Vec<FeatureRow> = mixed_rows.into_iter().filter(|r| r.division == "E0").collect();
    assert_eq!(solo_rows, e0);
}

#[test]
fn synthetic_ledger_yields_trainable_rows() {
    let ledger = generate_ledger(&SyntheticConfig::default());
    let rows = build_feature_rows(&ledger, &FeatureConfig::default()).unwrap();
    assert_eq!(rows.len(), ledger.len());
    assert!(rows.windows(2).all(|w| w[0].order_key() <= w[1].order_key()));

    let names = canonical_feature_names();
    let set = TrainingSet::from_rows(&rows, &names);
    assert!(set.len() > 0);
    assert!(set.dropped > 0);
    assert_eq!(set.len() + set.dropped, rows.len());
    assert_eq!(set.schema.medians.len(), names.len());
    for x in &set.x {
        assert_eq!(x.len(), names.len());
        assert!(x.iter().all(|v| v.is_finite()));
    }
}
