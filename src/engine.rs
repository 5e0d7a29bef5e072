//! Temporal feature engine: one pass per division, features before state update.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::FeatureConfig;
use crate::error::EngineError;
use crate::features::FeatureVector;
use crate::form::compute_form;
use crate::h2h::compute_h2h;
use crate::history::TeamHistoryIndex;
use crate::matches::{MatchRecord, OddsTriplet};
use crate::odds::{favourite, implied_probabilities};
use crate::outcome::Outcome;
use crate::strength::{DivisionPrefix, compute_strength};

/// One emitted row: identity, label and the pre-match feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub match_id: u64,
    pub division: String,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub outcome: Outcome,
    pub odds: OddsTriplet,
    pub features: FeatureVector,
}

impl FeatureRow {
    pub fn order_key(&self) -> (NaiveDate, u64) {
        (self.date, self.match_id)
    }
}

/// Builds one row per ledger match, ordered by (date, id).
///
/// Every feature of a match reads only matches strictly earlier in its division.
pub fn build_feature_rows(
    matches: &[MatchRecord],
    cfg: &FeatureConfig,
) -> Result<Vec<FeatureRow>, EngineError> {
    if matches.is_empty() {
        return Err(EngineError::EmptyLedger);
    }

    let mut by_division: BTreeMap<&str, Vec<&MatchRecord>> = BTreeMap::new();
    for m in matches {
        by_division.entry(m.division.as_str()).or_default().push(m);
    }
    let divisions: Vec<(&str, Vec<&MatchRecord>)> = by_division.into_iter().collect();

    let mut rows: Vec<FeatureRow> = divisions
        .into_par_iter()
        .flat_map_iter(|(division, mut ledger)| {
            ledger.sort_by_key(|m| m.order_key());
            let out = process_division(&ledger, cfg);
            debug!(division, rows = out.len(), "division features built");
            out
        })
        .collect();

    for row in &mut rows {
        append_odds_features(row, &cfg.neutral_odds);
    }
    rows.sort_by_key(|r| r.order_key());

    let complete = rows.iter().filter(|r| r.features.missing_count() == 0).count();
    info!(rows = rows.len(), complete, "feature rows built");
    Ok(rows)
}

fn process_division(ledger: &[&MatchRecord], cfg: &FeatureConfig) -> Vec<FeatureRow> {
    let mut index = TeamHistoryIndex::new();
    let mut prefix = DivisionPrefix::new();
    let mut out = Vec::with_capacity(ledger.len());

    for m in ledger {
        let home_history = index.history_of(&m.home_team);
        let away_history = index.history_of(&m.away_team);

        let mut features = FeatureVector::new();
        compute_form(home_history, cfg.form_window).write_into(&mut features, "home");
        compute_form(away_history, cfg.form_window).write_into(&mut features, "away");
        compute_h2h(home_history, &m.away_team, cfg.h2h_lookback).write_into(&mut features);
        compute_strength(&prefix, &m.home_team, &m.away_team, cfg.min_strength_prefix)
            .write_into(&mut features);

        out.push(FeatureRow {
            match_id: m.id,
            division: m.division.clone(),
            date: m.date,
            home_team: m.home_team.clone(),
            away_team: m.away_team.clone(),
            outcome: m.result,
            odds: m.odds,
            features,
        });

        index.record(m);
        prefix.record(m);
    }
    out
}

fn append_odds_features(row: &mut FeatureRow, neutral: &OddsTriplet) {
    let odds = if row.odds.has_any_valid() {
        row.odds
    } else {
        *neutral
    };
    let probs = implied_probabilities(&odds);
    row.features.set("implied_prob_home", Some(probs.home));
    row.features.set("implied_prob_draw", Some(probs.draw));
    row.features.set("implied_prob_away", Some(probs.away));
    row.features.set(
        "odds_favorite",
        favourite(&odds).map(|o| o.index() as f64),
    );
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::build_feature_rows;
    use crate::config::FeatureConfig;
    use crate::error::EngineError;
    use crate::matches::{MatchRecord, OddsTriplet};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 8, d).unwrap()
    }

    #[test]
    fn empty_ledger_is_an_error() {
        assert_eq!(
            build_feature_rows(&[], &FeatureConfig::default()),
            Err(EngineError::EmptyLedger)
        );
    }

    #[test]
    fn same_day_matches_order_by_id() {
        let ledger = vec![
            MatchRecord::new(9, "E0", day(1), "A", "B", 1, 0),
            MatchRecord::new(2, "E0", day(1), "C", "D", 0, 0),
            MatchRecord::new(5, "SC0", day(1), "E", "F", 2, 2),
        ];
        let rows = build_feature_rows(&ledger, &FeatureConfig::default()).unwrap();
        let ids: Vec<u64> = rows.iter().map(|r| r.match_id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn unpriced_match_uses_neutral_odds() {
        let ledger = vec![MatchRecord::new(1, "E0", day(1), "A", "B", 1, 0)];
        let rows = build_feature_rows(&ledger, &FeatureConfig::default()).unwrap();
        let f = &rows[0].features;
        // 2.5 / 3.3 / 3.5 de-margined; home is the favourite.
        assert!(f.value("implied_prob_home").unwrap() > f.value("implied_prob_away").unwrap());
        assert_eq!(f.value("odds_favorite"), Some(0.0));
        let total = f.value("implied_prob_home").unwrap()
            + f.value("implied_prob_draw").unwrap()
            + f.value("implied_prob_away").unwrap();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn quoted_odds_drive_favourite() {
        let ledger = vec![
            MatchRecord::new(1, "E0", day(1), "A", "B", 1, 0)
                .with_odds(OddsTriplet::new(4.0, 3.4, 1.9)),
        ];
        let rows = build_feature_rows(&ledger, &FeatureConfig::default()).unwrap();
        assert_eq!(rows[0].features.value("odds_favorite"), Some(2.0));
    }

    #[test]
    fn first_match_of_a_team_has_no_history_features() {
        let ledger = vec![MatchRecord::new(1, "E0", day(1), "A", "B", 1, 0)];
        let rows = build_feature_rows(&ledger, &FeatureConfig::default()).unwrap();
        let f = &rows[0].features;
        assert_eq!(f.get("home_form_points"), Some(None));
        assert_eq!(f.get("h2h_draws"), Some(None));
        assert_eq!(f.get("home_attack_strength"), Some(None));
        assert_eq!(f.len(), crate::features::canonical_feature_names().len());
    }
}
