//! Value decision engine: model probability against de-margined market price.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ValueConfig;
use crate::error::EngineError;
use crate::matches::is_valid_odd;
use crate::odds::implied_probabilities;
use crate::outcome::{Outcome, Prob3};
use crate::prediction::MatchPrediction;

/// Allowed distance of a probability triplet's sum from 1.
pub const DISTRIBUTION_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueBetCandidate {
    pub match_id: u64,
    pub division: String,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub outcome: Outcome,
    pub label: String,
    pub model_prob: f64,
    pub fair_prob: f64,
    pub odds: f64,
    pub edge: f64,
    pub expected_value: f64,
    pub kelly_fraction: f64,
    /// Highest model probability of the match, whichever outcome carries it.
    pub confidence: f64,
    pub actual: Option<Outcome>,
}

impl ValueBetCandidate {
    /// `None` until the match has a result.
    pub fn is_win(&self) -> Option<bool> {
        self.actual.map(|a| a == self.outcome)
    }

    /// Flat one-unit stake profit.
    pub fn profit(&self) -> Option<f64> {
        self.is_win()
            .map(|won| if won { self.odds - 1.0 } else { -1.0 })
    }

    pub fn settle(&mut self, actual: Outcome) {
        self.actual = Some(actual);
    }
}

/// Stake fraction `edge / (odds - 1)` clamped to `[0, cap]`; zero for a
/// non-positive edge or unusable price.
pub fn kelly_fraction(edge: f64, odds: f64, cap: f64) -> f64 {
    if !is_valid_odd(odds) || !edge.is_finite() || edge <= 0.0 {
        return 0.0;
    }
    (edge / (odds - 1.0)).clamp(0.0, cap.max(0.0))
}

pub fn expected_value(model_prob: f64, odds: f64) -> f64 {
    model_prob * odds - 1.0
}

pub fn validate_distribution(match_id: u64, probs: &Prob3) -> Result<(), EngineError> {
    for outcome in Outcome::ALL {
        let p = probs.get(outcome);
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(EngineError::InvalidDistribution {
                match_id,
                reason: format!("{} probability {p} outside [0, 1]", outcome.label()),
            });
        }
    }
    let sum = probs.sum();
    if (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
        return Err(EngineError::InvalidDistribution {
            match_id,
            reason: format!("probabilities sum to {sum:.4}"),
        });
    }
    Ok(())
}

/// Qualifying candidates of a single match, best edge first.
pub fn match_candidates(pred: &MatchPrediction, cfg: &ValueConfig) -> Vec<ValueBetCandidate> {
    if !pred.odds.has_any_valid() {
        return Vec::new();
    }
    let fair = implied_probabilities(&pred.odds);
    let confidence = pred.confidence();

    let mut out: Vec<ValueBetCandidate> = Outcome::ALL
        .into_iter()
        .filter_map(|outcome| {
            let odds = pred.odds.valid(outcome)?;
            let model_prob = pred.probs.get(outcome);
            let fair_prob = fair.get(outcome);
            let edge = model_prob - fair_prob;
            if edge <= cfg.min_edge {
                return None;
            }
            Some(ValueBetCandidate {
                match_id: pred.match_id,
                division: pred.division.clone(),
                date: pred.date,
                home_team: pred.home_team.clone(),
                away_team: pred.away_team.clone(),
                outcome,
                label: outcome.label().to_string(),
                model_prob,
                fair_prob,
                odds,
                edge,
                expected_value: expected_value(model_prob, odds),
                kelly_fraction: kelly_fraction(edge, odds, cfg.kelly_cap),
                confidence,
                actual: pred.actual,
            })
        })
        .collect();

    out.sort_by(rank_order);
    if cfg.one_outcome_per_match {
        out.truncate(1);
    }
    out
}

/// Ranked value bets across all matches.
///
/// Any prediction that is not a probability distribution fails the whole call.
pub fn find_value_bets(
    predictions: &[MatchPrediction],
    cfg: &ValueConfig,
) -> Result<Vec<ValueBetCandidate>, EngineError> {
    for p in predictions {
        validate_distribution(p.match_id, &p.probs)?;
    }

    let mut out = Vec::new();
    let mut unpriced = 0usize;
    for p in predictions {
        if !p.odds.has_any_valid() {
            unpriced += 1;
            continue;
        }
        out.extend(match_candidates(p, cfg));
    }
    rank_candidates(&mut out);

    if unpriced > 0 {
        debug!(unpriced, "matches without quoted odds skipped");
    }
    info!(
        matches = predictions.len(),
        candidates = out.len(),
        min_edge = cfg.min_edge,
        "value bets ranked"
    );
    Ok(out)
}

/// Edge descending, then date, match id and outcome order.
pub fn rank_candidates(candidates: &mut [ValueBetCandidate]) {
    candidates.sort_by(rank_order);
}

fn rank_order(a: &ValueBetCandidate, b: &ValueBetCandidate) -> Ordering {
    b.edge
        .total_cmp(&a.edge)
        .then(a.date.cmp(&b.date))
        .then(a.match_id.cmp(&b.match_id))
        .then(a.outcome.cmp(&b.outcome))
}
