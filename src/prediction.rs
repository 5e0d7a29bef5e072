//! External model output joined back onto ledger matches, and its quality metrics.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::FeatureRow;
use crate::matches::OddsTriplet;
use crate::outcome::{Outcome, Prob3};

/// One record of the trainer's prediction file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub match_id: u64,
    pub p_home: f64,
    pub p_draw: f64,
    pub p_away: f64,
}

impl ModelOutput {
    pub fn probs(&self) -> Prob3 {
        Prob3::new(self.p_home, self.p_draw, self.p_away)
    }
}

pub fn load_model_outputs(path: &Path) -> Result<Vec<ModelOutput>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read predictions {}", path.display()))?;
    serde_json::from_str(&raw).context("parse predictions json")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPrediction {
    pub match_id: u64,
    pub division: String,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub probs: Prob3,
    pub odds: OddsTriplet,
    pub actual: Option<Outcome>,
}

impl MatchPrediction {
    pub fn predicted(&self) -> Outcome {
        self.probs.argmax()
    }

    pub fn confidence(&self) -> f64 {
        self.probs.max()
    }
}

/// Pairs model outputs with their feature rows by match id.
///
/// Outputs naming an unknown match are skipped.
pub fn join_predictions(rows: &[FeatureRow], outputs: &[ModelOutput]) -> Vec<MatchPrediction> {
    let by_id: HashMap<u64, &FeatureRow> = rows.iter().map(|r| (r.match_id, r)).collect();
    let mut out = Vec::with_capacity(outputs.len());
    let mut unknown = 0usize;
    for o in outputs {
        let Some(row) = by_id.get(&o.match_id) else {
            unknown += 1;
            continue;
        };
        out.push(MatchPrediction {
            match_id: row.match_id,
            division: row.division.clone(),
            date: row.date,
            home_team: row.home_team.clone(),
            away_team: row.away_team.clone(),
            probs: o.probs(),
            odds: row.odds,
            actual: Some(row.outcome),
        });
    }
    if unknown > 0 {
        warn!(unknown, "predictions for matches not in the ledger skipped");
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionMetrics {
    pub samples: usize,
    pub accuracy: f64,
    pub log_loss: f64,
    pub brier: f64,
}

/// Accuracy, multi-class log loss and Brier score over predictions with a known result.
pub fn evaluate_predictions(predictions: &[MatchPrediction]) -> Option<PredictionMetrics> {
    let mut brier_sum = 0.0_f64;
    let mut log_loss_sum = 0.0_f64;
    let mut correct = 0usize;
    let mut n = 0usize;

    for p in predictions {
        let Some(actual) = p.actual else {
            continue;
        };
        n += 1;
        for outcome in Outcome::ALL {
            let y = if outcome == actual { 1.0 } else { 0.0 };
            brier_sum += (p.probs.get(outcome) - y).powi(2);
        }
        log_loss_sum += -p.probs.get(actual).clamp(1e-12, 1.0).ln();
        if p.predicted() == actual {
            correct += 1;
        }
    }

    if n == 0 {
        return None;
    }
    let total = n as f64;
    Some(PredictionMetrics {
        samples: n,
        accuracy: correct as f64 / total,
        log_loss: log_loss_sum / total,
        brier: brier_sum / total,
    })
}
