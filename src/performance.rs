//! Settled-bet performance: flat one-unit stakes plus a Kelly-weighted view.

use serde::{Deserialize, Serialize};

use crate::value::ValueBetCandidate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_bets: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub total_profit: f64,
    pub roi_pct: f64,
    pub avg_odds: f64,
    pub avg_edge: f64,
    /// Sum of Kelly stake fractions over settled bets.
    pub kelly_staked: f64,
    pub kelly_profit: f64,
    pub kelly_yield_pct: f64,
}

/// Summary over candidates with a known result; `None` when nothing is settled.
pub fn analyze(candidates: &[ValueBetCandidate]) -> Option<PerformanceSummary> {
    let mut total = 0usize;
    let mut wins = 0usize;
    let mut profit = 0.0_f64;
    let mut odds_sum = 0.0_f64;
    let mut edge_sum = 0.0_f64;
    let mut kelly_staked = 0.0_f64;
    let mut kelly_profit = 0.0_f64;

    for c in candidates {
        let (Some(won), Some(p)) = (c.is_win(), c.profit()) else {
            continue;
        };
        total += 1;
        if won {
            wins += 1;
        }
        profit += p;
        odds_sum += c.odds;
        edge_sum += c.edge;
        kelly_staked += c.kelly_fraction;
        kelly_profit += c.kelly_fraction * p;
    }

    if total == 0 {
        return None;
    }
    let n = total as f64;
    Some(PerformanceSummary {
        total_bets: total,
        wins,
        losses: total - wins,
        win_rate: wins as f64 / n,
        total_profit: profit,
        roi_pct: profit / n * 100.0,
        avg_odds: odds_sum / n,
        avg_edge: edge_sum / n,
        kelly_staked,
        kelly_profit,
        kelly_yield_pct: if kelly_staked > 0.0 {
            kelly_profit / kelly_staked * 100.0
        } else {
            0.0
        },
    })
}
