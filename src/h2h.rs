use crate::features::FeatureVector;
use crate::history::{TeamHistoryEntry, TeamResult};

/// Below this many prior meetings every head-to-head feature is missing.
pub const MIN_H2H_MEETINGS: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct H2hFeatures {
    pub home_wins: Option<f64>,
    pub draws: Option<f64>,
    pub away_wins: Option<f64>,
    pub home_goals_avg: Option<f64>,
}

impl H2hFeatures {
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn write_into(&self, fv: &mut FeatureVector) {
        fv.set("h2h_home_wins", self.home_wins);
        fv.set("h2h_draws", self.draws);
        fv.set("h2h_away_wins", self.away_wins);
        fv.set("h2h_home_goals_avg", self.home_goals_avg);
    }
}

/// Prior meetings of `home` and `away`, seen from `home`.
///
/// Every meeting is recorded in both teams' logs, so the union of the two
/// histories restricted to meetings is exactly `home`'s log filtered by opponent.
pub fn compute_h2h(
    home_history: &[TeamHistoryEntry],
    away: &str,
    lookback: usize,
) -> H2hFeatures {
    let meetings: Vec<&TeamHistoryEntry> = home_history
        .iter()
        .filter(|e| e.opponent == away)
        .collect();
    let recent = &meetings[meetings.len().saturating_sub(lookback.max(1))..];
    if recent.len() < MIN_H2H_MEETINGS {
        return H2hFeatures::missing();
    }

    let n = recent.len() as f64;
    let count = |r: TeamResult| recent.iter().filter(|e| e.result == r).count() as f64 / n;
    let goals: u32 = recent.iter().map(|e| e.goals_for as u32).sum();

    H2hFeatures {
        home_wins: Some(count(TeamResult::Win)),
        draws: Some(count(TeamResult::Draw)),
        away_wins: Some(count(TeamResult::Loss)),
        home_goals_avg: Some(goals as f64 / n),
    }
}
