//! Attack/defense ratios against division averages, plus table position.

use std::collections::HashMap;

use crate::features::FeatureVector;
use crate::matches::MatchRecord;
use crate::standings::StandingsTable;

/// Venue appearances needed before a team's own rate replaces the neutral 1.0.
pub const MIN_VENUE_APPEARANCES: u32 = 3;
/// Rank given to a team the prefix table has never seen.
pub const UNRANKED_RANK: usize = 10;

#[derive(Debug, Clone, Copy, Default)]
struct VenueSplit {
    home_played: u32,
    home_scored: u32,
    home_conceded: u32,
    away_played: u32,
    away_scored: u32,
    away_conceded: u32,
}

/// Running aggregate of every match in a division processed so far.
///
/// Equivalent to re-scanning the division prefix before each match, without the
/// quadratic cost.
#[derive(Debug, Clone, Default)]
pub struct DivisionPrefix {
    matches: usize,
    home_goals: u64,
    away_goals: u64,
    splits: HashMap<String, VenueSplit>,
    table: StandingsTable,
}

impl DivisionPrefix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_matches<'a>(matches: impl IntoIterator<Item = &'a MatchRecord>) -> Self {
        let mut prefix = Self::new();
        for m in matches {
            prefix.record(m);
        }
        prefix
    }

    pub fn record(&mut self, m: &MatchRecord) {
        self.matches += 1;
        self.home_goals += m.home_goals as u64;
        self.away_goals += m.away_goals as u64;

        let home = self.splits.entry(m.home_team.clone()).or_default();
        home.home_played += 1;
        home.home_scored += m.home_goals as u32;
        home.home_conceded += m.away_goals as u32;

        let away = self.splits.entry(m.away_team.clone()).or_default();
        away.away_played += 1;
        away.away_scored += m.away_goals as u32;
        away.away_conceded += m.home_goals as u32;

        self.table.record(m);
    }

    pub fn len(&self) -> usize {
        self.matches
    }

    pub fn is_empty(&self) -> bool {
        self.matches == 0
    }

    pub fn table(&self) -> &StandingsTable {
        &self.table
    }

    fn averages(&self) -> (f64, f64) {
        let n = self.matches.max(1) as f64;
        (
            guard_zero(self.home_goals as f64 / n),
            guard_zero(self.away_goals as f64 / n),
        )
    }
}

fn guard_zero(avg: f64) -> f64 {
    if avg > 0.0 { avg } else { 1.0 }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StrengthFeatures {
    pub home_attack: Option<f64>,
    pub home_defense: Option<f64>,
    pub away_attack: Option<f64>,
    pub away_defense: Option<f64>,
    pub home_position: Option<f64>,
    pub away_position: Option<f64>,
}

impl StrengthFeatures {
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn write_into(&self, fv: &mut FeatureVector) {
        fv.set("home_attack_strength", self.home_attack);
        fv.set("home_defense_strength", self.home_defense);
        fv.set("away_attack_strength", self.away_attack);
        fv.set("away_defense_strength", self.away_defense);
        fv.set("home_league_position", self.home_position);
        fv.set("away_league_position", self.away_position);
    }
}

/// Strength indices for a fixture from the division matches played before it.
pub fn compute_strength(
    prefix: &DivisionPrefix,
    home: &str,
    away: &str,
    min_prefix: usize,
) -> StrengthFeatures {
    if prefix.len() < min_prefix {
        return StrengthFeatures::missing();
    }
    let (avg_home, avg_away) = prefix.averages();
    let (home_attack, home_defense) = team_strength(prefix, home, avg_home, avg_away);
    let (away_attack, away_defense) = team_strength(prefix, away, avg_home, avg_away);

    let ranks = prefix.table().ranks();
    let total = prefix.table().len().max(1) as f64;
    let position = |team: &str| ranks.get(team).copied().unwrap_or(UNRANKED_RANK) as f64 / total;

    StrengthFeatures {
        home_attack: Some(home_attack),
        home_defense: Some(home_defense),
        away_attack: Some(away_attack),
        away_defense: Some(away_defense),
        home_position: Some(position(home)),
        away_position: Some(position(away)),
    }
}

fn team_strength(prefix: &DivisionPrefix, team: &str, avg_home: f64, avg_away: f64) -> (f64, f64) {
    let split = prefix.splits.get(team).copied().unwrap_or_default();

    let (attack_home, defense_home) = if split.home_played >= MIN_VENUE_APPEARANCES {
        let n = split.home_played as f64;
        (
            split.home_scored as f64 / n / avg_home,
            split.home_conceded as f64 / n / avg_away,
        )
    } else {
        (1.0, 1.0)
    };

    let (attack_away, defense_away) = if split.away_played >= MIN_VENUE_APPEARANCES {
        let n = split.away_played as f64;
        (
            split.away_scored as f64 / n / avg_away,
            split.away_conceded as f64 / n / avg_home,
        )
    } else {
        (1.0, 1.0)
    };

    (
        (attack_home + attack_away) / 2.0,
        (defense_home + defense_away) / 2.0,
    )
}
