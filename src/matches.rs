use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::outcome::{Outcome, classify_outcome};

/// Optional box-score numbers for one side of a fixture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideStats {
    pub shots: Option<u16>,
    pub shots_on_target: Option<u16>,
    pub corners: Option<u16>,
}

/// Bookmaker decimal odds, one per outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OddsTriplet {
    pub home: Option<f64>,
    pub draw: Option<f64>,
    pub away: Option<f64>,
}

impl OddsTriplet {
    pub fn new(home: f64, draw: f64, away: f64) -> Self {
        Self {
            home: Some(home),
            draw: Some(draw),
            away: Some(away),
        }
    }

    pub fn get(&self, outcome: Outcome) -> Option<f64> {
        match outcome {
            Outcome::Home => self.home,
            Outcome::Draw => self.draw,
            Outcome::Away => self.away,
        }
    }

    /// Quoted price for `outcome`, only when it is a usable decimal odd.
    pub fn valid(&self, outcome: Outcome) -> Option<f64> {
        self.get(outcome).filter(|o| is_valid_odd(*o))
    }

    pub fn has_any_valid(&self) -> bool {
        Outcome::ALL.iter().any(|o| self.valid(*o).is_some())
    }
}

pub fn is_valid_odd(odds: f64) -> bool {
    odds.is_finite() && odds > 1.0
}

/// One played fixture as it sits in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Ledger id; increases with ingestion order and breaks same-day ties.
    pub id: u64,
    pub division: String,
    pub season: Option<String>,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u8,
    pub away_goals: u8,
    pub result: Outcome,
    #[serde(default)]
    pub home_stats: SideStats,
    #[serde(default)]
    pub away_stats: SideStats,
    #[serde(default)]
    pub odds: OddsTriplet,
}

impl MatchRecord {
    pub fn new(
        id: u64,
        division: &str,
        date: NaiveDate,
        home_team: &str,
        away_team: &str,
        home_goals: u8,
        away_goals: u8,
    ) -> Self {
        Self {
            id,
            division: division.to_string(),
            season: None,
            date,
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            home_goals,
            away_goals,
            result: classify_outcome(home_goals, away_goals),
            home_stats: SideStats::default(),
            away_stats: SideStats::default(),
            odds: OddsTriplet::default(),
        }
    }

    pub fn with_odds(mut self, odds: OddsTriplet) -> Self {
        self.odds = odds;
        self
    }

    pub fn with_stats(mut self, home: SideStats, away: SideStats) -> Self {
        self.home_stats = home;
        self.away_stats = away;
        self
    }

    /// Chronological processing key.
    pub fn order_key(&self) -> (NaiveDate, u64) {
        (self.date, self.id)
    }
}

pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    ["%Y-%m-%d", "%d/%m/%y", "%d/%m/%Y", "%d-%m-%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}
