use std::collections::HashMap;

use chrono::NaiveDate;

use crate::matches::{MatchRecord, SideStats};
use crate::outcome::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Venue {
    Home,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamResult {
    Win,
    Draw,
    Loss,
}

impl TeamResult {
    pub fn points(self) -> u32 {
        match self {
            TeamResult::Win => 3,
            TeamResult::Draw => 1,
            TeamResult::Loss => 0,
        }
    }
}

/// A played match from one team's side of the pitch.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamHistoryEntry {
    pub match_id: u64,
    pub date: NaiveDate,
    pub venue: Venue,
    pub opponent: String,
    pub goals_for: u8,
    pub goals_against: u8,
    pub result: TeamResult,
    /// The team's own box-score numbers, not the opponent's.
    pub stats: SideStats,
}

impl TeamHistoryEntry {
    pub fn from_match(m: &MatchRecord, venue: Venue) -> Self {
        let (opponent, goals_for, goals_against, stats) = match venue {
            Venue::Home => (&m.away_team, m.home_goals, m.away_goals, m.home_stats),
            Venue::Away => (&m.home_team, m.away_goals, m.home_goals, m.away_stats),
        };
        let result = match (m.result, venue) {
            (Outcome::Draw, _) => TeamResult::Draw,
            (Outcome::Home, Venue::Home) | (Outcome::Away, Venue::Away) => TeamResult::Win,
            _ => TeamResult::Loss,
        };
        Self {
            match_id: m.id,
            date: m.date,
            venue,
            opponent: opponent.clone(),
            goals_for,
            goals_against,
            result,
            stats,
        }
    }
}

/// Append-only per-team match logs for a single division.
///
/// Owned by the division's processing loop; a log only ever contains matches
/// that were recorded before the current read.
#[derive(Debug, Default)]
pub struct TeamHistoryIndex {
    logs: HashMap<String, Vec<TeamHistoryEntry>>,
}

impl TeamHistoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history_of(&self, team: &str) -> &[TeamHistoryEntry] {
        self.logs.get(team).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Appends `m` to both participants. Call only after features for `m` were read.
    pub fn record(&mut self, m: &MatchRecord) {
        self.logs
            .entry(m.home_team.clone())
            .or_default()
            .push(TeamHistoryEntry::from_match(m, Venue::Home));
        self.logs
            .entry(m.away_team.clone())
            .or_default()
            .push(TeamHistoryEntry::from_match(m, Venue::Away));
    }
}
