//! League table. One ranking policy serves both the position feature and
//! displayed tables: points, then goal difference, then goals scored, then name.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::matches::MatchRecord;
use crate::outcome::Outcome;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TeamTally {
    played: u32,
    won: u32,
    drawn: u32,
    lost: u32,
    goals_for: u32,
    goals_against: u32,
}

impl TeamTally {
    fn points(&self) -> u32 {
        self.won * 3 + self.drawn
    }

    fn goal_difference(&self) -> i64 {
        self.goals_for as i64 - self.goals_against as i64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingsRow {
    pub rank: usize,
    pub team: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i64,
    pub points: u32,
}

#[derive(Debug, Clone, Default)]
pub struct StandingsTable {
    teams: HashMap<String, TeamTally>,
}

impl StandingsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_matches<'a>(matches: impl IntoIterator<Item = &'a MatchRecord>) -> Self {
        let mut table = Self::new();
        for m in matches {
            table.record(m);
        }
        table
    }

    pub fn record(&mut self, m: &MatchRecord) {
        let home = self.teams.entry(m.home_team.clone()).or_default();
        apply(home, m.home_goals, m.away_goals, m.result, Outcome::Home);
        let away = self.teams.entry(m.away_team.clone()).or_default();
        apply(away, m.away_goals, m.home_goals, m.result, Outcome::Away);
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn ranked(&self) -> Vec<StandingsRow> {
        let mut teams: Vec<(&String, &TeamTally)> = self.teams.iter().collect();
        teams.sort_by(|(name_a, a), (name_b, b)| compare(name_a, a, name_b, b));
        teams
            .into_iter()
            .enumerate()
            .map(|(idx, (team, t))| StandingsRow {
                rank: idx + 1,
                team: team.clone(),
                played: t.played,
                won: t.won,
                drawn: t.drawn,
                lost: t.lost,
                goals_for: t.goals_for,
                goals_against: t.goals_against,
                goal_difference: t.goal_difference(),
                points: t.points(),
            })
            .collect()
    }

    pub fn ranks(&self) -> HashMap<String, usize> {
        self.ranked()
            .into_iter()
            .map(|row| (row.team, row.rank))
            .collect()
    }
}

fn apply(tally: &mut TeamTally, scored: u8, conceded: u8, result: Outcome, side: Outcome) {
    tally.played += 1;
    tally.goals_for += scored as u32;
    tally.goals_against += conceded as u32;
    if result == Outcome::Draw {
        tally.drawn += 1;
    } else if result == side {
        tally.won += 1;
    } else {
        tally.lost += 1;
    }
}

fn compare(name_a: &str, a: &TeamTally, name_b: &str, b: &TeamTally) -> Ordering {
    b.points()
        .cmp(&a.points())
        .then(b.goal_difference().cmp(&a.goal_difference()))
        .then(b.goals_for.cmp(&a.goals_for))
        .then(name_a.cmp(name_b))
}
