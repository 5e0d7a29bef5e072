use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::matches::{MatchRecord, OddsTriplet, SideStats, parse_match_date};
use crate::outcome::Outcome;
use crate::value::{ValueBetCandidate, rank_candidates};

const CACHE_DIR: &str = "matchedge";
const DB_FILE: &str = "ledger.sqlite";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// `MATCHEDGE_DB` if set, else the ledger file under the user cache dir.
pub fn default_db_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("MATCHEDGE_DB")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR).join(DB_FILE));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR).join(DB_FILE))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY,
            division TEXT NOT NULL,
            season TEXT NULL,
            match_date TEXT NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            home_goals INTEGER NOT NULL,
            away_goals INTEGER NOT NULL,
            result TEXT NOT NULL,
            home_shots INTEGER NULL,
            away_shots INTEGER NULL,
            home_shots_target INTEGER NULL,
            away_shots_target INTEGER NULL,
            home_corners INTEGER NULL,
            away_corners INTEGER NULL,
            odds_home REAL NULL,
            odds_draw REAL NULL,
            odds_away REAL NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(division, match_date, home_team, away_team)
        );
        CREATE INDEX IF NOT EXISTS idx_matches_division ON matches(division);
        CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(match_date);

        CREATE TABLE IF NOT EXISTS value_bets (
            bet_id INTEGER PRIMARY KEY AUTOINCREMENT,
            match_id INTEGER NOT NULL,
            division TEXT NOT NULL,
            match_date TEXT NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            outcome TEXT NOT NULL,
            label TEXT NOT NULL,
            model_prob REAL NOT NULL,
            fair_prob REAL NOT NULL,
            odds REAL NOT NULL,
            edge REAL NOT NULL,
            expected_value REAL NOT NULL,
            kelly_fraction REAL NOT NULL,
            confidence REAL NOT NULL,
            actual TEXT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(match_id, outcome)
        );
        CREATE INDEX IF NOT EXISTS idx_value_bets_actual ON value_bets(actual);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Inserts or refreshes matches keyed on (division, date, home, away), in one transaction.
pub fn upsert_matches(conn: &mut Connection, matches: &[MatchRecord]) -> Result<usize> {
    let tx = conn.transaction().context("begin match upsert")?;
    let now = Utc::now().to_rfc3339();
    for m in matches {
        upsert_match(&tx, m, &now)?;
    }
    tx.commit().context("commit match upsert")?;
    info!(matches = matches.len(), "ledger matches upserted");
    Ok(matches.len())
}

fn upsert_match(tx: &rusqlite::Transaction<'_>, m: &MatchRecord, now: &str) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO matches (
            id, division, season, match_date, home_team, away_team,
            home_goals, away_goals, result,
            home_shots, away_shots, home_shots_target, away_shots_target,
            home_corners, away_corners,
            odds_home, odds_draw, odds_away, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9,
            ?10, ?11, ?12, ?13,
            ?14, ?15,
            ?16, ?17, ?18, ?19
        )
        ON CONFLICT(division, match_date, home_team, away_team) DO UPDATE SET
            season = excluded.season,
            home_goals = excluded.home_goals,
            away_goals = excluded.away_goals,
            result = excluded.result,
            home_shots = excluded.home_shots,
            away_shots = excluded.away_shots,
            home_shots_target = excluded.home_shots_target,
            away_shots_target = excluded.away_shots_target,
            home_corners = excluded.home_corners,
            away_corners = excluded.away_corners,
            odds_home = excluded.odds_home,
            odds_draw = excluded.odds_draw,
            odds_away = excluded.odds_away,
            updated_at = excluded.updated_at
        "#,
        params![
            m.id as i64,
            m.division,
            m.season,
            m.date.format(DATE_FORMAT).to_string(),
            m.home_team,
            m.away_team,
            m.home_goals as i64,
            m.away_goals as i64,
            m.result.code().to_string(),
            m.home_stats.shots,
            m.away_stats.shots,
            m.home_stats.shots_on_target,
            m.away_stats.shots_on_target,
            m.home_stats.corners,
            m.away_stats.corners,
            m.odds.home,
            m.odds.draw,
            m.odds.away,
            now,
        ],
    )
    .with_context(|| format!("upsert match {}", m.id))?;
    Ok(())
}

struct RawMatch {
    id: u64,
    division: String,
    season: Option<String>,
    date: String,
    home_team: String,
    away_team: String,
    home_goals: u8,
    away_goals: u8,
    result: String,
    home_stats: SideStats,
    away_stats: SideStats,
    odds: OddsTriplet,
}

impl RawMatch {
    fn into_record(self) -> Result<MatchRecord> {
        let date = parse_match_date(&self.date)
            .ok_or_else(|| anyhow!("match {}: bad date {:?}", self.id, self.date))?;
        let result = Outcome::from_code(&self.result)
            .ok_or_else(|| anyhow!("match {}: bad result {:?}", self.id, self.result))?;
        Ok(MatchRecord {
            id: self.id,
            division: self.division,
            season: self.season,
            date,
            home_team: self.home_team,
            away_team: self.away_team,
            home_goals: self.home_goals,
            away_goals: self.away_goals,
            result,
            home_stats: self.home_stats,
            away_stats: self.away_stats,
            odds: self.odds,
        })
    }
}

/// Ledger matches ordered by date then id, optionally for one division.
pub fn load_matches(conn: &Connection, division: Option<&str>) -> Result<Vec<MatchRecord>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                id, division, season, match_date, home_team, away_team,
                home_goals, away_goals, result,
                home_shots, away_shots, home_shots_target, away_shots_target,
                home_corners, away_corners,
                odds_home, odds_draw, odds_away
            FROM matches
            WHERE ?1 IS NULL OR division = ?1
            ORDER BY match_date ASC, id ASC
            "#,
        )
        .context("prepare load matches query")?;

    let rows = stmt
        .query_map(params![division], |row| {
            Ok(RawMatch {
                id: row.get::<_, u64>(0)?,
                division: row.get(1)?,
                season: row.get(2)?,
                date: row.get(3)?,
                home_team: row.get(4)?,
                away_team: row.get(5)?,
                home_goals: row.get(6)?,
                away_goals: row.get(7)?,
                result: row.get(8)?,
                home_stats: SideStats {
                    shots: row.get(9)?,
                    shots_on_target: row.get(11)?,
                    corners: row.get(13)?,
                },
                away_stats: SideStats {
                    shots: row.get(10)?,
                    shots_on_target: row.get(12)?,
                    corners: row.get(14)?,
                },
                odds: OddsTriplet {
                    home: row.get(15)?,
                    draw: row.get(16)?,
                    away: row.get(17)?,
                },
            })
        })
        .context("query load matches")?;

    let mut out = Vec::new();
    for row in rows {
        let raw = row.context("decode match row")?;
        out.push(raw.into_record()?);
    }
    debug!(division = division.unwrap_or("*"), matches = out.len(), "ledger loaded");
    Ok(out)
}

/// Records candidates; re-ranking the same match/outcome refreshes its numbers.
pub fn insert_value_bets(conn: &mut Connection, bets: &[ValueBetCandidate]) -> Result<usize> {
    let tx = conn.transaction().context("begin value bet insert")?;
    let now = Utc::now().to_rfc3339();
    for b in bets {
        tx.execute(
            r#"
            INSERT INTO value_bets (
                match_id, division, match_date, home_team, away_team,
                outcome, label, model_prob, fair_prob, odds, edge,
                expected_value, kelly_fraction, confidence, actual, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16
            )
            ON CONFLICT(match_id, outcome) DO UPDATE SET
                model_prob = excluded.model_prob,
                fair_prob = excluded.fair_prob,
                odds = excluded.odds,
                edge = excluded.edge,
                expected_value = excluded.expected_value,
                kelly_fraction = excluded.kelly_fraction,
                confidence = excluded.confidence,
                actual = COALESCE(value_bets.actual, excluded.actual)
            "#,
            params![
                b.match_id as i64,
                b.division,
                b.date.format(DATE_FORMAT).to_string(),
                b.home_team,
                b.away_team,
                b.outcome.code().to_string(),
                b.label,
                b.model_prob,
                b.fair_prob,
                b.odds,
                b.edge,
                b.expected_value,
                b.kelly_fraction,
                b.confidence,
                b.actual.map(|o| o.code().to_string()),
                now,
            ],
        )
        .with_context(|| format!("insert value bet for match {}", b.match_id))?;
    }
    tx.commit().context("commit value bets")?;
    Ok(bets.len())
}

/// Copies ledger results into unsettled bets. Returns the number settled.
pub fn settle_value_bets(conn: &Connection) -> Result<usize> {
    let settled = conn
        .execute(
            r#"
            UPDATE value_bets
            SET actual = (SELECT m.result FROM matches m WHERE m.id = value_bets.match_id)
            WHERE actual IS NULL
              AND EXISTS (SELECT 1 FROM matches m WHERE m.id = value_bets.match_id)
            "#,
            [],
        )
        .context("settle value bets")?;
    if settled > 0 {
        info!(settled, "value bets settled");
    }
    Ok(settled)
}

pub fn load_value_bets(conn: &Connection) -> Result<Vec<ValueBetCandidate>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                match_id, division, match_date, home_team, away_team,
                outcome, label, model_prob, fair_prob, odds, edge,
                expected_value, kelly_fraction, confidence, actual
            FROM value_bets
            "#,
        )
        .context("prepare load value bets query")?;

    type RawBet = (u64, String, String, String, String, String, String, [f64; 7], Option<String>);
    let rows = stmt
        .query_map([], |row| -> rusqlite::Result<RawBet> {
            Ok((
                row.get::<_, u64>(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                [
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                    row.get(11)?,
                    row.get(12)?,
                    row.get(13)?,
                ],
                row.get(14)?,
            ))
        })
        .context("query load value bets")?;

    let mut out = Vec::new();
    for row in rows {
        let (match_id, division, date, home_team, away_team, outcome, label, nums, actual) =
            row.context("decode value bet row")?;
        let [model_prob, fair_prob, odds, edge, expected_value, kelly_fraction, confidence] = nums;
        let date = parse_match_date(&date)
            .ok_or_else(|| anyhow!("value bet {match_id}: bad date {date:?}"))?;
        let outcome = Outcome::from_code(&outcome)
            .ok_or_else(|| anyhow!("value bet {match_id}: bad outcome {outcome:?}"))?;
        let actual = match actual {
            Some(code) => Some(
                Outcome::from_code(&code)
                    .ok_or_else(|| anyhow!("value bet {match_id}: bad result {code:?}"))?,
            ),
            None => None,
        };
        out.push(ValueBetCandidate {
            match_id,
            division,
            date,
            home_team,
            away_team,
            outcome,
            label,
            model_prob,
            fair_prob,
            odds,
            edge,
            expected_value,
            kelly_fraction,
            confidence,
            actual,
        });
    }
    rank_candidates(&mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rusqlite::Connection;

    use super::{init_schema, load_matches, upsert_matches};
    use crate::matches::{MatchRecord, OddsTriplet, SideStats};

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn upsert_refreshes_on_natural_key() {
        let mut conn = conn();
        let date = NaiveDate::from_ymd_opt(2023, 8, 12).unwrap();
        let first = MatchRecord::new(1, "E0", date, "Arsenal", "Forest", 1, 0);
        upsert_matches(&mut conn, &[first]).unwrap();

        let corrected = MatchRecord::new(1, "E0", date, "Arsenal", "Forest", 2, 1)
            .with_odds(OddsTriplet::new(1.3, 5.5, 9.0))
            .with_stats(
                SideStats { shots: Some(15), shots_on_target: None, corners: Some(8) },
                SideStats::default(),
            );
        upsert_matches(&mut conn, &[corrected.clone()]).unwrap();

        let loaded = load_matches(&conn, None).unwrap();
        assert_eq!(loaded, vec![corrected]);
    }

    #[test]
    fn division_filter_and_order() {
        let mut conn = conn();
        let d = |day| NaiveDate::from_ymd_opt(2023, 9, day).unwrap();
        upsert_matches(
            &mut conn,
            &[
                MatchRecord::new(3, "E0", d(2), "A", "B", 0, 0),
                MatchRecord::new(1, "E0", d(2), "C", "D", 1, 0),
                MatchRecord::new(2, "SP1", d(1), "E", "F", 0, 1),
            ],
        )
        .unwrap();
        let all: Vec<u64> = load_matches(&conn, None).unwrap().iter().map(|m| m.id).collect();
        assert_eq!(all, vec![2, 1, 3]);
        let e0 = load_matches(&conn, Some("E0")).unwrap();
        assert_eq!(e0.len(), 2);
        assert!(e0.iter().all(|m| m.division == "E0"));
    }
}
