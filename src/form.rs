//! Rolling-window form over a team's most recent matches.

use crate::features::FeatureVector;
use crate::history::{TeamHistoryEntry, TeamResult};

/// Below this many prior matches every form feature is missing.
pub const MIN_FORM_HISTORY: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FormFeatures {
    pub points: Option<f64>,
    pub goals_scored: Option<f64>,
    pub goals_conceded: Option<f64>,
    pub win_rate: Option<f64>,
    pub shots: Option<f64>,
    pub shots_target: Option<f64>,
    pub corners: Option<f64>,
}

impl FormFeatures {
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn write_into(&self, fv: &mut FeatureVector, side: &str) {
        fv.set(format!("{side}_form_points"), self.points);
        fv.set(format!("{side}_form_goals_scored"), self.goals_scored);
        fv.set(format!("{side}_form_goals_conceded"), self.goals_conceded);
        fv.set(format!("{side}_form_win_rate"), self.win_rate);
        fv.set(format!("{side}_form_shots"), self.shots);
        fv.set(format!("{side}_form_shots_target"), self.shots_target);
        fv.set(format!("{side}_form_corners"), self.corners);
    }
}

/// Form over the last `window` entries of `history`, which must hold pre-match entries only.
pub fn compute_form(history: &[TeamHistoryEntry], window: usize) -> FormFeatures {
    if history.len() < MIN_FORM_HISTORY {
        return FormFeatures::missing();
    }
    let recent = &history[history.len().saturating_sub(window.max(1))..];
    let n = recent.len() as f64;

    let points: u32 = recent.iter().map(|e| e.result.points()).sum();
    let wins = recent
        .iter()
        .filter(|e| e.result == TeamResult::Win)
        .count();
    let scored: u32 = recent.iter().map(|e| e.goals_for as u32).sum();
    let conceded: u32 = recent.iter().map(|e| e.goals_against as u32).sum();

    FormFeatures {
        points: Some(points as f64 / n),
        goals_scored: Some(scored as f64 / n),
        goals_conceded: Some(conceded as f64 / n),
        win_rate: Some(wins as f64 / n),
        shots: mean_present(recent.iter().map(|e| e.stats.shots)),
        shots_target: mean_present(recent.iter().map(|e| e.stats.shots_on_target)),
        corners: mean_present(recent.iter().map(|e| e.stats.corners)),
    }
}

/// Mean over the entries that carry the statistic.
fn mean_present(values: impl Iterator<Item = Option<u16>>) -> Option<f64> {
    let (sum, count) = values
        .flatten()
        .fold((0.0_f64, 0usize), |(s, c), v| (s + v as f64, c + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::compute_form;
    use crate::history::TeamHistoryIndex;
    use crate::matches::{MatchRecord, SideStats};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    fn shots(n: u16) -> SideStats {
        SideStats {
            shots: Some(n),
            shots_on_target: None,
            corners: None,
        }
    }

    #[test]
    fn window_uses_most_recent_entries() {
        let mut index = TeamHistoryIndex::new();
        // Three early losses, then five wins: a window of 5 only sees the wins.
        for i in 0..3 {
            index.record(&MatchRecord::new(i, "E0", day(1 + i as u32), "X", "Y", 0, 1));
        }
        for i in 3..8 {
            index.record(&MatchRecord::new(i, "E0", day(1 + i as u32), "X", "Y", 2, 0));
        }
        let form = compute_form(index.history_of("X"), 5);
        assert_eq!(form.points, Some(3.0));
        assert_eq!(form.win_rate, Some(1.0));
        assert_eq!(form.goals_scored, Some(2.0));
        assert_eq!(form.goals_conceded, Some(0.0));
    }

    #[test]
    fn perspective_follows_venue() {
        let mut index = TeamHistoryIndex::new();
        index.record(&MatchRecord::new(1, "E0", day(1), "X", "Y", 1, 0));
        index.record(&MatchRecord::new(2, "E0", day(2), "Y", "X", 3, 1));
        index.record(&MatchRecord::new(3, "E0", day(3), "Z", "X", 0, 2));
        let form = compute_form(index.history_of("X"), 5);
        assert!((form.points.unwrap() - 2.0).abs() < 1e-12);
        assert!((form.goals_scored.unwrap() - 4.0 / 3.0).abs() < 1e-12);
        assert!((form.goals_conceded.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn partial_stats_average_over_present_entries() {
        let mut index = TeamHistoryIndex::new();
        index.record(
            &MatchRecord::new(1, "E0", day(1), "X", "Y", 1, 1).with_stats(shots(10), shots(3)),
        );
        index.record(&MatchRecord::new(2, "E0", day(2), "X", "Y", 1, 1));
        index.record(
            &MatchRecord::new(3, "E0", day(3), "Y", "X", 1, 1).with_stats(shots(4), shots(16)),
        );
        let form = compute_form(index.history_of("X"), 5);
        assert_eq!(form.shots, Some(13.0));
        assert_eq!(form.shots_target, None);
        assert_eq!(form.corners, None);
    }

    #[test]
    fn short_history_is_missing() {
        let mut index = TeamHistoryIndex::new();
        index.record(&MatchRecord::new(1, "E0", day(1), "X", "Y", 5, 0));
        index.record(&MatchRecord::new(2, "E0", day(2), "X", "Y", 5, 0));
        let form = compute_form(index.history_of("X"), 5);
        assert_eq!(form, super::FormFeatures::missing());
    }
}
