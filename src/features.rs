use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const FORM_SUFFIXES: [&str; 7] = [
    "form_points",
    "form_goals_scored",
    "form_goals_conceded",
    "form_win_rate",
    "form_shots",
    "form_shots_target",
    "form_corners",
];

pub const H2H_FEATURES: [&str; 4] = [
    "h2h_home_wins",
    "h2h_draws",
    "h2h_away_wins",
    "h2h_home_goals_avg",
];

pub const STRENGTH_FEATURES: [&str; 6] = [
    "home_attack_strength",
    "home_defense_strength",
    "away_attack_strength",
    "away_defense_strength",
    "home_league_position",
    "away_league_position",
];

pub const ODDS_FEATURES: [&str; 4] = [
    "implied_prob_home",
    "implied_prob_draw",
    "implied_prob_away",
    "odds_favorite",
];

/// Training-time feature order. Frozen into a schema file next to the matrix.
pub fn canonical_feature_names() -> Vec<String> {
    let mut out = Vec::with_capacity(FORM_SUFFIXES.len() * 2 + 14);
    for side in ["home", "away"] {
        out.extend(FORM_SUFFIXES.iter().map(|s| format!("{side}_{s}")));
    }
    out.extend(H2H_FEATURES.iter().map(|s| s.to_string()));
    out.extend(STRENGTH_FEATURES.iter().map(|s| s.to_string()));
    out.extend(ODDS_FEATURES.iter().map(|s| s.to_string()));
    out
}

/// Named features for one match. `None` marks a value that history could not support.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: BTreeMap<String, Option<f64>>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Option<f64>) {
        self.values.insert(name.into(), value.filter(|v| v.is_finite()));
    }

    /// `None` when the feature was never supplied, `Some(None)` when it is missing.
    pub fn get(&self, name: &str) -> Option<Option<f64>> {
        self.values.get(name).copied()
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).flatten()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_complete(&self, names: &[String]) -> bool {
        names.iter().all(|n| self.value(n).is_some())
    }

    pub fn missing_count(&self) -> usize {
        self.values.values().filter(|v| v.is_none()).count()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{FeatureVector, canonical_feature_names};

    #[test]
    fn canonical_names_are_unique_and_namespaced() {
        let names = canonical_feature_names();
        assert_eq!(names.len(), 28);
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), names.len());
        assert!(names.contains(&"home_form_points".to_string()));
        assert!(names.contains(&"away_form_corners".to_string()));
        for name in &names {
            assert!(
                ["home_", "away_", "h2h_", "implied_", "odds_"]
                    .iter()
                    .any(|p| name.starts_with(p)),
                "{name} is not namespaced"
            );
        }
    }

    #[test]
    fn missing_and_unsupplied_are_distinct() {
        let mut fv = FeatureVector::new();
        fv.set("h2h_draws", None);
        fv.set("home_form_points", Some(1.5));
        fv.set("home_form_shots", Some(f64::NAN));
        assert_eq!(fv.get("h2h_draws"), Some(None));
        assert_eq!(fv.get("away_form_points"), None);
        assert_eq!(fv.value("home_form_points"), Some(1.5));
        assert_eq!(fv.value("home_form_shots"), None);
        assert_eq!(fv.missing_count(), 2);
        assert!(!fv.is_complete(&["home_form_points".to_string(), "h2h_draws".to_string()]));
        assert!(fv.is_complete(&["home_form_points".to_string()]));
    }
}
