use std::env;

use serde::{Deserialize, Serialize};

use crate::matches::{OddsTriplet, is_valid_odd};

const DEFAULT_FORM_WINDOW: usize = 5;
const DEFAULT_H2H_LOOKBACK: usize = 5;
const DEFAULT_MIN_STRENGTH_PREFIX: usize = 20;
const DEFAULT_MIN_EDGE: f64 = 0.05;
const DEFAULT_KELLY_CAP: f64 = 0.05;
const DEFAULT_NEUTRAL_ODDS: (f64, f64, f64) = (2.5, 3.3, 3.5);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub form_window: usize,
    pub h2h_lookback: usize,
    pub min_strength_prefix: usize,
    /// Stand-in prices for matches the bookmaker never quoted.
    pub neutral_odds: OddsTriplet,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        let (home, draw, away) = DEFAULT_NEUTRAL_ODDS;
        Self {
            form_window: DEFAULT_FORM_WINDOW,
            h2h_lookback: DEFAULT_H2H_LOOKBACK,
            min_strength_prefix: DEFAULT_MIN_STRENGTH_PREFIX,
            neutral_odds: OddsTriplet::new(home, draw, away),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueConfig {
    pub min_edge: f64,
    pub kelly_cap: f64,
    /// Keep only the best-edge outcome of each match.
    pub one_outcome_per_match: bool,
}

impl Default for ValueConfig {
    fn default() -> Self {
        Self {
            min_edge: DEFAULT_MIN_EDGE,
            kelly_cap: DEFAULT_KELLY_CAP,
            one_outcome_per_match: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub features: FeatureConfig,
    pub value: ValueConfig,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let form_window = env_usize("MATCHEDGE_FORM_WINDOW")
            .unwrap_or(defaults.features.form_window)
            .clamp(3, 38);
        let h2h_lookback = env_usize("MATCHEDGE_H2H_LOOKBACK")
            .unwrap_or(defaults.features.h2h_lookback)
            .clamp(2, 20);
        let min_strength_prefix = env_usize("MATCHEDGE_MIN_STRENGTH_PREFIX")
            .unwrap_or(defaults.features.min_strength_prefix)
            .clamp(1, 1000);
        let neutral_odds = env::var("MATCHEDGE_NEUTRAL_ODDS")
            .ok()
            .and_then(|raw| parse_odds_triplet(&raw))
            .unwrap_or(defaults.features.neutral_odds);

        let min_edge = env_f64("MATCHEDGE_MIN_EDGE")
            .unwrap_or(defaults.value.min_edge)
            .clamp(0.0, 0.5);
        let kelly_cap = env_f64("MATCHEDGE_KELLY_CAP")
            .unwrap_or(defaults.value.kelly_cap)
            .clamp(0.0, 1.0);
        let one_outcome_per_match = env_bool(
            "MATCHEDGE_ONE_OUTCOME_PER_MATCH",
            defaults.value.one_outcome_per_match,
        );

        Self {
            features: FeatureConfig {
                form_window,
                h2h_lookback,
                min_strength_prefix,
                neutral_odds,
            },
            value: ValueConfig {
                min_edge,
                kelly_cap,
                one_outcome_per_match,
            },
        }
    }
}

/// Parses `"2.5,3.3,3.5"` style triplets; every price must be a valid odd.
pub fn parse_odds_triplet(raw: &str) -> Option<OddsTriplet> {
    let parts = raw
        .split([',', ';', ' ', '/'])
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;
    let [home, draw, away] = parts.as_slice() else {
        return None;
    };
    if ![*home, *draw, *away].iter().all(|o| is_valid_odd(*o)) {
        return None;
    }
    Some(OddsTriplet::new(*home, *draw, *away))
}

fn env_usize(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|v| v.trim().parse::<usize>().ok())
}

fn env_f64(key: &str) -> Option<f64> {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
