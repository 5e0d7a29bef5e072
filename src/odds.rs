//! Bookmaker odds to de-margined outcome probabilities.

use crate::matches::OddsTriplet;
use crate::outcome::{Outcome, Prob3};

/// Fallback when no price in the triplet is usable.
pub const NEUTRAL_PRIOR: Prob3 = Prob3 {
    home: 0.33,
    draw: 0.34,
    away: 0.33,
};

pub fn odds_to_probability(odds: Option<f64>) -> f64 {
    match odds {
        Some(o) if o.is_finite() && o > 1.0 => 1.0 / o,
        _ => 0.0,
    }
}

fn raw_probabilities(odds: &OddsTriplet) -> Prob3 {
    Prob3 {
        home: odds_to_probability(odds.home),
        draw: odds_to_probability(odds.draw),
        away: odds_to_probability(odds.away),
    }
}

/// Implied probabilities with the overround removed.
///
/// Invalid or absent prices contribute zero; if nothing is usable the result is
/// [`NEUTRAL_PRIOR`].
pub fn implied_probabilities(odds: &OddsTriplet) -> Prob3 {
    let raw = raw_probabilities(odds);
    let total = raw.sum();
    if total > 0.0 {
        Prob3 {
            home: raw.home / total,
            draw: raw.draw / total,
            away: raw.away / total,
        }
    } else {
        NEUTRAL_PRIOR
    }
}

/// Bookmaker margin, `sum(1/odds) - 1`. `None` unless all three prices are usable.
pub fn overround(odds: &OddsTriplet) -> Option<f64> {
    let complete = Outcome::ALL.iter().all(|o| odds.valid(*o).is_some());
    if !complete {
        return None;
    }
    Some(raw_probabilities(odds).sum() - 1.0)
}

/// Outcome with the shortest usable price.
pub fn favourite(odds: &OddsTriplet) -> Option<Outcome> {
    let mut best: Option<(Outcome, f64)> = None;
    for outcome in Outcome::ALL {
        let Some(price) = odds.valid(outcome) else {
            continue;
        };
        if best.is_none_or(|(_, p)| price < p) {
            best = Some((outcome, price));
        }
    }
    best.map(|(outcome, _)| outcome)
}

#[cfg(test)]
mod tests {
    use super::{NEUTRAL_PRIOR, favourite, implied_probabilities, overround};
    use crate::matches::OddsTriplet;
    use crate::outcome::Outcome;

    #[test]
    fn removes_margin() {
        let p = implied_probabilities(&OddsTriplet::new(2.0, 3.0, 4.0));
        assert!((p.home - 0.461538).abs() < 1e-4);
        assert!((p.draw - 0.307692).abs() < 1e-4);
        assert!((p.away - 0.230769).abs() < 1e-4);
        assert!((p.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn missing_prices_fall_back_to_prior() {
        assert_eq!(implied_probabilities(&OddsTriplet::default()), NEUTRAL_PRIOR);
        assert_eq!(
            implied_probabilities(&OddsTriplet::new(0.0, -1.0, 1.0)),
            NEUTRAL_PRIOR
        );
    }

    #[test]
    fn partial_prices_still_normalize() {
        let odds = OddsTriplet {
            home: Some(2.0),
            draw: None,
            away: Some(2.0),
        };
        let p = implied_probabilities(&odds);
        assert!((p.home - 0.5).abs() < 1e-12);
        assert_eq!(p.draw, 0.0);
        assert!((p.sum() - 1.0).abs() < 1e-9);
        assert_eq!(overround(&odds), None);
    }

    #[test]
    fn favourite_is_shortest_price() {
        assert_eq!(
            favourite(&OddsTriplet::new(3.1, 3.3, 2.2)),
            Some(Outcome::Away)
        );
        assert_eq!(favourite(&OddsTriplet::default()), None);
        let margin = overround(&OddsTriplet::new(2.0, 3.0, 4.0)).unwrap();
        assert!((margin - 0.083333).abs() < 1e-5);
    }
}
