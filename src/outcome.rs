use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Home, Outcome::Draw, Outcome::Away];

    /// Ledger code used by football-data style result columns.
    pub fn code(self) -> char {
        match self {
            Outcome::Home => 'H',
            Outcome::Draw => 'D',
            Outcome::Away => 'A',
        }
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "H" => Some(Outcome::Home),
            "D" => Some(Outcome::Draw),
            "A" => Some(Outcome::Away),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Home => "Home Win",
            Outcome::Draw => "Draw",
            Outcome::Away => "Away Win",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Outcome::Home => 0,
            Outcome::Draw => 1,
            Outcome::Away => 2,
        }
    }
}

pub fn classify_outcome(home_goals: u8, away_goals: u8) -> Outcome {
    if home_goals > away_goals {
        Outcome::Home
    } else if home_goals < away_goals {
        Outcome::Away
    } else {
        Outcome::Draw
    }
}

/// One probability per outcome, home/draw/away.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prob3 {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl Prob3 {
    pub fn new(home: f64, draw: f64, away: f64) -> Self {
        Self { home, draw, away }
    }

    pub fn uniform() -> Self {
        Self {
            home: 1.0 / 3.0,
            draw: 1.0 / 3.0,
            away: 1.0 / 3.0,
        }
    }

    pub fn get(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Home => self.home,
            Outcome::Draw => self.draw,
            Outcome::Away => self.away,
        }
    }

    pub fn sum(&self) -> f64 {
        self.home + self.draw + self.away
    }

    /// Most likely outcome; ties resolve home, then draw.
    pub fn argmax(&self) -> Outcome {
        if self.home >= self.draw && self.home >= self.away {
            Outcome::Home
        } else if self.draw >= self.away {
            Outcome::Draw
        } else {
            Outcome::Away
        }
    }

    pub fn max(&self) -> f64 {
        self.home.max(self.draw).max(self.away)
    }
}
