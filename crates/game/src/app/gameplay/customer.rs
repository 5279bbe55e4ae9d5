use std::fmt;
use std::str::FromStr;

use retail_engine::{Facing, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::sprites::SpriteKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerState {
    Browsing,
    Waiting,
    Helped,
    Satisfied,
    Leaving,
    Angry,
}

impl CustomerState {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomerState::Browsing => "browsing",
            CustomerState::Waiting => "waiting",
            CustomerState::Helped => "helped",
            CustomerState::Satisfied => "satisfied",
            CustomerState::Leaving => "leaving",
            CustomerState::Angry => "angry",
        }
    }

    /// Angry and leaving customers only head for the door.
    pub fn is_exiting(self) -> bool {
        matches!(self, CustomerState::Angry | CustomerState::Leaving)
    }
}

impl fmt::Display for CustomerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub id: u32,
    pub sprite: SpriteKind,
    pub position: Vec2,
    pub target: Option<Vec2>,
    /// Remaining waypoints toward `target`, nearest first.
    pub path: Vec<Vec2>,
    pub speed: f64,
    pub state: CustomerState,
    pub needs_help: bool,
    pub patience: f64,
    pub interaction_time: u32,
    pub approach_attempts: u32,
    pub last_interaction_ms: u64,
    pub facing: Facing,
    pub moving: bool,
}

impl Customer {
    pub fn new(
        id: u32,
        sprite: SpriteKind,
        position: Vec2,
        speed: f64,
        needs_help: bool,
        patience: f64,
    ) -> Self {
        Self {
            id,
            sprite,
            position,
            target: None,
            path: Vec::new(),
            speed,
            state: CustomerState::Browsing,
            needs_help,
            patience,
            interaction_time: 0,
            approach_attempts: 0,
            last_interaction_ms: 0,
            facing: Facing::Down,
            moving: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown difficulty '{0}', expected easy, medium or hard")]
pub struct ParseDifficultyError(String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseDifficultyError(raw.to_string())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        })
    }
}

impl Difficulty {
    pub fn countdown_seconds(self) -> u32 {
        match self {
            Difficulty::Easy => 60,
            Difficulty::Medium => 90,
            Difficulty::Hard => 120,
        }
    }

    /// Starting shoppers: three on easy, two more on medium, one more on hard.
    /// Patience drops as difficulty rises.
    pub fn roster(self) -> Vec<Customer> {
        let mut customers = vec![
            Customer::new(1, SpriteKind::Customer1, Vec2::new(5.0, 7.0), 0.03, true, 100.0),
            Customer::new(2, SpriteKind::Customer2, Vec2::new(15.0, 7.0), 0.025, false, 100.0),
            Customer::new(3, SpriteKind::Customer3, Vec2::new(10.0, 5.0), 0.035, true, 80.0),
        ];
        if self == Difficulty::Easy {
            return customers;
        }

        let fourth_patience = if self == Difficulty::Hard { 60.0 } else { 80.0 };
        customers.push(Customer::new(
            4,
            SpriteKind::Customer4,
            Vec2::new(8.0, 8.0),
            0.03,
            true,
            fourth_patience,
        ));
        customers.push(Customer::new(
            5,
            SpriteKind::Customer5,
            Vec2::new(12.0, 8.0),
            0.025,
            false,
            100.0,
        ));
        if self == Difficulty::Hard {
            customers.push(Customer::new(
                6,
                SpriteKind::Customer6,
                Vec2::new(10.0, 10.0),
                0.04,
                true,
                50.0,
            ));
        }
        customers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_size_grows_with_difficulty() {
        assert_eq!(Difficulty::Easy.roster().len(), 3);
        assert_eq!(Difficulty::Medium.roster().len(), 5);
        assert_eq!(Difficulty::Hard.roster().len(), 6);
    }

    #[test]
    fn hard_roster_is_less_patient() {
        let medium = Difficulty::Medium.roster();
        let hard = Difficulty::Hard.roster();
        assert_eq!(medium[3].patience, 80.0);
        assert_eq!(hard[3].patience, 60.0);
        assert_eq!(hard[5].patience, 50.0);
        assert_eq!(hard[5].sprite, SpriteKind::Customer6);
    }

    #[test]
    fn roster_customers_start_browsing_idle() {
        for customer in Difficulty::Hard.roster() {
            assert_eq!(customer.state, CustomerState::Browsing);
            assert_eq!(customer.target, None);
            assert!(customer.path.is_empty());
            assert_eq!(customer.approach_attempts, 0);
        }
    }

    #[test]
    fn countdown_budget_by_difficulty() {
        assert_eq!(Difficulty::Easy.countdown_seconds(), 60);
        assert_eq!(Difficulty::Medium.countdown_seconds(), 90);
        assert_eq!(Difficulty::Hard.countdown_seconds(), 120);
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!(" medium ".parse::<Difficulty>(), Ok(Difficulty::Medium));
        assert!("nightmare".parse::<Difficulty>().is_err());
    }

    #[test]
    fn customer_state_serializes_lowercase() {
        let json = serde_json::to_string(&CustomerState::Satisfied).expect("serialize");
        assert_eq!(json, "\"satisfied\"");
        assert_eq!(CustomerState::Angry.to_string(), "angry");
    }
}
