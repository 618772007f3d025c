use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// All event kinds run by the engine.
///
/// Only one live instance of each kind may exist at a time.
pub enum EventKind {
    Duel,
    BankHeist,
    Auction,
    Arena,
    CardTrade,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Duel,
        EventKind::BankHeist,
        EventKind::Auction,
        EventKind::Arena,
        EventKind::CardTrade,
    ];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Duel => "duel",
            EventKind::BankHeist => "bank heist",
            EventKind::Auction => "auction",
            EventKind::Arena => "arena",
            EventKind::CardTrade => "card trade",
        };
        f.write_str(name)
    }
}

/// Lifecycle state of an event. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum EventState {
    Open = 0,
    BoardingCompleted = 1,
    Ended = 2,
}

impl EventState {
    pub fn from_repr(value: u8) -> Self {
        match value {
            0 => EventState::Open,
            1 => EventState::BoardingCompleted,
            _ => EventState::Ended,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weapon {
    Rock,
    Paper,
    Scissors,
}

impl Weapon {
    /// Rock breaks scissors, scissors cut paper, paper wraps rock.
    pub fn beats(self, other: Weapon) -> bool {
        matches!(
            (self, other),
            (Weapon::Rock, Weapon::Scissors)
                | (Weapon::Scissors, Weapon::Paper)
                | (Weapon::Paper, Weapon::Rock)
        )
    }
}

impl fmt::Display for Weapon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Weapon::Rock => "rock",
            Weapon::Paper => "paper",
            Weapon::Scissors => "scissors",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown weapon \"{0}\", choose rock, paper or scissors")]
pub struct InvalidWeapon(pub String);

impl FromStr for Weapon {
    type Err = InvalidWeapon;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('!').to_lowercase().as_str() {
            "rock" => Ok(Weapon::Rock),
            "paper" => Ok(Weapon::Paper),
            "scissors" => Ok(Weapon::Scissors),
            _ => Err(InvalidWeapon(s.to_string())),
        }
    }
}

/// What the initiator of a card trade wants in return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAsk {
    Card(String),
    Points(i64),
}

impl fmt::Display for TradeAsk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAsk::Card(card) => write!(f, "the card \"{card}\""),
            TradeAsk::Points(points) => write!(f, "{points} points"),
        }
    }
}
