//! Bank heist configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One row of the payout table.
///
/// A heist uses the last tier whose `min_users` does not exceed its final
/// crew size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeistTier {
    /// Name of the bank robbed at this tier, used in announcements.
    pub name: String,
    pub min_users: usize,
    /// Probability in `[0, 1]` that a single robber makes it out.
    pub win_chance: f64,
    pub payout_multiplier: f64,
}

impl HeistTier {
    fn new(name: &str, min_users: usize, win_chance: f64, payout_multiplier: f64) -> Self {
        Self {
            name: name.to_string(),
            min_users,
            win_chance,
            payout_multiplier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeistConfig {
    pub join_window_secs: u64,
    /// Pause between the crew entering the bank and the results.
    pub suspense_secs: u64,
    pub cooldown_secs: u64,
    pub tiers: Vec<HeistTier>,
}

impl Default for HeistConfig {
    fn default() -> Self {
        Self {
            join_window_secs: 120,
            suspense_secs: 5,
            cooldown_secs: 600,
            tiers: vec![
                HeistTier::new("Savings & Loan", 0, 0.595, 1.5),
                HeistTier::new("City Bank", 5, 0.488, 1.7),
                HeistTier::new("State Bank", 10, 0.415, 2.0),
                HeistTier::new("National Reserve", 15, 0.329, 2.5),
                HeistTier::new("Federal Reserve", 20, 0.25, 4.0),
            ],
        }
    }
}

impl HeistConfig {
    pub fn join_window(&self) -> Duration {
        Duration::from_secs(self.join_window_secs)
    }

    pub fn suspense(&self) -> Duration {
        Duration::from_secs(self.suspense_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}
