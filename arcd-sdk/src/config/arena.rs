//! Arena configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub join_window_secs: u64,
    pub suspense_secs: u64,
    pub cooldown_secs: u64,
    /// Fewer fighters than this and everyone is refunded.
    pub min_participants: usize,
    pub first_place_percent: u8,
    /// Third place receives whatever the first two places leave in the pool.
    pub second_place_percent: u8,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            join_window_secs: 120,
            suspense_secs: 5,
            cooldown_secs: 300,
            min_participants: 4,
            first_place_percent: 60,
            second_place_percent: 25,
        }
    }
}

impl ArenaConfig {
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
