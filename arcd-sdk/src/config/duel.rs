//! Duel configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    /// How long a challenge waits for someone to accept it.
    pub accept_window_secs: u64,
    /// How long both duelists have to pick their weapon.
    pub weapon_window_secs: u64,
    pub cooldown_secs: u64,
    /// Share of each wager burned on a draw.
    pub draw_fee_percent: u8,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            accept_window_secs: 60,
            weapon_window_secs: 60,
            cooldown_secs: 120,
            draw_fee_percent: 10,
        }
    }
}

impl DuelConfig {
    pub fn accept_window(&self) -> Duration {
        Duration::from_secs(self.accept_window_secs)
    }

    pub fn weapon_window(&self) -> Duration {
        Duration::from_secs(self.weapon_window_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}
