//! Auction configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionConfig {
    /// A bid arriving with less than this much time left extends the auction.
    pub snipe_threshold_secs: u64,
    pub snipe_extension_secs: u64,
    /// Interval of the "current highest bid" broadcast.
    pub status_interval_secs: u64,
    pub cooldown_secs: u64,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            snipe_threshold_secs: 10,
            snipe_extension_secs: 20,
            status_interval_secs: 60,
            cooldown_secs: 0,
        }
    }
}

impl AuctionConfig {
    pub fn snipe_threshold(&self) -> Duration {
        Duration::from_secs(self.snipe_threshold_secs)
    }

    pub fn snipe_extension(&self) -> Duration {
        Duration::from_secs(self.snipe_extension_secs)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}
