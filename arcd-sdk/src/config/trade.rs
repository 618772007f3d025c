//! Card trade configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeConfig {
    pub accept_window_secs: u64,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            accept_window_secs: 60,
        }
    }
}

impl TradeConfig {
    pub fn accept_window(&self) -> Duration {
        Duration::from_secs(self.accept_window_secs)
    }
}
