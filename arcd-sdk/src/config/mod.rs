//! Game configuration types.
//!
//! Every field has a default so a configuration file only needs to mention
//! what it changes. Loading and reloading is handled by the server crate.

mod arena;
mod auction;
mod duel;
mod heist;
mod trade;

pub use arena::ArenaConfig;
pub use auction::AuctionConfig;
pub use duel::DuelConfig;
pub use heist::{HeistConfig, HeistTier};
pub use trade::TradeConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings of all games, grouped by event kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamesConfig {
    pub duel: DuelConfig,
    pub heist: HeistConfig,
    pub auction: AuctionConfig,
    pub arena: ArenaConfig,
    pub trade: TradeConfig,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GamesConfigError {
    #[error("heist tier table is empty")]
    NoHeistTiers,
    #[error("the first heist tier must start at 0 users, found {0}")]
    FirstTierNotZero(usize),
    #[error("heist tier \"{0}\" does not raise the user threshold")]
    TiersNotAscending(String),
    #[error("heist tier \"{name}\" has win chance {chance}, expected a value between 0 and 1")]
    InvalidWinChance { name: String, chance: f64 },
    #[error("heist tier \"{0}\" has a negative payout multiplier")]
    NegativeMultiplier(String),
    #[error("the arena needs at least 3 participants to pick a podium, configured {0}")]
    ArenaTooSmall(usize),
    #[error("arena podium shares add up to more than 100%")]
    PodiumOverflow,
    #[error("duel draw fee of {0}% exceeds 100%")]
    DrawFeeOverflow(u8),
    #[error("auction status interval must be at least one second")]
    ZeroStatusInterval,
}

impl GamesConfig {
    pub fn validate(&self) -> Result<(), GamesConfigError> {
        let tiers = &self.heist.tiers;
        let first = tiers.first().ok_or(GamesConfigError::NoHeistTiers)?;
        if first.min_users != 0 {
            return Err(GamesConfigError::FirstTierNotZero(first.min_users));
        }
        for pair in tiers.windows(2) {
            if pair[1].min_users <= pair[0].min_users {
                return Err(GamesConfigError::TiersNotAscending(pair[1].name.clone()));
            }
        }
        for tier in tiers {
            if !(0.0..=1.0).contains(&tier.win_chance) {
                return Err(GamesConfigError::InvalidWinChance {
                    name: tier.name.clone(),
                    chance: tier.win_chance,
                });
            }
            if tier.payout_multiplier < 0.0 {
                return Err(GamesConfigError::NegativeMultiplier(tier.name.clone()));
            }
        }

        if self.arena.min_participants < 3 {
            return Err(GamesConfigError::ArenaTooSmall(self.arena.min_participants));
        }
        let podium =
            u16::from(self.arena.first_place_percent) + u16::from(self.arena.second_place_percent);
        if podium > 100 {
            return Err(GamesConfigError::PodiumOverflow);
        }

        if self.duel.draw_fee_percent > 100 {
            return Err(GamesConfigError::DrawFeeOverflow(self.duel.draw_fee_percent));
        }

        if self.auction.status_interval_secs == 0 {
            return Err(GamesConfigError::ZeroStatusInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GamesConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.heist.tiers.len(), 5);
        assert_eq!(config.heist.tiers[4].min_users, 20);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let json = r#"{ "duel": { "cooldown_secs": 30 } }"#;
        let config: GamesConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.duel.cooldown_secs, 30);
        assert_eq!(config.duel.weapon_window_secs, 60);
        assert_eq!(config.arena, ArenaConfig::default());
    }

    #[test]
    fn test_rejects_unordered_tiers() {
        let mut config = GamesConfig::default();
        config.heist.tiers.swap(1, 2);
        assert!(matches!(
            config.validate(),
            Err(GamesConfigError::TiersNotAscending(_))
        ));
    }

    #[test]
    fn test_rejects_bad_chance_and_podium() {
        let mut config = GamesConfig::default();
        config.heist.tiers[0].win_chance = 1.5;
        assert!(matches!(
            config.validate(),
            Err(GamesConfigError::InvalidWinChance { .. })
        ));

        let mut config = GamesConfig::default();
        config.arena.first_place_percent = 80;
        assert_eq!(config.validate(), Err(GamesConfigError::PodiumOverflow));
    }

    #[test]
    fn test_rejects_zero_status_interval() {
        let mut config = GamesConfig::default();
        config.auction.status_interval_secs = 0;
        assert_eq!(config.validate(), Err(GamesConfigError::ZeroStatusInterval));
    }
}
