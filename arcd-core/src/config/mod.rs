//! Runtime configuration handling.
//!
//! The configuration types themselves live in `arcd_sdk::config`; this
//! module provides the store that lets the server swap them at runtime.

mod config_store;

pub use arcd_sdk::config::{
    ArenaConfig, AuctionConfig, DuelConfig, GamesConfig, HeistConfig, HeistTier, TradeConfig,
};
pub use config_store::ConfigStore;
