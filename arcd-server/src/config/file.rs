//! TOML file configuration structures.
//!
//! These structs directly map to the `arcd-config.toml` file format.

use arcd_sdk::config::GamesConfig;
use arcd_sdk::objects::UserName;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub chat: ChatConfig,
    #[serde(default)]
    pub games: GamesConfig,
    /// Seed data for the in-memory ledger.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Chat configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Channel every announcement is addressed to (e.g., "#arcade").
    pub channel: String,
}

/// Starting balance and cards of one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub user: UserName,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub cards: Vec<String>,
}
