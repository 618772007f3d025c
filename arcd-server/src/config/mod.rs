//! Configuration module for arcd-server.
//!
//! Handles loading configuration from TOML files and CLI arguments.
//! Only the `[games]` section is applied again on reload; listen address,
//! chat channel and seed accounts are read once at startup.

pub mod file;

use crate::config::file::{AccountConfig, FileConfig};
use arcd_core::ledger::{MemoryInventory, MemoryLedger};
use arcd_sdk::config::GamesConfig;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub channel: String,
    pub games: GamesConfig,
    pub accounts: Vec<AccountConfig>,
}

impl LoadedConfig {
    /// Build the in-memory ledger and inventory from the seed accounts.
    pub fn seed_ledger(&self) -> (MemoryLedger, MemoryInventory) {
        let ledger = MemoryLedger::with_balances(
            self.accounts.iter().map(|a| (a.user.clone(), a.points)),
        );
        let inventory = MemoryInventory::with_cards(
            self.accounts
                .iter()
                .filter(|a| !a.cards.is_empty())
                .map(|a| (a.user.clone(), a.cards.clone())),
        );
        (ledger, inventory)
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;

        Ok(LoadedConfig {
            listen: file_config.server.listen,
            channel: file_config.chat.channel.trim().to_string(),
            games: file_config.games,
            accounts: file_config.accounts,
        })
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.chat.channel.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "chat channel must not be empty".to_string(),
        ));
    }

    config
        .games
        .validate()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    let mut seen = HashSet::new();
    for account in &config.accounts {
        if !seen.insert(&account.user) {
            return Err(ConfigError::ValidationError(format!(
                "account {} is listed more than once",
                account.user
            )));
        }
        if account.points < 0 {
            return Err(ConfigError::ValidationError(format!(
                "account {} starts with a negative balance",
                account.user
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcd_core::ledger::PointLedger;
    use arcd_sdk::objects::UserName;

    const CONFIG: &str = r#"
[chat]
channel = " #arcade "

[[accounts]]
user = "alice"
points = 250
cards = ["Golden Kappa", "Pog Champ"]

[[accounts]]
user = "bob"
points = 40
"#;

    struct TempConfig(PathBuf);

    impl TempConfig {
        fn new(content: &str) -> Self {
            let path = std::env::temp_dir().join(format!("arcd-{}.toml", uuid::Uuid::new_v4()));
            std::fs::write(&path, content).unwrap();
            Self(path)
        }
    }

    impl Drop for TempConfig {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn parse(content: &str) -> FileConfig {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn test_load_applies_listen_override() {
        let file = TempConfig::new(CONFIG);
        let listen: SocketAddr = "127.0.0.1:9999".parse().unwrap();

        let loaded = ConfigLoader::new(&file.0, Some(listen)).load().unwrap();

        assert_eq!(loaded.listen, listen);
        assert_eq!(loaded.channel, "#arcade");
        assert_eq!(loaded.accounts.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let loader = ConfigLoader::new("/nonexistent/arcd-config.toml", None);
        assert!(matches!(loader.load(), Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_rejects_invalid_games_section() {
        let config = parse("[chat]\nchannel = \"#arcade\"\n[games.arena]\nmin_participants = 2\n");
        assert!(matches!(
            validate(&config),
            Err(ConfigError::ValidationError(message)) if message.contains("at least 3")
        ));
    }

    #[test]
    fn test_rejects_duplicate_and_negative_accounts() {
        let duplicate = parse(
            "[chat]\nchannel = \"#arcade\"\n[[accounts]]\nuser = \"Alice\"\n[[accounts]]\nuser = \"@alice\"\n",
        );
        assert!(validate(&duplicate).is_err());

        let negative =
            parse("[chat]\nchannel = \"#arcade\"\n[[accounts]]\nuser = \"alice\"\npoints = -5\n");
        assert!(validate(&negative).is_err());

        let blank_channel = parse("[chat]\nchannel = \"  \"\n");
        assert!(validate(&blank_channel).is_err());
    }

    #[tokio::test]
    async fn test_seed_ledger() {
        let file = TempConfig::new(CONFIG);
        let loaded = ConfigLoader::new(&file.0, None).load().unwrap();

        let (ledger, inventory) = loaded.seed_ledger();

        let alice = UserName::new("alice").unwrap();
        let bob = UserName::new("bob").unwrap();
        assert_eq!(ledger.balance(&alice).await.unwrap(), 250);
        assert_eq!(ledger.balance(&bob).await.unwrap(), 40);
        assert_eq!(inventory.cards_of(&alice).await.len(), 2);
        assert!(inventory.cards_of(&bob).await.is_empty());
        assert!(ledger.journal().await.is_empty());
    }
}
