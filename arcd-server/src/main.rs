//! Chat Arcade Server
//!
//! Runs timed chat mini-games (duels, bank heists, auctions, arenas and card
//! trades) against a shared point ledger.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use arcd_core::announcements::{ChannelNotifier, announcement_channel};
use arcd_core::config::ConfigStore;
use arcd_core::events::EventContext;
use arcd_core::processors::Announcer;
use arcd_core::registry::EventRegistry;
use arcd_core::service::GameService;
use clap::Parser;
use config::ConfigLoader;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Chat Arcade - timed mini-game events for chat audiences
#[derive(Parser, Debug)]
#[command(name = "arcd-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "ARCD_CONFIG", default_value = "./arcd-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting arcd-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.listen;
    tracing::info!(
        accounts = loaded_config.accounts.len(),
        channel = %loaded_config.channel,
        "Configuration loaded from {:?}",
        args.config
    );

    // Announcements flow from the events through the Announcer
    let (announcement_tx, announcement_rx) = announcement_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let announcer_handle = tokio::spawn(Announcer::new(announcement_rx, shutdown_rx).run());

    let (ledger, inventory) = loaded_config.seed_ledger();
    let ctx = EventContext::new(
        Arc::new(ledger),
        Arc::new(inventory),
        Arc::new(ChannelNotifier::new(announcement_tx)),
        loaded_config.channel.as_str(),
    );
    let registry = EventRegistry::new(ctx);
    let service = GameService::new(registry.clone(), ConfigStore::new(loaded_config.games));

    // Spawn config reload handler (listens for SIGHUP)
    let reload_notify = spawn_config_reload_handler(service.config().clone(), config_loader);

    let router = build_router(AppState::new(service));

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    reload_notify.notify_one();

    // Return escrow held by running events before the announcer stops
    registry.shutdown().await;
    let _ = shutdown_tx.send(true);
    if let Err(e) = announcer_handle.await {
        tracing::error!(error = %e, "Announcer task failed");
    }
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,arcd_core=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
