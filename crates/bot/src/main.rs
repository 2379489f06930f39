//! Matchday - match registration bot for chat groups
//!
//! Connects to a chat gateway, keeps one upcoming match per team on its
//! weekly schedule, and collects attendance votes.

use std::path::PathBuf;

use directories::ProjectDirs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use matchday_core::{Coordinator, Database, Schedule, SystemClock};
use matchday_net::GatewayClient;

mod config;
mod inbound;
mod render;
mod runtime;

use config::BotConfig;

fn default_data_path() -> std::io::Result<PathBuf> {
    let dirs = ProjectDirs::from("dev", "matchday", "matchday").ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine data directory",
        )
    })?;
    Ok(dirs.data_dir().to_path_buf())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Matchday");

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("matchday.toml"));
    let config = match BotConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    let default_schedule = match Schedule::parse(&config.default_schedule) {
        Ok(schedule) => schedule,
        Err(e) => {
            tracing::error!("Bad default schedule in config: {e}");
            std::process::exit(1);
        }
    };

    let db_path = match &config.database_path {
        Some(path) => path.clone(),
        None => match default_data_path() {
            Ok(dir) => dir.join("matchday.db"),
            Err(e) => {
                tracing::error!("Failed to resolve data directory: {e}");
                std::process::exit(1);
            }
        },
    };
    if let Some(parent) = db_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::error!("Failed to create data directory: {e}");
            std::process::exit(1);
        }
    }

    let db = match Database::open(&db_path) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to open database: {e}");
            std::process::exit(1);
        }
    };

    let addr = match config.gateway_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Bad gateway address {:?}: {e}", config.gateway_addr);
            std::process::exit(1);
        }
    };
    let client = match GatewayClient::connect(addr, config.auth_token.clone()).await {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to connect to gateway: {e}");
            std::process::exit(1);
        }
    };

    let coordinator = Coordinator::new(db, SystemClock);
    runtime::BotRuntime::new(coordinator, client, default_schedule)
        .run()
        .await;
}
