use std::sync::Arc;

use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{web, App, HttpServer};
use reqwest::Client;

use tiny_live_rooms::api::{self, AppState};
use tiny_live_rooms::config::AppConfig;
use tiny_live_rooms::logging::init_logging;
use tiny_live_rooms::pili::{PiliHubClient, RoomHub};
use tiny_live_rooms::storage::{create_sqlite_account_store, AccountStore};
use tiny_live_rooms::sweeper::run_sweeper;
use tiny_live_rooms::utils;

fn startup_error(message: String) -> std::io::Error {
    eprintln!("🚨 {message}");
    std::io::Error::other(message)
}

/// The main entry point for the application.
///
/// Loads the environment file named by the first command-line argument,
/// sets up logging, the account store and the hub client, starts the
/// expiry sweeper and then serves the HTTP API until shutdown.
///
/// Any failure before the server is bound (missing env file, bad config,
/// unreachable database, unwritable log file) aborts startup.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // 👇 Load env file from args
    let env_file = utils::env_file_from_args().map_err(startup_error)?;
    println!("📦 Loading environment from {}", env_file.display());
    utils::ensure_env_file_loaded(&env_file).map_err(startup_error)?;

    let config = AppConfig::load().map_err(startup_error)?;
    let _log_guard =
        init_logging(&config.log_level, config.log_file.as_deref()).map_err(startup_error)?;

    let store = create_sqlite_account_store(&config.database_url)
        .await
        .map_err(|e| startup_error(format!("Database {} failed: {e}", config.database_url)))?;
    let store: Arc<dyn AccountStore> = Arc::new(store);
    let hub: Arc<dyn RoomHub> = Arc::new(PiliHubClient::new(Client::new(), &config.pili));

    actix_web::rt::spawn(run_sweeper(
        store.clone(),
        hub.clone(),
        config.sweep_on_startup,
    ));

    let state = AppState::new(store, hub, config.pili.clone());

    let governor_conf = GovernorConfigBuilder::default()
        .burst_size(config.governor_burst)
        .seconds_per_request(config.governor_per_second)
        .finish()
        .ok_or_else(|| startup_error("Failed to build governor config".into()))?;

    tracing::info!(
        host = %config.server_host,
        port = config.server_port,
        hub = %config.pili.hub,
        "🚀 server starting"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Governor::new(&governor_conf))
            .app_data(web::Data::new(state.clone()))
            .configure(api::configure)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
