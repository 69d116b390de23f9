mod cli;
mod config;
mod db;
mod error;
mod routes;
mod sanitize;
mod services;
mod state;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::config::{PortalConfig, StorageKind};
use crate::services::session::{self, Role};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = PortalConfig::from_env().expect("invalid configuration");

    let state = match (config.storage, config.database_url.as_deref()) {
        (StorageKind::Postgres, Some(url)) => {
            let pool = db::init_pool(url, config.db_max_connections)
                .await
                .expect("database init failed");
            state::AppState::postgres(pool)
        }
        _ => {
            tracing::warn!("using in-memory storage; configuration is lost on restart");
            let pages = services::pages::MemoryContentProvider::new();
            if let Some(path) = config.seed_pages.as_deref() {
                let count = pages.seed_from_file(path).await.expect("failed to load seed pages");
                tracing::info!(count, path = %path.display(), "seed pages loaded");
            }
            state::AppState::memory(pages)
        }
    };

    if cli.command() == Command::Uninstall {
        services::options::remove_all(state.options.as_ref())
            .await
            .expect("failed to remove portal options");
        return;
    }

    services::options::install_defaults(state.options.as_ref())
        .await
        .expect("failed to install default options");

    // Bootstrap administrator session.
    let admin_token = config.admin_token.clone().unwrap_or_else(|| {
        let token = session::generate_token();
        tracing::warn!(%token, "PORTAL_ADMIN_TOKEN not set; generated a one-off admin token");
        token
    });
    state
        .sessions
        .ensure_user_session("admin", Role::Administrator, &admin_token)
        .await
        .expect("failed to bootstrap admin session");

    let _route_refresh = services::routing::spawn_route_refresh_task(state.clone(), config.route_refresh_interval_ms);

    let app = routes::app(state, config.assets_dir.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, "site portal listening");
    axum::serve(listener, app).await.expect("server failed");
}
