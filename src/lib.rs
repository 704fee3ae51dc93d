pub mod types;
pub mod config;
pub mod bracket;
pub mod store;
pub mod admin;
pub mod api;

use types::*;
use config::*;
use admin::SeasonAdmin;
use store::{JsonFileStore, SeasonStore};

use std::{
    fs,
    sync::{Arc, Mutex},
};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// ── HTTP server ────────────────────────────────────────────────────────

pub async fn serve<S>(admin: SharedAdmin<S>, config: AppConfig)
where
    S: SeasonStore + Send + 'static,
{
    let addr = config.bind_addr.clone();
    let app = api::router(admin, static_dir(&config));
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("bracket server failed to bind {addr}: {e}");
            return;
        }
    };
    info!("bracket server listening at http://{addr}/");
    if let Err(e) = axum::serve(listener, app).await {
        error!("bracket server error: {e}");
    }
}

// ── Entry point ────────────────────────────────────────────────────────

pub fn run() {
    load_env_file();

    // Initialize tracing with file output
    let logs_dir = repo_root().join("logs");
    fs::create_dir_all(&logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    info!("Bracket admin starting");

    let config = load_config_inner().unwrap_or_else(|e| {
        error!("{e}; falling back to defaults");
        apply_env_defaults(AppConfig::default())
    });
    log_env_warnings(&config);

    let data = data_dir(&config);
    info!("Season data at {}", data.display());
    let admin: SharedAdmin<JsonFileStore> = Arc::new(Mutex::new(SeasonAdmin::new(JsonFileStore::new(data))));

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to start async runtime: {e}");
            return;
        }
    };
    runtime.block_on(serve(admin, config));
}
