use std::sync::Arc;

use anyhow::Context;
use moviex_backend::BackendClient;
use moviex_db::SessionStore;
use moviex_metadata::{TmdbClient, TmdbConfig};
use moviex_server::config::Config;
use moviex_server::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    info!(db_path = %config.db_path, "opening local state");
    let pool = moviex_db::connect(&config.db_path)
        .await
        .context("failed to open local state database")?;
    moviex_db::migrate::run(&pool)
        .await
        .context("failed to run migrations")?;

    let store = SessionStore::new(pool);
    if store.load_session().await?.is_some() {
        info!("restored saved session");
    }

    let tmdb = TmdbClient::new(TmdbConfig {
        api_key: config.tmdb_api_key.clone(),
        base_url: config.tmdb_base_url.clone(),
        language: Some(config.language.clone()),
    })
    .context("failed to build metadata client")?;

    let backend = Arc::new(
        BackendClient::new(config.backend_url.clone())
            .context("failed to build backend client")?,
    );
    info!(backend = %config.backend_url, trending = %config.trending_window, "clients ready");

    let state = AppState::new(
        store,
        Arc::new(tmdb),
        backend.clone(),
        backend,
        config.trending_window,
    );
    let app = moviex_server::routes::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .context("failed to bind")?;
    info!(addr = %config.bind_addr, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
