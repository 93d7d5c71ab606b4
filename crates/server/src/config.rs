use anyhow::{Context, bail};
use moviex_core::TimeWindow;

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub bind_addr: String,
    pub tmdb_api_key: String,
    pub tmdb_base_url: Option<String>,
    pub language: String,
    pub backend_url: String,
    pub trending_window: TimeWindow,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let tmdb_api_key = lookup("TMDB_API_KEY").unwrap_or_default();
        if tmdb_api_key.trim().is_empty() {
            bail!("TMDB_API_KEY must be set");
        }

        let trending_window = match lookup("MOVIEX_TRENDING_WINDOW") {
            Some(w) => w
                .parse::<TimeWindow>()
                .map_err(anyhow::Error::msg)
                .context("invalid MOVIEX_TRENDING_WINDOW")?,
            None => TimeWindow::default(),
        };

        Ok(Self {
            db_path: lookup("MOVIEX_DB").unwrap_or_else(|| "moviex.db".to_string()),
            bind_addr: lookup("MOVIEX_BIND").unwrap_or_else(|| "127.0.0.1:8097".to_string()),
            tmdb_api_key,
            tmdb_base_url: lookup("TMDB_BASE_URL"),
            language: lookup("MOVIEX_LANGUAGE").unwrap_or_else(|| "en-US".to_string()),
            backend_url: lookup("MOVIEX_BACKEND_URL")
                .unwrap_or_else(|| moviex_backend::client::DEFAULT_BASE_URL.to_string()),
            trending_window,
        })
    }
}
