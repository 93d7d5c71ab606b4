pub mod provider;
pub mod tmdb;

pub use provider::{DiscoverParams, MetadataSource};
pub use tmdb::{TmdbClient, TmdbConfig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("provider error: {0}")]
    Provider(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid API credential")]
    Unauthorized,
    #[error("not found")]
    NotFound,
}

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

/// Full image URL for a poster/profile path at the given size (`w500`, `w185`, `original`).
pub fn image_url(path: &str, size: &str) -> String {
    format!("{IMAGE_BASE}/{size}{path}")
}

/// Watch link for a trailer hosted on YouTube.
pub fn youtube_url(key: &str) -> String {
    format!("https://www.youtube.com/watch?v={key}")
}
