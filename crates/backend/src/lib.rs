//! Client for the personal favorites/auth backend.

pub mod client;

pub use client::BackendClient;

use moviex_core::{Favorite, Session, UserProfile};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(String),
    /// 401/403, with the backend's explanation when it sent one.
    #[error("unauthorized")]
    Unauthorized(Option<String>),
    /// The backend refused the request and said why.
    #[error("{0}")]
    Rejected(String),
    #[error("backend returned {status}")]
    Upstream { status: u16 },
    #[error("parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub email: String,
    pub password: String,
}

/// The signed-in user's saved movies.
#[async_trait::async_trait]
pub trait FavoritesApi: Send + Sync {
    async fn list(&self, session: &Session) -> Result<Vec<Favorite>, BackendError>;

    async fn create(&self, session: &Session, favorite: &Favorite) -> Result<(), BackendError>;

    async fn delete(&self, session: &Session, movie_id: u64) -> Result<(), BackendError>;
}

#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<Session, BackendError>;

    async fn register(&self, registration: &Registration) -> Result<(), BackendError>;

    async fn me(&self, session: &Session) -> Result<UserProfile, BackendError>;
}
