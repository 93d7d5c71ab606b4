//! Persisted local state: the session token and the last search text.
//!
//! Each key is read and written on its own; nothing couples the two.

use moviex_core::Session;
use sqlx::SqlitePool;
use tracing::debug;

use crate::DbError;
use crate::repo::local_state;

const TOKEN_KEY: &str = "token";
const LAST_SEARCH_KEY: &str = "last_search";

#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Current session, if a non-empty token is stored.
    pub async fn load_session(&self) -> Result<Option<Session>, DbError> {
        let token = local_state::get(&self.pool, TOKEN_KEY).await?;
        Ok(token.filter(|t| !t.is_empty()).map(Session::new))
    }

    pub async fn save_session(&self, session: &Session) -> Result<(), DbError> {
        local_state::set(&self.pool, TOKEN_KEY, session.token()).await?;
        debug!("session token stored");
        Ok(())
    }

    pub async fn clear_session(&self) -> Result<(), DbError> {
        local_state::delete(&self.pool, TOKEN_KEY).await?;
        debug!("session token cleared");
        Ok(())
    }

    pub async fn last_search(&self) -> Result<Option<String>, DbError> {
        let text = local_state::get(&self.pool, LAST_SEARCH_KEY).await?;
        Ok(text.filter(|t| !t.trim().is_empty()))
    }

    pub async fn save_last_search(&self, query: &str) -> Result<(), DbError> {
        local_state::set(&self.pool, LAST_SEARCH_KEY, query).await?;
        Ok(())
    }

    pub async fn clear_last_search(&self) -> Result<(), DbError> {
        local_state::delete(&self.pool, LAST_SEARCH_KEY).await?;
        Ok(())
    }
}
