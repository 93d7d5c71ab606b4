//! Local mirror of the signed-in user's favorites.
//!
//! The backend is the source of truth. The set here is rebuilt on view mount
//! and only changed after the backend confirms a mutation.

use std::collections::HashSet;

use moviex_backend::{BackendError, FavoritesApi};
use moviex_core::{Favorite, Movie, Session};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum FavoriteError {
    #[error("Please login to add favorites!")]
    LoginRequired,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}

#[derive(Debug, Default)]
pub struct FavoriteSet {
    ids: HashSet<u64>,
    records: Vec<Favorite>,
    stale: bool,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, movie_id: u64) -> bool {
        self.ids.contains(&movie_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn records(&self) -> &[Favorite] {
        &self.records
    }

    /// True after a failed mutation until the next successful rebuild.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Replace the local mirror with the backend's full list.
    pub async fn rebuild(
        &mut self,
        api: &dyn FavoritesApi,
        session: &Session,
    ) -> Result<(), BackendError> {
        let records = api.list(session).await.inspect_err(|e| {
            warn!(error = %e, "failed to load favorites");
        })?;
        self.ids = records.iter().map(|f| f.movie_id).collect();
        self.records = records;
        self.stale = false;
        Ok(())
    }

    /// Rebuild only if a previous mutation failed.
    pub async fn reconcile(
        &mut self,
        api: &dyn FavoritesApi,
        session: &Session,
    ) -> Result<(), BackendError> {
        if self.stale {
            self.rebuild(api, session).await?;
        }
        Ok(())
    }

    /// Add `movie` if absent, remove it if present.
    pub async fn toggle(
        &mut self,
        api: &dyn FavoritesApi,
        session: Option<&Session>,
        movie: &Movie,
    ) -> Result<Toggled, FavoriteError> {
        let session = session.ok_or(FavoriteError::LoginRequired)?;

        if self.contains(movie.id) {
            self.remove(api, Some(session), movie.id).await?;
            return Ok(Toggled::Removed);
        }

        let favorite = Favorite::from_movie(movie);
        if let Err(e) = api.create(session, &favorite).await {
            warn!(movie_id = movie.id, error = %e, "favorite toggle failed");
            self.stale = true;
            return Err(e.into());
        }

        info!(movie_id = movie.id, "favorite added");
        self.ids.insert(movie.id);
        self.records.push(favorite);
        Ok(Toggled::Added)
    }

    pub async fn remove(
        &mut self,
        api: &dyn FavoritesApi,
        session: Option<&Session>,
        movie_id: u64,
    ) -> Result<(), FavoriteError> {
        let session = session.ok_or(FavoriteError::LoginRequired)?;

        if let Err(e) = api.delete(session, movie_id).await {
            warn!(movie_id, error = %e, "failed to remove favorite");
            self.stale = true;
            return Err(e.into());
        }

        info!(movie_id, "favorite removed");
        self.ids.remove(&movie_id);
        self.records.retain(|f| f.movie_id != movie_id);
        Ok(())
    }
}
