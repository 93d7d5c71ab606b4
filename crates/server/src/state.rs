use std::sync::Arc;

use moviex_backend::{AuthApi, FavoritesApi};
use moviex_core::{Session, TimeWindow};
use moviex_db::SessionStore;
use moviex_listing::{FavoriteSet, ListingController, ListingView};
use moviex_metadata::MetadataSource;
use tokio::sync::{Mutex, MutexGuard};
use tracing::warn;

/// Listing views addressable by path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Popular,
    Trending,
}

impl ViewKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "popular" => Some(Self::Popular),
            "trending" => Some(Self::Trending),
            _ => None,
        }
    }
}

/// One controller per listing view. Each lock is the view's serialized handler.
pub struct Views {
    popular: Mutex<ListingController>,
    trending: Mutex<ListingController>,
}

impl Views {
    pub fn new(trending_window: TimeWindow) -> Self {
        Self {
            popular: Mutex::new(ListingController::new(ListingView::Popular)),
            trending: Mutex::new(ListingController::new(ListingView::Trending(
                trending_window,
            ))),
        }
    }

    pub fn get(&self, kind: ViewKind) -> &Mutex<ListingController> {
        match kind {
            ViewKind::Popular => &self.popular,
            ViewKind::Trending => &self.trending,
        }
    }
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SessionStore,
    pub metadata: Arc<dyn MetadataSource>,
    pub favorites_api: Arc<dyn FavoritesApi>,
    pub auth: Arc<dyn AuthApi>,
    pub views: Arc<Views>,
    pub favorites: Arc<Mutex<FavoriteSet>>,
}

impl AppState {
    pub fn new(
        store: SessionStore,
        metadata: Arc<dyn MetadataSource>,
        favorites_api: Arc<dyn FavoritesApi>,
        auth: Arc<dyn AuthApi>,
        trending_window: TimeWindow,
    ) -> Self {
        Self {
            store,
            metadata,
            favorites_api,
            auth,
            views: Arc::new(Views::new(trending_window)),
            favorites: Arc::new(Mutex::new(FavoriteSet::new())),
        }
    }
}

impl AppState {
    /// Lock the favorites mirror, rebuilding it first if a mutation failed.
    /// A failed rebuild is logged and the stale set is returned as is.
    pub async fn favorites_for(&self, session: &Session) -> MutexGuard<'_, FavoriteSet> {
        let mut favorites = self.favorites.lock().await;
        if let Err(e) = favorites.reconcile(self.favorites_api.as_ref(), session).await {
            warn!(error = %e, "favorites still out of sync");
        }
        favorites
    }
}
