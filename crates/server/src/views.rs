//! Listing view handlers.
//!
//! Every handler turns a request into at most one [`Intent`] and pushes it
//! through [`dispatch`]. The view's controller lock is held to issue and to
//! apply a fetch, never across the upstream call itself.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use moviex_core::error::ApiError;
use moviex_core::{FilterTuple, Movie, Session};
use moviex_listing::{Applied, Intent};
use moviex_metadata::image_url;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::state::{AppState, ViewKind};

#[derive(Serialize)]
pub struct MovieCard {
    #[serde(flatten)]
    pub movie: Movie,
    pub year: Option<i32>,
    pub poster_url: Option<String>,
    pub favorite: bool,
}

impl MovieCard {
    pub fn new(movie: Movie, favorite: bool) -> Self {
        Self {
            year: movie.release_year(),
            poster_url: movie.poster_path.as_deref().map(|p| image_url(p, "w500")),
            favorite,
            movie,
        }
    }
}

#[derive(Serialize)]
pub struct ViewResponse {
    pub view: &'static str,
    pub filters: FilterTuple,
    pub page: u32,
    pub has_more: bool,
    pub loading: bool,
    pub last_error: Option<String>,
    pub movies: Vec<MovieCard>,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// Filter form. Omitted fields are cleared; `query` is only touched when present.
#[derive(Deserialize)]
pub struct FiltersRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub genre: Option<u64>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub min_rating: Option<f64>,
}

fn view_kind(name: &str) -> Result<ViewKind, AppError> {
    ViewKind::parse(name).ok_or_else(|| ApiError::NotFound(format!("unknown view: {name}")).into())
}

async fn dispatch(state: &AppState, kind: ViewKind, intent: Option<Intent>) -> Option<Applied> {
    let controller = state.views.get(kind);
    let ticket = {
        let mut ctl = controller.lock().await;
        ctl.begin(intent?)
    }?;

    let result = ticket.fetch(state.metadata.as_ref()).await;

    let applied = controller.lock().await.complete(ticket, result);
    if applied == Applied::Stale {
        debug!(?kind, "response superseded");
    }
    Some(applied)
}

async fn render(state: &AppState, kind: ViewKind, session: &Session) -> ViewResponse {
    let snapshot = state.views.get(kind).lock().await.state().clone();
    let favorites = state.favorites_for(session).await;
    let view = match kind {
        ViewKind::Popular => "popular",
        ViewKind::Trending => "trending",
    };

    ViewResponse {
        view,
        filters: snapshot.filters,
        page: snapshot.page,
        has_more: snapshot.has_more,
        loading: snapshot.loading,
        last_error: snapshot.last_error,
        movies: snapshot
            .results
            .into_iter()
            .map(|m| {
                let favorite = favorites.contains(m.id);
                MovieCard::new(m, favorite)
            })
            .collect(),
    }
}

/// View mount: restore the last search, load page 1, rebuild favorite membership.
pub async fn mount(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(name): Path<String>,
) -> Result<Json<ViewResponse>, AppError> {
    let kind = view_kind(&name)?;

    let intent = state.views.get(kind).lock().await.mount(&state.store).await;

    let favorites_api = state.favorites_api.clone();
    let (_, rebuilt) = tokio::join!(dispatch(&state, kind, Some(intent)), async {
        state
            .favorites
            .lock()
            .await
            .rebuild(favorites_api.as_ref(), &session)
            .await
    });
    if let Err(e) = rebuilt {
        warn!(error = %e, "favorites unavailable for view");
    }

    Ok(Json(render(&state, kind, &session).await))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(name): Path<String>,
) -> Result<Json<ViewResponse>, AppError> {
    let kind = view_kind(&name)?;
    Ok(Json(render(&state, kind, &session).await))
}

pub async fn search(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(name): Path<String>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<ViewResponse>, AppError> {
    let kind = view_kind(&name)?;
    let intent = state
        .views
        .get(kind)
        .lock()
        .await
        .submit_search(&req.query, &state.store)
        .await;
    dispatch(&state, kind, Some(intent)).await;
    Ok(Json(render(&state, kind, &session).await))
}

pub async fn clear(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(name): Path<String>,
) -> Result<Json<ViewResponse>, AppError> {
    let kind = view_kind(&name)?;
    let intent = state
        .views
        .get(kind)
        .lock()
        .await
        .clear_search(&state.store)
        .await;
    dispatch(&state, kind, Some(intent)).await;
    Ok(Json(render(&state, kind, &session).await))
}

pub async fn set_filters(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(name): Path<String>,
    Json(req): Json<FiltersRequest>,
) -> Result<Json<ViewResponse>, AppError> {
    let kind = view_kind(&name)?;
    let intent = {
        let mut ctl = state.views.get(kind).lock().await;
        let filters = FilterTuple {
            query: req.query.unwrap_or_else(|| ctl.filters().query.clone()),
            genre: req.genre,
            year: req.year,
            min_rating: req.min_rating,
        };
        ctl.set_filters(filters)
    };
    dispatch(&state, kind, intent).await;
    Ok(Json(render(&state, kind, &session).await))
}

pub async fn load_more(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(name): Path<String>,
) -> Result<Json<ViewResponse>, AppError> {
    let kind = view_kind(&name)?;
    dispatch(&state, kind, Some(Intent::NextPage)).await;
    Ok(Json(render(&state, kind, &session).await))
}
