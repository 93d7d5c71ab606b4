use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::routing::{delete, get, post, put};
use axum::{Extension, Json, Router};
use moviex_core::{CastMember, Favorite, Genre, Movie, MovieDetails, Session};
use moviex_db::DbError;
use moviex_listing::{Toggled, load_details};
use moviex_metadata::image_url;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::{self, LOGIN_PATH};
use crate::error::AppError;
use crate::state::AppState;
use crate::views;

pub fn build_router(state: AppState) -> Router {
    let gated = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/genres", get(list_genres))
        .route("/views/{view}", get(views::mount))
        .route("/views/{view}/state", get(views::show))
        .route("/views/{view}/search", post(views::search))
        .route("/views/{view}/clear", post(views::clear))
        .route("/views/{view}/filters", put(views::set_filters))
        .route("/views/{view}/more", post(views::load_more))
        .route("/favorites", get(list_favorites))
        .route("/favorites/toggle", post(toggle_favorite))
        .route("/favorites/{movie_id}", delete(remove_favorite))
        .route("/movies/{id}", get(movie_details))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .route("/", get(|| async { Redirect::to(LOGIN_PATH) }))
        .route("/health", get(health))
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/logout", post(auth::logout))
        .merge(gated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    store_ping(&state).await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

async fn store_ping(state: &AppState) -> Result<(), DbError> {
    // A read of a key that may be absent still exercises the connection.
    state.store.last_search().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Genres
// ---------------------------------------------------------------------------

/// Genre list for the filter controls; empty when the metadata service is unavailable.
async fn list_genres(State(state): State<AppState>) -> Json<Vec<Genre>> {
    match state.metadata.genres().await {
        Ok(genres) => Json(genres),
        Err(e) => {
            warn!(error = %e, "failed to fetch genres");
            Json(Vec::new())
        }
    }
}

// ---------------------------------------------------------------------------
// Favorites
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct FavoriteCard {
    #[serde(flatten)]
    favorite: Favorite,
    year: Option<i32>,
    poster_url: Option<String>,
}

impl From<&Favorite> for FavoriteCard {
    fn from(f: &Favorite) -> Self {
        Self {
            year: f.release_year(),
            poster_url: f.poster_path.as_deref().map(|p| image_url(p, "w500")),
            favorite: f.clone(),
        }
    }
}

/// Favorites view mount: always a full rebuild from the backend.
async fn list_favorites(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<FavoriteCard>>, AppError> {
    let mut favorites = state.favorites.lock().await;
    favorites
        .rebuild(state.favorites_api.as_ref(), &session)
        .await?;
    Ok(Json(favorites.records().iter().map(FavoriteCard::from).collect()))
}

#[derive(Serialize)]
struct ToggleResponse {
    movie_id: u64,
    favorite: bool,
}

async fn toggle_favorite(
    State(state): State<AppState>,
    Json(movie): Json<Movie>,
) -> Result<Json<ToggleResponse>, AppError> {
    // Read the token again: it may have been cleared since the gate ran.
    let session = state.store.load_session().await?;
    let mut favorites = match &session {
        Some(session) => state.favorites_for(session).await,
        None => state.favorites.lock().await,
    };
    let toggled = favorites
        .toggle(state.favorites_api.as_ref(), session.as_ref(), &movie)
        .await?;

    Ok(Json(ToggleResponse {
        movie_id: movie.id,
        favorite: toggled == Toggled::Added,
    }))
}

async fn remove_favorite(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(movie_id): Path<u64>,
) -> Result<StatusCode, AppError> {
    let mut favorites = state.favorites_for(&session).await;
    favorites
        .remove(state.favorites_api.as_ref(), Some(&session), movie_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Details
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct DetailResponse {
    #[serde(flatten)]
    movie: MovieDetails,
    poster_url: Option<String>,
    cast: Vec<CastCard>,
    trailer_url: Option<String>,
    favorite: bool,
}

#[derive(Serialize)]
struct CastCard {
    #[serde(flatten)]
    member: CastMember,
    profile_url: Option<String>,
}

async fn movie_details(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<u64>,
) -> Result<Json<DetailResponse>, AppError> {
    let view = load_details(state.metadata.as_ref(), id).await?;
    let favorite = state.favorites_for(&session).await.contains(id);

    Ok(Json(DetailResponse {
        poster_url: view
            .movie
            .poster_path
            .as_deref()
            .map(|p| image_url(p, "w500")),
        movie: view.movie,
        cast: view
            .cast
            .into_iter()
            .map(|member| CastCard {
                profile_url: member.profile_path.as_deref().map(|p| image_url(p, "w185")),
                member,
            })
            .collect(),
        trailer_url: view.trailer_url,
        favorite,
    }))
}
