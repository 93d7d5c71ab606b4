use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use moviex_backend::{BackendError, Credentials, Registration};
use moviex_core::error::ApiError;
use moviex_core::{Session, UserProfile};
use moviex_listing::FavoriteSet;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/views/popular";

/// Session gate: anything behind it needs a stored token, otherwise the
/// caller is sent to the login page. The session is handed to handlers as a
/// request extension.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.store.load_session().await {
        Ok(Some(session)) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Ok(None) => {
            debug!(path = %request.uri().path(), "no session, redirecting to login");
            Redirect::to(LOGIN_PATH).into_response()
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

#[derive(Serialize)]
pub struct AuthPage {
    page: &'static str,
    signed_in: bool,
}

pub async fn login_page(State(state): State<AppState>) -> Result<Json<AuthPage>, AppError> {
    Ok(Json(AuthPage {
        page: "login",
        signed_in: state.store.load_session().await?.is_some(),
    }))
}

pub async fn register_page(State(state): State<AppState>) -> Result<Json<AuthPage>, AppError> {
    Ok(Json(AuthPage {
        page: "register",
        signed_in: state.store.load_session().await?.is_some(),
    }))
}

#[derive(Serialize)]
pub struct AuthResponse {
    message: &'static str,
    redirect: &'static str,
}

pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<AuthResponse>, AppError> {
    let session = state.auth.login(&credentials).await.map_err(|e| {
        warn!(error = %e, "login failed");
        credential_error(e)
    })?;

    state.store.save_session(&session).await?;
    *state.favorites.lock().await = FavoriteSet::new();
    info!("signed in");

    Ok(Json(AuthResponse {
        message: "Login successful!",
        redirect: HOME_PATH,
    }))
}

pub async fn register(
    State(state): State<AppState>,
    Json(registration): Json<Registration>,
) -> Result<Json<AuthResponse>, AppError> {
    state.auth.register(&registration).await.map_err(|e| {
        warn!(error = %e, "registration failed");
        AppError::from(e)
    })?;

    info!("account registered");
    Ok(Json(AuthResponse {
        message: "Registration successful!",
        redirect: LOGIN_PATH,
    }))
}

/// Forget the token locally and send the caller to the login page.
pub async fn logout(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.store.clear_session().await?;
    *state.favorites.lock().await = FavoriteSet::new();
    info!("signed out");
    Ok(Redirect::to(LOGIN_PATH))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(state.auth.me(&session).await?))
}

fn credential_error(e: BackendError) -> AppError {
    match e {
        BackendError::Rejected(msg) => ApiError::Unauthorized(msg).into(),
        BackendError::Unauthorized(msg) => {
            ApiError::Unauthorized(msg.unwrap_or_else(|| "Invalid credentials!".into())).into()
        }
        other => other.into(),
    }
}
