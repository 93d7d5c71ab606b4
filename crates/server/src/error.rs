use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use moviex_backend::BackendError;
use moviex_core::error::{ApiError, ErrorEnvelope};
use moviex_db::DbError;
use moviex_listing::FavoriteError;
use moviex_metadata::MetadataError;

/// Newtype wrapper so we can implement `IntoResponse` in this crate.
#[derive(Debug)]
pub struct AppError(pub ApiError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let envelope = ErrorEnvelope::from(&self.0);
        (status, Json(envelope)).into_response()
    }
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        Self(e)
    }
}

impl From<DbError> for AppError {
    fn from(e: DbError) -> Self {
        Self(ApiError::Internal(e.to_string()))
    }
}

impl From<MetadataError> for AppError {
    fn from(e: MetadataError) -> Self {
        Self(match e {
            MetadataError::NotFound => ApiError::NotFound("movie not found".into()),
            other => ApiError::BadGateway(other.to_string()),
        })
    }
}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        Self(match e {
            BackendError::Unauthorized(msg) => {
                ApiError::Unauthorized(msg.unwrap_or_else(|| "session rejected".into()))
            }
            BackendError::Rejected(msg) => ApiError::BadRequest(msg),
            other => ApiError::BadGateway(other.to_string()),
        })
    }
}

impl From<FavoriteError> for AppError {
    fn from(e: FavoriteError) -> Self {
        match e {
            FavoriteError::LoginRequired => {
                Self(ApiError::Unauthorized(FavoriteError::LoginRequired.to_string()))
            }
            FavoriteError::Backend(e) => e.into(),
        }
    }
}
