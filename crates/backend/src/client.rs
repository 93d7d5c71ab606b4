use std::time::Duration;

use moviex_core::{Favorite, Session, UserProfile};
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{AuthApi, BackendError, Credentials, FavoritesApi, Registration};

pub const DEFAULT_BASE_URL: &str = "https://movieexplorerbackend-production.up.railway.app/api";

pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(alias = "message")]
    error: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, BackendError> {
        let resp = req
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .map(|e| e.error);

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(BackendError::Unauthorized(message));
        }
        match message {
            Some(msg) => Err(BackendError::Rejected(msg)),
            None => Err(BackendError::Upstream {
                status: status.as_u16(),
            }),
        }
    }

    async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, BackendError> {
        self.send(req)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl FavoritesApi for BackendClient {
    async fn list(&self, session: &Session) -> Result<Vec<Favorite>, BackendError> {
        debug!("listing favorites");
        let req = self
            .client
            .get(self.url("/favorite-movies"))
            .header(reqwest::header::AUTHORIZATION, session.bearer());
        self.json(req).await
    }

    async fn create(&self, session: &Session, favorite: &Favorite) -> Result<(), BackendError> {
        debug!(movie_id = favorite.movie_id, "creating favorite");
        let req = self
            .client
            .post(self.url("/favorite-movies"))
            .header(reqwest::header::AUTHORIZATION, session.bearer())
            .json(favorite);
        self.send(req).await?;
        Ok(())
    }

    async fn delete(&self, session: &Session, movie_id: u64) -> Result<(), BackendError> {
        debug!(movie_id, "deleting favorite");
        let req = self
            .client
            .delete(self.url(&format!("/favorite-movies/{movie_id}")))
            .header(reqwest::header::AUTHORIZATION, session.bearer());
        self.send(req).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuthApi for BackendClient {
    async fn login(&self, credentials: &Credentials) -> Result<Session, BackendError> {
        let req = self.client.post(self.url("/auth/login")).json(credentials);
        let resp: LoginResponse = self.json(req).await?;
        Ok(Session::new(resp.token))
    }

    async fn register(&self, registration: &Registration) -> Result<(), BackendError> {
        let req = self
            .client
            .post(self.url("/auth/register"))
            .json(registration);
        self.send(req).await?;
        Ok(())
    }

    async fn me(&self, session: &Session) -> Result<UserProfile, BackendError> {
        let req = self
            .client
            .get(self.url("/auth/users/me"))
            .header(reqwest::header::AUTHORIZATION, session.bearer());
        self.json(req).await
    }
}
