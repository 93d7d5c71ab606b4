//! TMDB (The Movie Database) client.
//!
//! Uses TMDB API v3: https://developer.themoviedb.org/docs

use std::time::Duration;

use moviex_core::{CastMember, Genre, Movie, MovieDetails, Paged, TimeWindow, Video};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::MetadataError;
use crate::provider::{DiscoverParams, MetadataSource};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub api_key: String,
    /// Defaults to [`DEFAULT_BASE_URL`].
    pub base_url: Option<String>,
    /// Defaults to `en-US`.
    pub language: Option<String>,
}

pub struct TmdbClient {
    api_key: String,
    base_url: String,
    language: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct GenreList {
    genres: Vec<Genre>,
}

#[derive(Deserialize)]
struct Credits {
    #[serde(default)]
    cast: Vec<CastMember>,
}

#[derive(Deserialize)]
struct VideoList {
    #[serde(default)]
    results: Vec<Video>,
}

impl TmdbClient {
    pub fn new(config: TmdbConfig) -> Result<Self, MetadataError> {
        if config.api_key.trim().is_empty() {
            return Err(MetadataError::Unauthorized);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MetadataError::Network(e.to_string()))?;

        Ok(Self {
            api_key: config.api_key,
            base_url: config
                .base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            language: config.language.unwrap_or_else(|| "en-US".to_string()),
            client,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, MetadataError> {
        let mut all_params: Vec<(&str, &str)> = vec![
            ("api_key", self.api_key.as_str()),
            ("language", self.language.as_str()),
        ];
        all_params.extend(params.iter().map(|(k, v)| (*k, v.as_str())));

        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "TMDB request");

        let resp = self
            .client
            .get(&url)
            .query(&all_params)
            .send()
            .await
            .map_err(|e| MetadataError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MetadataError::NotFound);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(MetadataError::Unauthorized);
        }
        if !status.is_success() {
            return Err(MetadataError::Provider(format!("TMDB returned {status}")));
        }

        resp.json()
            .await
            .map_err(|e| MetadataError::Provider(format!("parse JSON: {e}")))
    }

    async fn listing(
        &self,
        path: &str,
        mut params: Vec<(&'static str, String)>,
        page: u32,
    ) -> Result<Paged<Movie>, MetadataError> {
        params.push(("include_adult", "false".to_string()));
        params.push(("include_video", "false".to_string()));
        params.push(("page", page.to_string()));
        self.get_json(path, &params).await
    }
}

#[async_trait::async_trait]
impl MetadataSource for TmdbClient {
    fn name(&self) -> &str {
        "tmdb"
    }

    async fn genres(&self) -> Result<Vec<Genre>, MetadataError> {
        let list: GenreList = self.get_json("/genre/movie/list", &[]).await?;
        Ok(list.genres)
    }

    async fn search(&self, query: &str, page: u32) -> Result<Paged<Movie>, MetadataError> {
        self.listing("/search/movie", vec![("query", query.to_string())], page)
            .await
    }

    async fn discover(
        &self,
        params: &DiscoverParams,
        page: u32,
    ) -> Result<Paged<Movie>, MetadataError> {
        let mut pairs = vec![("sort_by", "popularity.desc".to_string())];
        pairs.extend(params.query_pairs());
        self.listing("/discover/movie", pairs, page).await
    }

    async fn trending(
        &self,
        window: TimeWindow,
        page: u32,
    ) -> Result<Paged<Movie>, MetadataError> {
        self.listing(&format!("/trending/movie/{window}"), Vec::new(), page)
            .await
    }

    async fn movie(&self, id: u64) -> Result<MovieDetails, MetadataError> {
        self.get_json(&format!("/movie/{id}"), &[]).await
    }

    async fn credits(&self, id: u64) -> Result<Vec<CastMember>, MetadataError> {
        let credits: Credits = self.get_json(&format!("/movie/{id}/credits"), &[]).await?;
        Ok(credits.cast)
    }

    async fn videos(&self, id: u64) -> Result<Vec<Video>, MetadataError> {
        let list: VideoList = self.get_json(&format!("/movie/{id}/videos"), &[]).await?;
        Ok(list.results)
    }
}
