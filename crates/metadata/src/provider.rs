use moviex_core::{CastMember, FilterTuple, Genre, Movie, MovieDetails, Paged, TimeWindow, Video};

use crate::MetadataError;

/// Read-only access to the movie metadata service.
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    fn name(&self) -> &str;

    /// All movie genres, for filter controls and id-to-name mapping.
    async fn genres(&self) -> Result<Vec<Genre>, MetadataError>;

    /// Free-text title search.
    async fn search(&self, query: &str, page: u32) -> Result<Paged<Movie>, MetadataError>;

    /// Popularity-sorted discovery, narrowed by whichever filters are set.
    async fn discover(
        &self,
        params: &DiscoverParams,
        page: u32,
    ) -> Result<Paged<Movie>, MetadataError>;

    async fn trending(&self, window: TimeWindow, page: u32)
        -> Result<Paged<Movie>, MetadataError>;

    async fn movie(&self, id: u64) -> Result<MovieDetails, MetadataError>;

    async fn credits(&self, id: u64) -> Result<Vec<CastMember>, MetadataError>;

    async fn videos(&self, id: u64) -> Result<Vec<Video>, MetadataError>;
}

/// Parameters accepted only by the discovery endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverParams {
    pub genre: Option<u64>,
    pub year: Option<i32>,
    pub min_rating: Option<f64>,
}

impl DiscoverParams {
    pub fn from_filters(filters: &FilterTuple) -> Self {
        Self {
            genre: filters.genre,
            year: filters.year,
            min_rating: filters.min_rating,
        }
    }

    /// Query pairs for the set filters only.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(genre) = self.genre {
            pairs.push(("with_genres", genre.to_string()));
        }
        if let Some(year) = self.year {
            pairs.push(("primary_release_year", year.to_string()));
        }
        if let Some(rating) = self.min_rating {
            pairs.push(("vote_average.gte", rating.to_string()));
        }
        pairs
    }
}
