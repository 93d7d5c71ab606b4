//! In-process fakes for the upstream services.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use moviex_backend::{BackendError, FavoritesApi};
use moviex_core::{
    CastMember, Favorite, Genre, Movie, MovieDetails, Paged, Session, TimeWindow, Video,
};
use moviex_metadata::{DiscoverParams, MetadataError, MetadataSource};

use crate::controller::SearchMemory;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Genres,
    Search { query: String, page: u32 },
    Discover { params: DiscoverParams, page: u32 },
    Trending { window: TimeWindow, page: u32 },
    Movie(u64),
    Credits(u64),
    Videos(u64),
}

pub struct FakeSource {
    pub calls: Mutex<Vec<Call>>,
    pub total_pages: u32,
    pub fail: AtomicBool,
}

impl FakeSource {
    pub fn new(total_pages: u32) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            total_pages,
            fail: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Option<Call> {
        self.calls.lock().unwrap().last().cloned()
    }

    fn page(&self, call: Call, label: &str, page: u32) -> Result<Paged<Movie>, MetadataError> {
        self.calls.lock().unwrap().push(call);
        if self.fail.load(Ordering::SeqCst) {
            return Err(MetadataError::Network("connection refused".into()));
        }
        Ok(Paged {
            page,
            total_pages: self.total_pages,
            results: (0..2)
                .map(|i| movie(u64::from(page) * 10 + i, &format!("{label} p{page} #{i}")))
                .collect(),
        })
    }
}

pub fn movie(id: u64, title: &str) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        poster_path: Some(format!("/{id}.jpg")),
        release_date: Some("2010-07-15".into()),
        vote_average: 7.5,
        genre_ids: vec![28],
        overview: None,
    }
}

#[async_trait::async_trait]
impl MetadataSource for FakeSource {
    fn name(&self) -> &str {
        "fake"
    }

    async fn genres(&self) -> Result<Vec<Genre>, MetadataError> {
        self.calls.lock().unwrap().push(Call::Genres);
        Ok(vec![Genre {
            id: 28,
            name: "Action".into(),
        }])
    }

    async fn search(&self, query: &str, page: u32) -> Result<Paged<Movie>, MetadataError> {
        let call = Call::Search {
            query: query.to_string(),
            page,
        };
        self.page(call, query, page)
    }

    async fn discover(
        &self,
        params: &DiscoverParams,
        page: u32,
    ) -> Result<Paged<Movie>, MetadataError> {
        let call = Call::Discover {
            params: params.clone(),
            page,
        };
        self.page(call, "discover", page)
    }

    async fn trending(
        &self,
        window: TimeWindow,
        page: u32,
    ) -> Result<Paged<Movie>, MetadataError> {
        self.page(Call::Trending { window, page }, "trending", page)
    }

    async fn movie(&self, id: u64) -> Result<MovieDetails, MetadataError> {
        self.calls.lock().unwrap().push(Call::Movie(id));
        if id == 0 {
            return Err(MetadataError::NotFound);
        }
        Ok(MovieDetails {
            id,
            title: "Inception".into(),
            overview: Some("A thief who steals corporate secrets".into()),
            poster_path: Some("/inception.jpg".into()),
            release_date: Some("2010-07-15".into()),
            runtime: Some(148),
            vote_average: 8.4,
            genres: vec![Genre {
                id: 28,
                name: "Action".into(),
            }],
        })
    }

    async fn credits(&self, id: u64) -> Result<Vec<CastMember>, MetadataError> {
        self.calls.lock().unwrap().push(Call::Credits(id));
        if self.fail.load(Ordering::SeqCst) {
            return Err(MetadataError::Network("connection refused".into()));
        }
        Ok((0..7)
            .map(|i| CastMember {
                name: format!("Actor {i}"),
                character: Some(format!("Role {i}")),
                profile_path: None,
            })
            .collect())
    }

    async fn videos(&self, id: u64) -> Result<Vec<Video>, MetadataError> {
        self.calls.lock().unwrap().push(Call::Videos(id));
        let video = |key: &str, site: &str, kind: &str| Video {
            key: key.into(),
            name: String::new(),
            site: site.into(),
            kind: kind.into(),
        };
        Ok(vec![
            video("teaser", "YouTube", "Teaser"),
            video("vimeo", "Vimeo", "Trailer"),
            video("YoHD9XEInc0", "YouTube", "Trailer"),
        ])
    }
}

#[derive(Default)]
pub struct FakeFavorites {
    pub records: Mutex<Vec<Favorite>>,
    pub calls: AtomicUsize,
    pub fail_mutations: AtomicBool,
}

impl FakeFavorites {
    pub fn with(records: Vec<Favorite>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl FavoritesApi for FakeFavorites {
    async fn list(&self, _session: &Session) -> Result<Vec<Favorite>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().clone())
    }

    async fn create(&self, _session: &Session, favorite: &Favorite) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(BackendError::Upstream { status: 500 });
        }
        self.records.lock().unwrap().push(favorite.clone());
        Ok(())
    }

    async fn delete(&self, _session: &Session, movie_id: u64) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(BackendError::Upstream { status: 500 });
        }
        self.records
            .lock()
            .unwrap()
            .retain(|f| f.movie_id != movie_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStub {
    pub text: Mutex<Option<String>>,
}

#[async_trait::async_trait]
impl SearchMemory for MemoryStub {
    async fn recall(&self) -> Option<String> {
        self.text.lock().unwrap().clone()
    }

    async fn remember(&self, query: &str) {
        *self.text.lock().unwrap() = Some(query.to_string());
    }

    async fn forget(&self) {
        *self.text.lock().unwrap() = None;
    }
}
