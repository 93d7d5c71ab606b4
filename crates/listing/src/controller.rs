//! Listing controller: one per listing view.
//!
//! State changes produce an [`Intent`]. The owner turns an intent into a
//! [`FetchTicket`] with [`ListingController::begin`], performs the fetch
//! without holding the controller, and hands the response back through
//! [`ListingController::complete`]. A ticket carries the generation and
//! filter tuple it was issued for; a response whose ticket no longer matches
//! the controller is dropped.

use moviex_core::{FilterTuple, Movie, Paged, TimeWindow};
use moviex_db::SessionStore;
use moviex_metadata::{DiscoverParams, MetadataError, MetadataSource};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Which default listing a view falls back to when no filter is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingView {
    Popular,
    Trending(TimeWindow),
}

impl ListingView {
    pub fn name(self) -> &'static str {
        match self {
            Self::Popular => "popular",
            Self::Trending(_) => "trending",
        }
    }
}

/// Upstream endpoint chosen for a filter tuple.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Search { query: String },
    Discover(DiscoverParams),
    Popular,
    Trending(TimeWindow),
}

impl Route {
    /// Text search wins over discovery filters, which win over the view default.
    pub fn for_filters(view: ListingView, filters: &FilterTuple) -> Self {
        if filters.is_text_search() {
            Self::Search {
                query: filters.query.trim().to_string(),
            }
        } else if filters.has_discovery_filters() {
            Self::Discover(DiscoverParams::from_filters(filters))
        } else {
            match view {
                ListingView::Popular => Self::Popular,
                ListingView::Trending(window) => Self::Trending(window),
            }
        }
    }

    pub async fn fetch(
        &self,
        source: &dyn MetadataSource,
        page: u32,
    ) -> Result<Paged<Movie>, MetadataError> {
        match self {
            Self::Search { query } => source.search(query, page).await,
            Self::Discover(params) => source.discover(params, page).await,
            Self::Popular => source.discover(&DiscoverParams::default(), page).await,
            Self::Trending(window) => source.trending(*window, page).await,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    FirstPage,
    NextPage,
}

/// An issued fetch, tagged with the state it was issued for.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    generation: u64,
    filters: FilterTuple,
    route: Route,
    page: u32,
    intent: Intent,
}

impl FetchTicket {
    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub async fn fetch(&self, source: &dyn MetadataSource) -> Result<Paged<Movie>, MetadataError> {
        self.route.fetch(source, self.page).await
    }
}

/// Result of handing a response back to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Replaced { count: usize },
    Appended { count: usize },
    /// Issued for a state that has since changed; nothing was touched.
    Stale,
    Failed(String),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListingState {
    pub filters: FilterTuple,
    pub page: u32,
    pub results: Vec<Movie>,
    pub has_more: bool,
    pub loading: bool,
    pub last_error: Option<String>,
}

pub struct ListingController {
    view: ListingView,
    state: ListingState,
    generation: u64,
    in_flight: Option<u64>,
}

impl ListingController {
    pub fn new(view: ListingView) -> Self {
        Self {
            view,
            state: ListingState {
                page: 1,
                ..Default::default()
            },
            generation: 0,
            in_flight: None,
        }
    }

    pub fn view(&self) -> ListingView {
        self.view
    }

    pub fn state(&self) -> &ListingState {
        &self.state
    }

    pub fn filters(&self) -> &FilterTuple {
        &self.state.filters
    }

    pub fn route(&self) -> Route {
        Route::for_filters(self.view, &self.state.filters)
    }

    /// View mount: start from blank filters plus the persisted search text, then load page 1.
    pub async fn mount(&mut self, memory: &dyn SearchMemory) -> Intent {
        let query = memory.recall().await.unwrap_or_default();
        if !query.is_empty() {
            debug!(view = self.view.name(), query = %query, "restoring last search");
        }
        self.state.filters = FilterTuple {
            query,
            ..Default::default()
        };
        self.invalidate();
        Intent::FirstPage
    }

    /// Replace the whole filter tuple. Returns `None` when nothing changed.
    pub fn set_filters(&mut self, filters: FilterTuple) -> Option<Intent> {
        if self.state.filters == filters {
            return None;
        }
        self.state.filters = filters;
        self.invalidate();
        Some(Intent::FirstPage)
    }

    pub fn set_query(&mut self, query: &str) -> Option<Intent> {
        let filters = FilterTuple {
            query: query.to_string(),
            ..self.state.filters.clone()
        };
        self.set_filters(filters)
    }

    pub fn set_genre(&mut self, genre: Option<u64>) -> Option<Intent> {
        let filters = FilterTuple {
            genre,
            ..self.state.filters.clone()
        };
        self.set_filters(filters)
    }

    pub fn set_year(&mut self, year: Option<i32>) -> Option<Intent> {
        let filters = FilterTuple {
            year,
            ..self.state.filters.clone()
        };
        self.set_filters(filters)
    }

    pub fn set_min_rating(&mut self, min_rating: Option<f64>) -> Option<Intent> {
        let filters = FilterTuple {
            min_rating,
            ..self.state.filters.clone()
        };
        self.set_filters(filters)
    }

    /// Explicit search submission. Non-blank text is remembered for the next mount.
    /// Always reloads page 1, even when the text is unchanged.
    pub async fn submit_search(&mut self, query: &str, memory: &dyn SearchMemory) -> Intent {
        if !query.trim().is_empty() {
            memory.remember(query).await;
        }
        self.state.filters.query = query.to_string();
        self.invalidate();
        Intent::FirstPage
    }

    /// Drop the text query and its persisted copy; other filters stay.
    pub async fn clear_search(&mut self, memory: &dyn SearchMemory) -> Intent {
        memory.forget().await;
        self.state.filters.query.clear();
        self.invalidate();
        Intent::FirstPage
    }

    /// Issue a fetch for `intent`, or `None` if it must be ignored.
    ///
    /// A first-page fetch supersedes anything outstanding. A next-page fetch
    /// is ignored while another fetch for the current state is in flight or
    /// when the last page has been reached.
    pub fn begin(&mut self, intent: Intent) -> Option<FetchTicket> {
        let page = match intent {
            Intent::FirstPage => {
                self.generation += 1;
                1
            }
            Intent::NextPage => {
                if self.in_flight == Some(self.generation) {
                    debug!(view = self.view.name(), "next page ignored: fetch outstanding");
                    return None;
                }
                if !self.state.has_more {
                    debug!(view = self.view.name(), "next page ignored: no more pages");
                    return None;
                }
                self.state.page + 1
            }
        };

        self.in_flight = Some(self.generation);
        self.state.loading = true;

        Some(FetchTicket {
            generation: self.generation,
            filters: self.state.filters.clone(),
            route: self.route(),
            page,
            intent,
        })
    }

    /// Apply a response for `ticket`.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Paged<Movie>, MetadataError>,
    ) -> Applied {
        if ticket.generation != self.generation || ticket.filters != self.state.filters {
            debug!(
                view = self.view.name(),
                page = ticket.page,
                "discarding stale response"
            );
            return Applied::Stale;
        }

        self.in_flight = None;
        self.state.loading = false;

        let paged = match result {
            Ok(paged) => paged,
            Err(e) => {
                warn!(view = self.view.name(), page = ticket.page, error = %e, "listing fetch failed");
                let msg = e.to_string();
                self.state.last_error = Some(msg.clone());
                return Applied::Failed(msg);
            }
        };

        self.state.last_error = None;
        self.state.has_more = paged.has_more();
        self.state.page = ticket.page;
        let count = paged.results.len();

        match ticket.intent {
            Intent::FirstPage => {
                self.state.results = paged.results;
                info!(view = self.view.name(), count, "listing replaced");
                Applied::Replaced { count }
            }
            Intent::NextPage => {
                self.state.results.extend(paged.results);
                debug!(view = self.view.name(), page = ticket.page, count, "listing appended");
                Applied::Appended { count }
            }
        }
    }

    /// Begin, fetch and complete in one step for a controller with a single owner.
    pub async fn run(&mut self, source: &dyn MetadataSource, intent: Intent) -> Option<Applied> {
        let ticket = self.begin(intent)?;
        let result = ticket.fetch(source).await;
        Some(self.complete(ticket, result))
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.state.page = 1;
        self.state.has_more = false;
    }
}

/// Where the last submitted search text is kept between mounts.
#[async_trait::async_trait]
pub trait SearchMemory: Send + Sync {
    async fn recall(&self) -> Option<String>;

    async fn remember(&self, query: &str);

    async fn forget(&self);
}

#[async_trait::async_trait]
impl SearchMemory for SessionStore {
    async fn recall(&self) -> Option<String> {
        match self.last_search().await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to read last search");
                None
            }
        }
    }

    async fn remember(&self, query: &str) {
        if let Err(e) = self.save_last_search(query).await {
            warn!(error = %e, "failed to persist last search");
        }
    }

    async fn forget(&self) {
        if let Err(e) = self.clear_last_search().await {
            warn!(error = %e, "failed to clear last search");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::testing::{Call, FakeSource, MemoryStub};

    fn ids(ctl: &ListingController) -> Vec<u64> {
        ctl.state().results.iter().map(|m| m.id).collect()
    }

    #[test]
    fn routing_priority() {
        let view = ListingView::Trending(TimeWindow::Week);
        let mut f = FilterTuple {
            query: "Inception".into(),
            genre: Some(28),
            ..Default::default()
        };
        assert_eq!(
            Route::for_filters(view, &f),
            Route::Search {
                query: "Inception".into()
            }
        );

        f.query.clear();
        assert_eq!(
            Route::for_filters(view, &f),
            Route::Discover(DiscoverParams {
                genre: Some(28),
                ..Default::default()
            })
        );

        f.genre = None;
        assert_eq!(
            Route::for_filters(view, &f),
            Route::Trending(TimeWindow::Week)
        );
        assert_eq!(Route::for_filters(ListingView::Popular, &f), Route::Popular);
    }

    #[tokio::test]
    async fn search_then_clear_returns_to_default_listing() {
        let source = FakeSource::new(3);
        let memory = MemoryStub::default();
        let mut ctl = ListingController::new(ListingView::Trending(TimeWindow::Week));

        let intent = ctl.submit_search("Inception", &memory).await;
        ctl.run(&source, intent).await.unwrap();
        assert_eq!(
            source.last_call(),
            Some(Call::Search {
                query: "Inception".into(),
                page: 1
            })
        );
        assert_eq!(memory.text.lock().unwrap().as_deref(), Some("Inception"));

        let intent = ctl.clear_search(&memory).await;
        ctl.run(&source, intent).await.unwrap();
        assert_eq!(
            source.last_call(),
            Some(Call::Trending {
                window: TimeWindow::Week,
                page: 1
            })
        );
        assert!(memory.text.lock().unwrap().is_none());
        assert_eq!(ctl.state().page, 1);
    }

    #[tokio::test]
    async fn blank_search_is_not_remembered() {
        let memory = MemoryStub::default();
        let mut ctl = ListingController::new(ListingView::Popular);
        ctl.submit_search("   ", &memory).await;
        assert!(memory.text.lock().unwrap().is_none());
        assert_eq!(ctl.route(), Route::Popular);
    }

    #[tokio::test]
    async fn blank_search_keeps_previous_memory() {
        let memory = MemoryStub::default();
        let mut ctl = ListingController::new(ListingView::Popular);
        ctl.submit_search("Heat", &memory).await;
        ctl.submit_search("", &memory).await;
        assert_eq!(memory.text.lock().unwrap().as_deref(), Some("Heat"));
        assert_eq!(ctl.route(), Route::Popular);
    }

    #[tokio::test]
    async fn genre_filter_routes_to_discovery() {
        let source = FakeSource::new(3);
        let mut ctl = ListingController::new(ListingView::Popular);
        let intent = ctl.set_genre(Some(28)).unwrap();
        ctl.run(&source, intent).await.unwrap();
        assert_eq!(
            source.last_call(),
            Some(Call::Discover {
                params: DiscoverParams {
                    genre: Some(28),
                    ..Default::default()
                },
                page: 1
            })
        );
    }

    #[tokio::test]
    async fn first_page_replaces_next_page_appends() {
        let source = FakeSource::new(3);
        let mut ctl = ListingController::new(ListingView::Popular);

        assert_eq!(
            ctl.run(&source, Intent::FirstPage).await,
            Some(Applied::Replaced { count: 2 })
        );
        assert_eq!(ids(&ctl), vec![10, 11]);
        assert!(ctl.state().has_more);

        assert_eq!(
            ctl.run(&source, Intent::NextPage).await,
            Some(Applied::Appended { count: 2 })
        );
        assert_eq!(ctl.state().page, 2);
        assert_eq!(ids(&ctl), vec![10, 11, 20, 21]);

        ctl.run(&source, Intent::FirstPage).await.unwrap();
        assert_eq!(ids(&ctl), vec![10, 11]);
        assert_eq!(ctl.state().page, 1);
    }

    #[tokio::test]
    async fn next_page_stops_at_last_page() {
        let source = FakeSource::new(2);
        let mut ctl = ListingController::new(ListingView::Popular);
        ctl.run(&source, Intent::FirstPage).await.unwrap();
        ctl.run(&source, Intent::NextPage).await.unwrap();
        assert!(!ctl.state().has_more);

        assert_eq!(ctl.run(&source, Intent::NextPage).await, None);
        assert_eq!(source.calls().len(), 2);
        assert_eq!(ctl.state().page, 2);
    }

    #[tokio::test]
    async fn filter_change_resets_page() {
        let source = FakeSource::new(5);
        let mut ctl = ListingController::new(ListingView::Popular);
        ctl.run(&source, Intent::FirstPage).await.unwrap();
        ctl.run(&source, Intent::NextPage).await.unwrap();
        ctl.run(&source, Intent::NextPage).await.unwrap();
        assert_eq!(ctl.state().page, 3);

        let intent = ctl.set_year(Some(1999)).unwrap();
        assert_eq!(ctl.state().page, 1);
        assert!(!ctl.state().has_more);

        let ticket = ctl.begin(intent).unwrap();
        assert_eq!(ticket.page(), 1);
        assert_eq!(ticket.intent(), Intent::FirstPage);
    }

    #[test]
    fn unchanged_filter_is_a_no_op() {
        let mut ctl = ListingController::new(ListingView::Popular);
        assert!(ctl.set_min_rating(Some(7.0)).is_some());
        assert!(ctl.set_min_rating(Some(7.0)).is_none());
    }

    #[tokio::test]
    async fn overlapping_next_page_is_ignored() {
        let source = FakeSource::new(5);
        let mut ctl = ListingController::new(ListingView::Popular);
        ctl.run(&source, Intent::FirstPage).await.unwrap();

        let first = ctl.begin(Intent::NextPage).unwrap();
        assert!(ctl.begin(Intent::NextPage).is_none());

        let result = first.fetch(&source).await;
        assert_eq!(ctl.complete(first, result), Applied::Appended { count: 2 });
        assert_eq!(ctl.state().page, 2);
        assert!(ctl.begin(Intent::NextPage).is_some());
    }

    #[tokio::test]
    async fn stale_page_for_old_filters_is_discarded() {
        let source = FakeSource::new(5);
        let mut ctl = ListingController::new(ListingView::Popular);
        let intent = ctl.set_genre(Some(28)).unwrap();
        ctl.run(&source, intent).await.unwrap();

        // Page 2 for genre 28 is issued, then the user switches genre.
        let stale = ctl.begin(Intent::NextPage).unwrap();
        let stale_result = stale.fetch(&source).await;

        let intent = ctl.set_genre(Some(35)).unwrap();
        let fresh = ctl.begin(intent).unwrap();
        let fresh_result = fresh.fetch(&source).await;
        assert_eq!(ctl.complete(fresh, fresh_result), Applied::Replaced { count: 2 });
        let after_fresh = ids(&ctl);

        assert_eq!(ctl.complete(stale, stale_result), Applied::Stale);
        assert_eq!(ids(&ctl), after_fresh);
        assert_eq!(ctl.state().page, 1);
        assert_eq!(ctl.filters().genre, Some(35));
    }

    #[tokio::test]
    async fn superseded_first_page_is_discarded() {
        let source = FakeSource::new(5);
        let mut ctl = ListingController::new(ListingView::Popular);
        let old = ctl.begin(Intent::FirstPage).unwrap();
        let new = ctl.begin(Intent::FirstPage).unwrap();

        let new_result = new.fetch(&source).await;
        ctl.complete(new, new_result);
        let old_result = old.fetch(&source).await;
        assert_eq!(ctl.complete(old, old_result), Applied::Stale);
        assert!(!ctl.state().loading);
    }

    #[tokio::test]
    async fn failure_keeps_existing_results() {
        let source = FakeSource::new(5);
        let mut ctl = ListingController::new(ListingView::Popular);
        ctl.run(&source, Intent::FirstPage).await.unwrap();
        let before = ids(&ctl);

        source.fail.store(true, Ordering::SeqCst);
        let applied = ctl.run(&source, Intent::NextPage).await.unwrap();
        assert!(matches!(applied, Applied::Failed(_)));
        assert_eq!(ids(&ctl), before);
        assert_eq!(ctl.state().page, 1);
        assert!(!ctl.state().loading);
        assert!(ctl.state().last_error.is_some());

        source.fail.store(false, Ordering::SeqCst);
        ctl.run(&source, Intent::NextPage).await.unwrap();
        assert_eq!(ctl.state().page, 2);
        assert!(ctl.state().last_error.is_none());
    }

    #[tokio::test]
    async fn mount_restores_last_search() {
        let source = FakeSource::new(1);
        let memory = MemoryStub::default();
        *memory.text.lock().unwrap() = Some("Heat".into());

        let mut ctl = ListingController::new(ListingView::Popular);
        let intent = ctl.mount(&memory).await;
        ctl.run(&source, intent).await.unwrap();
        assert_eq!(
            source.last_call(),
            Some(Call::Search {
                query: "Heat".into(),
                page: 1
            })
        );
        assert!(!ctl.state().has_more);
    }

    #[tokio::test]
    async fn mount_starts_from_blank_filters() {
        let memory = MemoryStub::default();
        let mut ctl = ListingController::new(ListingView::Popular);
        ctl.set_genre(Some(28));
        ctl.set_query("Heat");

        ctl.mount(&memory).await;
        assert_eq!(ctl.filters(), &FilterTuple::default());
        assert_eq!(ctl.route(), Route::Popular);
    }

    #[tokio::test]
    async fn session_store_backs_search_memory() {
        let pool = moviex_db::connect(":memory:").await.unwrap();
        moviex_db::migrate::run(&pool).await.unwrap();
        let store = SessionStore::new(pool);

        let mut ctl = ListingController::new(ListingView::Popular);
        ctl.submit_search("Alien", &store).await;
        assert_eq!(store.recall().await.as_deref(), Some("Alien"));

        ctl.clear_search(&store).await;
        assert_eq!(store.recall().await, None);
    }
}
