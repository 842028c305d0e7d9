//! Page-level views, each composed from one [`PagedController`].

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::controller::{
    Applied, EndpointSource, FetchTicket, PageState, PagedController, ViewStatus,
};
use crate::error::{ApiError, ControllerError};
use crate::labels::days_until;
use crate::media::{
    filter, MediaFilter, MediaSummary, MediaType, TimeWindow, TrendingScope, UpcomingTab,
};
use crate::tmdb::{Endpoint, TmdbClient};

fn search_endpoint(query: &String) -> Endpoint {
    Endpoint::SearchMulti {
        query: query.clone(),
    }
}

fn trending_endpoint(window: &TimeWindow) -> Endpoint {
    Endpoint::Trending {
        scope: TrendingScope::All,
        window: *window,
    }
}

fn upcoming_endpoint(tab: &UpcomingTab) -> Endpoint {
    match tab {
        UpcomingTab::Movies => Endpoint::UpcomingMovies,
        UpcomingTab::Tv => Endpoint::OnTheAir,
    }
}

async fn run_if_some<S: crate::controller::PageSource>(
    controller: &mut PagedController<S>,
    ticket: Option<FetchTicket<S::Params>>,
) -> Result<Option<Applied>, ControllerError> {
    match ticket {
        Some(ticket) => controller.run(ticket).await.map(Some),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStatus {
    EmptyQuery,
    Loading,
    Ready,
    NoResults,
    Error(String),
}

impl SearchStatus {
    pub fn message(&self) -> Option<&str> {
        match self {
            SearchStatus::EmptyQuery => Some(
                "Type a movie or TV show name in the search bar above to get started.",
            ),
            SearchStatus::NoResults => {
                Some("Try a different search term or change the filter.")
            }
            SearchStatus::Error(msg) => Some(msg.as_str()),
            SearchStatus::Loading | SearchStatus::Ready => None,
        }
    }
}

/// Multi-type search driven by the `?q=` query.
pub struct SearchPage {
    controller: PagedController<EndpointSource<String>>,
    filter: MediaFilter,
}

impl SearchPage {
    pub fn new(client: TmdbClient) -> Self {
        Self {
            controller: PagedController::new(EndpointSource::new(client, search_endpoint)),
            filter: MediaFilter::All,
        }
    }

    pub fn query(&self) -> &str {
        self.controller.params().map(String::as_str).unwrap_or("")
    }

    /// An empty query issues no request and clears the results.
    pub fn set_query(&mut self, query: &str) -> Option<FetchTicket<String>> {
        let query = query.trim();
        if query.is_empty() {
            self.controller.clear();
            return None;
        }
        self.controller.change_params(query.to_string())
    }

    pub async fn search(&mut self, query: &str) -> Result<Option<Applied>, ControllerError> {
        let ticket = self.set_query(query);
        run_if_some(&mut self.controller, ticket).await
    }

    pub async fn load_more(&mut self) -> Result<Applied, ControllerError> {
        self.controller.next_page().await
    }

    pub fn set_filter(&mut self, filter: MediaFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> MediaFilter {
        self.filter
    }

    pub fn results(&self) -> Vec<MediaSummary> {
        filter(self.controller.items(), self.filter)
    }

    pub fn total_results(&self) -> u32 {
        self.controller.state().total_results
    }

    pub fn can_load_more(&self) -> bool {
        self.controller.state().can_load_more()
    }

    pub fn state(&self) -> &PageState<MediaSummary> {
        self.controller.state()
    }

    pub fn status(&self) -> SearchStatus {
        if self.controller.params().is_none() {
            return SearchStatus::EmptyQuery;
        }
        match &self.controller.state().status {
            ViewStatus::Idle | ViewStatus::Loading => SearchStatus::Loading,
            ViewStatus::Error(msg) if self.controller.items().is_empty() => {
                SearchStatus::Error(msg.clone())
            }
            _ if self.results().is_empty() => SearchStatus::NoResults,
            _ => SearchStatus::Ready,
        }
    }
}

/// Trending movies and TV for one time window, with a display filter.
pub struct TrendingPage {
    controller: PagedController<EndpointSource<TimeWindow>>,
    filter: MediaFilter,
}

impl TrendingPage {
    pub fn new(client: TmdbClient) -> Self {
        Self {
            controller: PagedController::new(EndpointSource::new(client, trending_endpoint)),
            filter: MediaFilter::All,
        }
    }

    pub fn window(&self) -> Option<TimeWindow> {
        self.controller.params().copied()
    }

    pub fn set_window(&mut self, window: TimeWindow) -> Option<FetchTicket<TimeWindow>> {
        self.controller.change_params(window)
    }

    pub async fn load(&mut self, window: TimeWindow) -> Result<Option<Applied>, ControllerError> {
        let ticket = self.set_window(window);
        run_if_some(&mut self.controller, ticket).await
    }

    pub async fn load_more(&mut self) -> Result<Applied, ControllerError> {
        self.controller.next_page().await
    }

    /// Changing the filter never refetches.
    pub fn set_filter(&mut self, filter: MediaFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> MediaFilter {
        self.filter
    }

    /// Filtered items with their 1-based rank in the filtered list.
    pub fn ranked(&self) -> Vec<(usize, MediaSummary)> {
        filter(self.controller.items(), self.filter)
            .into_iter()
            .enumerate()
            .map(|(i, item)| (i + 1, item))
            .collect()
    }

    pub fn state(&self) -> &PageState<MediaSummary> {
        self.controller.state()
    }
}

/// Upcoming movies or on-the-air TV, with the first entry featured.
pub struct UpcomingPage {
    controller: PagedController<EndpointSource<UpcomingTab>>,
}

impl UpcomingPage {
    pub fn new(client: TmdbClient) -> Self {
        Self {
            controller: PagedController::new(EndpointSource::new(client, upcoming_endpoint)),
        }
    }

    pub fn tab(&self) -> Option<UpcomingTab> {
        self.controller.params().copied()
    }

    pub fn set_tab(&mut self, tab: UpcomingTab) -> Option<FetchTicket<UpcomingTab>> {
        self.controller.change_params(tab)
    }

    pub async fn load(&mut self, tab: UpcomingTab) -> Result<Option<Applied>, ControllerError> {
        let ticket = self.set_tab(tab);
        run_if_some(&mut self.controller, ticket).await
    }

    pub async fn load_more(&mut self) -> Result<Applied, ControllerError> {
        self.controller.next_page().await
    }

    pub fn items(&self) -> &[MediaSummary] {
        self.controller.items()
    }

    pub fn featured(&self) -> Option<&MediaSummary> {
        self.controller.items().first()
    }

    pub fn featured_countdown(&self, today: NaiveDate) -> Option<String> {
        self.featured()
            .and_then(|item| days_until(item.release_date.as_deref(), today))
    }

    pub fn state(&self) -> &PageState<MediaSummary> {
        self.controller.state()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeCategory {
    OnTheAir,
    NowPlaying,
    TrendingToday,
    PopularThisWeek,
    DiscoverTv,
}

impl HomeCategory {
    pub const ALL: [HomeCategory; 5] = [
        HomeCategory::OnTheAir,
        HomeCategory::NowPlaying,
        HomeCategory::TrendingToday,
        HomeCategory::PopularThisWeek,
        HomeCategory::DiscoverTv,
    ];

    pub fn title(self) -> &'static str {
        match self {
            HomeCategory::OnTheAir => "On The Air",
            HomeCategory::NowPlaying => "Now Playing",
            HomeCategory::TrendingToday => "Trending Today",
            HomeCategory::PopularThisWeek => "Popular This Week",
            HomeCategory::DiscoverTv => "Discover TV",
        }
    }

    pub fn endpoint(self) -> Endpoint {
        match self {
            HomeCategory::OnTheAir => Endpoint::OnTheAir,
            HomeCategory::NowPlaying => Endpoint::NowPlaying,
            HomeCategory::TrendingToday => Endpoint::Trending {
                scope: TrendingScope::Movie,
                window: TimeWindow::Day,
            },
            HomeCategory::PopularThisWeek => Endpoint::Trending {
                scope: TrendingScope::Movie,
                window: TimeWindow::Week,
            },
            HomeCategory::DiscoverTv => Endpoint::Discover(MediaType::Tv),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentSection {
    pub category: HomeCategory,
    pub items: Vec<MediaSummary>,
    pub error: Option<String>,
}

impl ContentSection {
    pub fn title(&self) -> &'static str {
        self.category.title()
    }
}

/// Loads every home section in turn. A failing section is logged and left
/// empty; a missing credential aborts before any request.
pub async fn load_home_sections(client: &TmdbClient) -> Result<Vec<ContentSection>, ApiError> {
    let mut sections = Vec::with_capacity(HomeCategory::ALL.len());
    for category in HomeCategory::ALL {
        let section = match client.fetch_page(&category.endpoint(), 1).await {
            Ok(page) => ContentSection {
                category,
                items: page.results,
                error: None,
            },
            Err(ApiError::MissingCredential) => return Err(ApiError::MissingCredential),
            Err(err) => {
                warn!(section = category.title(), "home section failed: {}", err);
                ContentSection {
                    category,
                    items: Vec::new(),
                    error: Some(err.to_string()),
                }
            }
        };
        sections.push(section);
    }
    info!(
        loaded = sections.iter().filter(|s| s.error.is_none()).count(),
        "home sections loaded"
    );
    Ok(sections)
}

/// First on-the-air show with a backdrop, for the banner.
pub fn featured(sections: &[ContentSection]) -> Option<&MediaSummary> {
    sections
        .iter()
        .find(|s| s.category == HomeCategory::OnTheAir)?
        .items
        .iter()
        .find(|item| item.backdrop_path.is_some())
}
