//! Fetch-on-param-change controller with page accumulation.
//!
//! Every view owns one [`PagedController`]. Changing the driving parameters
//! resets the paginated state in one step and issues a ticket; a response is
//! applied only if its ticket is still the latest one issued.

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{ApiError, ControllerError};
use crate::media::{MediaSummary, Paginated};
use crate::tmdb::{Endpoint, TmdbClient};

#[async_trait]
pub trait PageSource: Send + Sync {
    type Params: Clone + PartialEq + fmt::Debug + Send + Sync;
    type Item: Clone + Send;

    async fn fetch_page(
        &self,
        params: &Self::Params,
        page: u32,
    ) -> Result<Paginated<Self::Item>, ApiError>;
}

/// A [`PageSource`] over one endpoint template of the metadata API.
pub struct EndpointSource<P> {
    client: TmdbClient,
    template: fn(&P) -> Endpoint,
}

impl<P> EndpointSource<P> {
    pub fn new(client: TmdbClient, template: fn(&P) -> Endpoint) -> Self {
        Self { client, template }
    }
}

#[async_trait]
impl<P> PageSource for EndpointSource<P>
where
    P: Clone + PartialEq + fmt::Debug + Send + Sync,
{
    type Params = P;
    type Item = MediaSummary;

    async fn fetch_page(&self, params: &P, page: u32) -> Result<Paginated<MediaSummary>, ApiError> {
        let endpoint = (self.template)(params);
        self.client.fetch_page(&endpoint, page).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error(String),
    NotFound,
}

impl ViewStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewStatus::Loading)
    }

    /// Terminal status of a single-entity view. Any reply the server answered
    /// with a failure (non-2xx or `success: false`) is `NotFound`.
    pub(crate) fn from_error(err: &ApiError) -> Self {
        match err {
            ApiError::NotFound
            | ApiError::Status { .. }
            | ApiError::Unauthorized
            | ApiError::RateLimited => ViewStatus::NotFound,
            other => ViewStatus::Error(other.to_string()),
        }
    }
}

/// Outcome of handing a response to a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Current,
    Stale,
}

/// Single slot holding the id of the latest accepted request.
#[derive(Debug, Default)]
pub(crate) struct RequestSlot {
    issued: u64,
    in_flight: Option<u64>,
}

impl RequestSlot {
    pub(crate) fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.in_flight = Some(self.issued);
        self.issued
    }

    pub(crate) fn accept(&mut self, id: u64) -> bool {
        if self.in_flight == Some(id) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    /// Invalidates whatever is in flight.
    pub(crate) fn cancel(&mut self) {
        self.issued += 1;
        self.in_flight = None;
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket<P> {
    id: u64,
    params: P,
    page: u32,
}

impl<P> FetchTicket<P> {
    pub fn params(&self) -> &P {
        &self.params
    }

    pub fn page(&self) -> u32 {
        self.page
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageState<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_results: u32,
    pub status: ViewStatus,
}

impl<T> Default for PageState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current_page: 0,
            total_pages: 0,
            total_results: 0,
            status: ViewStatus::Idle,
        }
    }
}

impl<T> PageState<T> {
    pub fn can_load_more(&self) -> bool {
        self.current_page >= 1
            && self.current_page < self.total_pages
            && !self.status.is_loading()
    }
}

pub struct PagedController<S: PageSource> {
    source: S,
    params: Option<S::Params>,
    state: PageState<S::Item>,
    slot: RequestSlot,
}

impl<S: PageSource> PagedController<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            params: None,
            state: PageState::default(),
            slot: RequestSlot::default(),
        }
    }

    pub fn params(&self) -> Option<&S::Params> {
        self.params.as_ref()
    }

    pub fn state(&self) -> &PageState<S::Item> {
        &self.state
    }

    pub fn items(&self) -> &[S::Item] {
        &self.state.items
    }

    /// Starts a new parameter epoch: items, page counters and totals are
    /// cleared together before the first page is requested.
    pub fn set_params(&mut self, params: S::Params) -> FetchTicket<S::Params> {
        self.state = PageState {
            status: ViewStatus::Loading,
            ..PageState::default()
        };
        self.params = Some(params.clone());
        FetchTicket {
            id: self.slot.issue(),
            params,
            page: 1,
        }
    }

    /// Like [`set_params`](Self::set_params), but `None` when `params` already
    /// drive this controller.
    pub fn change_params(&mut self, params: S::Params) -> Option<FetchTicket<S::Params>> {
        if self.params.as_ref() == Some(&params) {
            return None;
        }
        Some(self.set_params(params))
    }

    /// Drops the parameters and any in-flight request without fetching.
    pub fn clear(&mut self) {
        self.state = PageState::default();
        self.params = None;
        self.slot.cancel();
    }

    pub fn load_more(&mut self) -> Result<FetchTicket<S::Params>, ControllerError> {
        let Some(params) = self.params.clone() else {
            return Err(ControllerError::NoMoreResults);
        };
        if self.slot.is_busy() {
            return Err(ControllerError::RequestInFlight);
        }
        if self.state.current_page >= self.state.total_pages {
            return Err(ControllerError::NoMoreResults);
        }

        self.state.status = ViewStatus::Loading;
        Ok(FetchTicket {
            id: self.slot.issue(),
            params,
            page: self.state.current_page + 1,
        })
    }

    pub async fn fetch(
        &self,
        ticket: &FetchTicket<S::Params>,
    ) -> Result<Paginated<S::Item>, ApiError> {
        self.source.fetch_page(&ticket.params, ticket.page).await
    }

    /// Page 1 replaces the list, later pages append to it. A failed fetch
    /// leaves the items as they were.
    pub fn apply(
        &mut self,
        ticket: FetchTicket<S::Params>,
        result: Result<Paginated<S::Item>, ApiError>,
    ) -> Applied {
        if !self.slot.accept(ticket.id) {
            debug!(params = ?ticket.params, page = ticket.page, "discarding stale response");
            return Applied::Stale;
        }

        match result {
            Ok(page) => {
                if ticket.page <= 1 {
                    self.state.items = page.results;
                } else {
                    self.state.items.extend(page.results);
                }
                self.state.current_page = ticket.page;
                self.state.total_pages = page.total_pages;
                self.state.total_results = page.total_results;
                self.state.status = ViewStatus::Ready;
            }
            Err(err) => {
                warn!(params = ?ticket.params, page = ticket.page, "fetch failed: {}", err);
                self.state.status = ViewStatus::Error(err.to_string());
            }
        }
        Applied::Current
    }

    /// Fetches and applies `ticket`. Failures are absorbed into the view
    /// state, except a missing credential which is returned.
    pub async fn run(
        &mut self,
        ticket: FetchTicket<S::Params>,
    ) -> Result<Applied, ControllerError> {
        let result = self.fetch(&ticket).await;
        let missing_credential = matches!(result, Err(ApiError::MissingCredential));
        let applied = self.apply(ticket, result);
        if missing_credential && applied == Applied::Current {
            return Err(ApiError::MissingCredential.into());
        }
        Ok(applied)
    }

    pub async fn refresh(&mut self, params: S::Params) -> Result<Applied, ControllerError> {
        let ticket = self.set_params(params);
        self.run(ticket).await
    }

    pub async fn next_page(&mut self) -> Result<Applied, ControllerError> {
        let ticket = self.load_more()?;
        self.run(ticket).await
    }
}
