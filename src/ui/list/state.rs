use std::sync::Arc;

use crate::client::ListError;
use crate::query::{FilterState, ListPage, QueryKey};
use crate::ui::mvi::UiState;

/// What the list area should show.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ListStatus {
    /// Not initialized, or waiting for a required scope field.
    #[default]
    Idle,
    Loading,
    Ready,
    /// The fetch succeeded with zero records.
    Empty,
    /// The last fetch failed. Recoverable with `refetch`.
    Error(ListError),
}

/// A fetch the reducer asked for.
///
/// Responses are matched back by `seq`; anything that doesn't match the
/// ticket currently in flight is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub seq: u64,
    pub key: QueryKey,
    pub filters: FilterState,
    /// Skip the freshness check and always hit the network.
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListViewState<T> {
    pub resource: String,
    pub required_scope: Vec<String>,
    pub initialized: bool,
    pub filters: FilterState,
    /// Cache identity of `filters`; `None` while fetching is disabled.
    pub key: Option<QueryKey>,
    pub status: ListStatus,
    /// Last page received. Kept while a reload is in flight.
    pub page: Option<Arc<ListPage<T>>>,
    pub in_flight: Option<FetchTicket>,
    /// Required scope fields currently absent.
    pub missing_scope: Vec<String>,
    pub(crate) issued: u64,
}

impl<T> Default for ListViewState<T> {
    fn default() -> Self {
        Self {
            resource: String::new(),
            required_scope: Vec::new(),
            initialized: false,
            filters: FilterState::default(),
            key: None,
            status: ListStatus::Idle,
            page: None,
            in_flight: None,
            missing_scope: Vec::new(),
            issued: 0,
        }
    }
}

impl<T> UiState for ListViewState<T> where T: Clone + PartialEq + Send + Sync + 'static {}

impl<T> ListViewState<T> {
    pub fn is_loading(&self) -> bool {
        self.status == ListStatus::Loading
    }

    pub fn error(&self) -> Option<&ListError> {
        match &self.status {
            ListStatus::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Records to render; empty while nothing has loaded.
    pub fn records(&self) -> &[T] {
        self.page.as_deref().map(|p| p.data.as_slice()).unwrap_or(&[])
    }

    /// Number of fetch tickets issued so far.
    pub fn fetches_issued(&self) -> u64 {
        self.issued
    }
}
