use std::sync::Arc;

use crate::client::ListError;
use crate::query::{FilterPatch, FilterState, ListPage};
use crate::ui::list::state::FetchTicket;
use crate::ui::mvi::Intent;

#[derive(Debug, Clone)]
pub enum ListIntent<T> {
    Initialize {
        resource: String,
        required_scope: Vec<String>,
        filters: FilterState,
    },
    UpdateFilter(FilterPatch),
    /// Reload the current parameters from the network.
    Refetch,
    Loaded {
        ticket: FetchTicket,
        page: Arc<ListPage<T>>,
    },
    Failed {
        ticket: FetchTicket,
        error: ListError,
    },
}

impl<T: Send + Sync + 'static> Intent for ListIntent<T> {}
