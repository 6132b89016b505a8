//! Drives one list screen: owns its state, performs the fetches the
//! reducer asks for, and publishes every new state to subscribers.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::ListError;
use crate::query::{FilterPatch, FilterState};
use crate::query_client::QueryClient;
use crate::resources::{Resource, ResourceDescriptor};
use crate::ui::list::intent::ListIntent;
use crate::ui::list::reducer::ListReducer;
use crate::ui::list::state::{FetchTicket, ListViewState};
use crate::ui::mvi::Reducer;

type State<R> = ListViewState<<R as Resource>::Record>;

struct ControllerInner<R: Resource> {
    client: QueryClient,
    resource: R,
    descriptor: ResourceDescriptor,
    state: Mutex<State<R>>,
    updates: watch::Sender<State<R>>,
}

/// List-view controller for resource `R`.
///
/// Cloning yields another handle to the same screen state.
pub struct ListViewController<R: Resource> {
    inner: Arc<ControllerInner<R>>,
}

impl<R: Resource> Clone for ListViewController<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Resource> ListViewController<R> {
    pub fn new(client: QueryClient, resource: R) -> Self {
        let descriptor = resource.descriptor();
        let (updates, _) = watch::channel(ListViewState::default());
        Self {
            inner: Arc::new(ControllerInner {
                client,
                resource,
                descriptor,
                state: Mutex::new(ListViewState::default()),
                updates,
            }),
        }
    }

    pub fn resource(&self) -> &ResourceDescriptor {
        &self.inner.descriptor
    }

    /// Current state snapshot.
    pub fn state(&self) -> State<R> {
        self.inner.state.lock().clone()
    }

    /// Receiver that sees every published state.
    ///
    /// Clone the borrowed value before calling back into the controller;
    /// a live `borrow()` blocks the next publish.
    pub fn subscribe(&self) -> watch::Receiver<State<R>> {
        self.inner.updates.subscribe()
    }

    /// Page 1 with the configured page size and the resource's default sort.
    pub fn default_filters(&self) -> FilterState {
        FilterState::new(
            self.inner.client.list_defaults().default_limit,
            self.inner.descriptor.default_sort.clone(),
        )
    }

    /// Establish the filter state and load the first page.
    ///
    /// Callers pass any required scope (e.g. `customerId`) inside
    /// `filters`; without it nothing is fetched.
    pub async fn initialize(&self, mut filters: FilterState) -> State<R> {
        filters.limit = self.cap_limit(filters.limit);
        filters.page = filters.page.max(1);
        self.dispatch(ListIntent::Initialize {
            resource: self.inner.descriptor.name.clone(),
            required_scope: self.inner.descriptor.required_scope.clone(),
            filters,
        })
        .await
    }

    /// Merge `patch` into the filters and load the resulting page.
    pub async fn update_filter(&self, mut patch: FilterPatch) -> State<R> {
        if let Some(limit) = patch.limit {
            patch.limit = Some(self.cap_limit(limit));
        }
        self.dispatch(ListIntent::UpdateFilter(patch)).await
    }

    /// Reload the current filters from the network.
    pub async fn refetch(&self) -> State<R> {
        self.dispatch(ListIntent::Refetch).await
    }

    pub async fn next_page(&self) -> State<R> {
        let page = self.state().filters.page;
        self.go_to_page(page.saturating_add(1)).await
    }

    pub async fn prev_page(&self) -> State<R> {
        let page = self.state().filters.page;
        self.go_to_page(page.saturating_sub(1)).await
    }

    /// Jump to `page`, clamped to the known page range.
    pub async fn go_to_page(&self, page: u32) -> State<R> {
        let total_pages = self
            .state()
            .page
            .as_ref()
            .map(|p| p.meta.total_pages)
            .unwrap_or(0);
        let page = if total_pages > 0 {
            page.clamp(1, total_pages)
        } else {
            page.max(1)
        };
        self.update_filter(FilterPatch::new().page(page)).await
    }

    /// Refetch whenever the cache invalidates this view's current key.
    ///
    /// The task holds only a weak reference and ends once every handle to
    /// the controller is dropped (at the next event) or the cache closes.
    pub fn spawn_invalidation_listener(&self) -> JoinHandle<()> {
        let mut events = self.inner.client.cache().subscribe();
        let weak: Weak<ControllerInner<R>> = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            loop {
                let affected = match events.recv().await {
                    Ok(event) => {
                        let Some(inner) = weak.upgrade() else { break };
                        let key = inner.state.lock().key.clone();
                        key.is_some_and(|key| event.affects(&key))
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Invalidation listener lagged, refetching");
                        true
                    }
                    Err(RecvError::Closed) => break,
                };

                if affected {
                    let Some(inner) = weak.upgrade() else { break };
                    ListViewController { inner }.refetch().await;
                }
            }
        })
    }

    fn cap_limit(&self, limit: u32) -> u32 {
        limit.clamp(1, self.inner.client.list_defaults().max_limit.max(1))
    }

    async fn dispatch(&self, intent: ListIntent<R::Record>) -> State<R> {
        if let Some(ticket) = self.apply(intent) {
            self.run(ticket).await;
        }
        self.state()
    }

    /// Reduce under the lock and publish. Returns the ticket if the
    /// reducer issued a new fetch.
    fn apply(&self, intent: ListIntent<R::Record>) -> Option<FetchTicket> {
        let mut state = self.inner.state.lock();
        let issued_before = state.issued;
        let next = ListReducer::<R::Record>::reduce(state.clone(), intent);
        if next == *state {
            return None;
        }

        let ticket = if next.issued != issued_before {
            next.in_flight.clone()
        } else {
            None
        };
        *state = next.clone();
        // Publish under the lock so subscribers see states in reduce order.
        self.inner.updates.send_replace(next);
        drop(state);
        ticket
    }

    async fn run(&self, ticket: FetchTicket) {
        let resource = &self.inner.descriptor.name;
        tracing::debug!(%resource, key = %ticket.key, seq = ticket.seq, force = ticket.force, "Fetching list");

        let result = self
            .inner
            .client
            .fetch_list(&self.inner.resource, &ticket.filters, ticket.force)
            .await;

        let intent = match result {
            Ok(page) => ListIntent::Loaded { ticket, page },
            Err(err) => {
                tracing::warn!(%resource, error = %err, "List fetch failed");
                ListIntent::Failed {
                    ticket,
                    error: ListError::from(&err),
                }
            }
        };
        self.apply(intent);
    }
}
