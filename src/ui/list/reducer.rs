use std::marker::PhantomData;

use crate::query::QueryKey;
use crate::ui::list::intent::ListIntent;
use crate::ui::list::state::{FetchTicket, ListStatus, ListViewState};
use crate::ui::mvi::Reducer;

pub struct ListReducer<T>(PhantomData<T>);

impl<T> Reducer for ListReducer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    type State = ListViewState<T>;
    type Intent = ListIntent<T>;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            ListIntent::Initialize {
                resource,
                required_scope,
                filters,
            } => {
                let state = ListViewState {
                    resource,
                    required_scope,
                    initialized: true,
                    filters,
                    issued: state.issued,
                    ..ListViewState::default()
                };
                schedule(state, false)
            }
            ListIntent::UpdateFilter(patch) => {
                if !state.initialized {
                    return state;
                }
                let filters = state.filters.apply(&patch);
                if filters == state.filters {
                    return state;
                }
                schedule(ListViewState { filters, ..state }, false)
            }
            ListIntent::Refetch => {
                if !state.initialized {
                    return state;
                }
                schedule(state, true)
            }
            ListIntent::Loaded { ticket, page } => {
                if !is_current(&state, &ticket) {
                    return state;
                }
                let status = if page.is_empty() {
                    ListStatus::Empty
                } else {
                    ListStatus::Ready
                };
                ListViewState {
                    status,
                    page: Some(page),
                    in_flight: None,
                    ..state
                }
            }
            ListIntent::Failed { ticket, error } => {
                if !is_current(&state, &ticket) {
                    return state;
                }
                ListViewState {
                    status: ListStatus::Error(error),
                    in_flight: None,
                    ..state
                }
            }
        }
    }
}

fn is_current<T>(state: &ListViewState<T>, ticket: &FetchTicket) -> bool {
    state
        .in_flight
        .as_ref()
        .is_some_and(|current| current.seq == ticket.seq)
}

/// Issue a fetch for the current filters, or park the view when a
/// required scope field is missing.
fn schedule<T>(mut state: ListViewState<T>, force: bool) -> ListViewState<T> {
    let missing: Vec<String> = state
        .filters
        .missing_scope(&state.required_scope)
        .into_iter()
        .map(str::to_string)
        .collect();

    if !missing.is_empty() {
        state.key = None;
        state.status = ListStatus::Idle;
        state.page = None;
        state.in_flight = None;
        state.missing_scope = missing;
        return state;
    }

    let key = QueryKey::list(&state.resource, &state.filters);
    state.issued += 1;
    state.in_flight = Some(FetchTicket {
        seq: state.issued,
        key: key.clone(),
        filters: state.filters.clone(),
        force,
    });
    state.key = Some(key);
    state.status = ListStatus::Loading;
    state.missing_scope.clear();
    state
}
