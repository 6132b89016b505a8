//! List-view controller against the in-memory API.

mod common;

use std::sync::Arc;

use common::{client_with, invoice, invoices, wait_until, InMemoryApi};
use erpview::cache::QueryCache;
use erpview::client::ErrorKind;
use erpview::config::ListDefaults;
use erpview::query::{FilterCondition, FilterPatch, QueryKey, Sort};
use erpview::resources::{CustomerTransactions, Invoices};
use erpview::session::Session;
use erpview::ui::list::ListStatus;
use erpview::QueryClient;
use serde_json::json;

fn seeded(n: usize) -> Arc<InMemoryApi> {
    let api = Arc::new(InMemoryApi::new());
    api.seed("invoices", invoices(n));
    api
}

#[tokio::test]
async fn test_initialize_loads_first_page() {
    let api = seeded(45);
    let client = client_with(api.clone());
    let view = client.list_view(Invoices);

    let state = view.initialize(view.default_filters()).await;

    assert_eq!(state.status, ListStatus::Ready);
    assert_eq!(state.records().len(), 20);
    let page = state.page.as_ref().unwrap();
    assert_eq!(page.meta.total_items, 45);
    assert_eq!(page.meta.total_pages, 3);
    // Newest first by default.
    assert_eq!(state.records()[0].id, "inv-45");

    let calls = api.get_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "invoices");
    assert_eq!(calls[0].param("page"), Some("1"));
    assert_eq!(calls[0].param("limit"), Some("20"));
    assert_eq!(calls[0].param("sortBy"), Some("createdAt:DESC"));
}

#[tokio::test]
async fn test_key_identifies_criteria() {
    let api = seeded(5);
    let client = client_with(api);
    let view = client.list_view(Invoices);

    let state = view
        .initialize(view.default_filters().with_search("acme"))
        .await;
    assert_eq!(
        state.key.as_ref().unwrap().as_str(),
        "invoices|page=1&limit=20&sortBy=createdAt:DESC&search=acme"
    );

    let state = view
        .update_filter(FilterPatch::new().filter("status", FilterCondition::eq("PAID")))
        .await;
    assert_eq!(
        state.key.as_ref().unwrap().as_str(),
        "invoices|page=1&limit=20&sortBy=createdAt:DESC&search=acme&filter=status:$eq:PAID"
    );
}

#[tokio::test]
async fn test_missing_scope_issues_no_request() {
    let api = Arc::new(InMemoryApi::new());
    api.seed(
        "customers/transactions",
        vec![
            json!({"id": "t1", "customerId": "c-1", "type": "PAYMENT", "amount": 50, "createdAt": "2026-01-01"}),
            json!({"id": "t2", "customerId": "c-2", "type": "REFUND", "amount": 10, "createdAt": "2026-01-02"}),
        ],
    );
    let client = client_with(api.clone());
    let view = client.list_view(CustomerTransactions);

    let state = view.initialize(view.default_filters()).await;
    assert_eq!(state.status, ListStatus::Idle);
    assert_eq!(state.missing_scope, vec!["customerId".to_string()]);
    assert!(state.key.is_none());
    assert!(api.calls().is_empty());

    // Refetching a parked view stays parked.
    let state = view.refetch().await;
    assert_eq!(state.status, ListStatus::Idle);
    assert!(api.calls().is_empty());

    let state = view
        .update_filter(FilterPatch::new().scope("customerId", "c-1"))
        .await;
    assert_eq!(state.status, ListStatus::Ready);
    assert!(state.missing_scope.is_empty());
    assert_eq!(state.records().len(), 1);
    assert_eq!(state.records()[0].id, "t1");

    let calls = api.get_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "customers/transactions");
    assert_eq!(calls[0].param("customerId"), Some("c-1"));
}

#[tokio::test]
async fn test_fresh_cache_is_served_without_network() {
    let api = seeded(5);
    let client = client_with(api.clone());

    let first = client.list_view(Invoices);
    first.initialize(first.default_filters()).await;
    assert_eq!(api.get_calls().len(), 1);

    // A second screen with the same criteria reads the shared cache.
    let second = client.list_view(Invoices);
    let state = second.initialize(second.default_filters()).await;
    assert_eq!(state.status, ListStatus::Ready);
    assert_eq!(state.records().len(), 5);
    assert_eq!(api.get_calls().len(), 1);

    // An explicit refetch always goes to the network.
    second.refetch().await;
    assert_eq!(api.get_calls().len(), 2);
}

#[tokio::test]
async fn test_identical_patch_is_a_noop() {
    let api = seeded(5);
    let client = client_with(api.clone());
    let view = client.list_view(Invoices);

    view.initialize(view.default_filters().with_search("acme"))
        .await;
    let before = view.state();

    let after = view.update_filter(FilterPatch::new().search("acme")).await;
    assert_eq!(after, before);
    assert_eq!(after.fetches_issued(), before.fetches_issued());
    assert_eq!(api.get_calls().len(), 1);
}

#[tokio::test]
async fn test_criteria_change_resets_page() {
    let api = seeded(45);
    let client = client_with(api.clone());
    let view = client.list_view(Invoices);

    view.initialize(view.default_filters()).await;
    let state = view.go_to_page(3).await;
    assert_eq!(state.filters.page, 3);
    assert_eq!(state.records().len(), 5);

    let state = view
        .update_filter(FilterPatch::new().sort(Sort::asc("createdAt")))
        .await;
    assert_eq!(state.filters.page, 1);
    assert_eq!(state.records()[0].id, "inv-1");

    // An explicit page in the same patch wins over the reset.
    let state = view
        .update_filter(FilterPatch::new().limit(10).page(2))
        .await;
    assert_eq!(state.filters.page, 2);
    assert_eq!(state.filters.limit, 10);
    assert_eq!(state.records()[0].id, "inv-11");
}

#[tokio::test]
async fn test_paging_helpers_clamp_to_known_range() {
    let api = seeded(45);
    let client = client_with(api.clone());
    let view = client.list_view(Invoices);

    view.initialize(view.default_filters()).await;
    let state = view.prev_page().await;
    assert_eq!(state.filters.page, 1);
    assert_eq!(api.get_calls().len(), 1);

    let state = view.next_page().await;
    assert_eq!(state.filters.page, 2);
    assert!(state.page.as_ref().unwrap().has_prev_page());

    let state = view.go_to_page(99).await;
    assert_eq!(state.filters.page, 3);
    assert!(!state.page.as_ref().unwrap().has_next_page());

    let state = view.next_page().await;
    assert_eq!(state.filters.page, 3);
    assert_eq!(api.get_calls().len(), 3);
}

#[tokio::test]
async fn test_limit_is_capped() {
    let api = seeded(5);
    let client = client_with(api.clone());
    let view = client.list_view(Invoices);

    view.initialize(view.default_filters()).await;
    let state = view.update_filter(FilterPatch::new().limit(5000)).await;
    assert_eq!(state.filters.limit, client.list_defaults().max_limit);
    assert_eq!(
        api.get_calls().last().unwrap().param("limit"),
        Some(client.list_defaults().max_limit.to_string().as_str())
    );
}

#[tokio::test]
async fn test_late_response_is_discarded() {
    let api = Arc::new(InMemoryApi::new());
    api.seed(
        "invoices",
        vec![
            invoice("inv-1", "INV-0001", "acme", "2026-01-01T00:00:00Z"),
            invoice("inv-2", "INV-0002", "globex", "2026-01-02T00:00:00Z"),
        ],
    );
    let client = client_with(api.clone());
    let view = client.list_view(Invoices);

    let release = api.hold_next_call();
    let slow = {
        let view = view.clone();
        tokio::spawn(async move { view.initialize(view.default_filters()).await })
    };
    assert!(wait_until(|| api.get_calls().len() == 1).await);
    assert!(view.state().is_loading());

    let state = view.update_filter(FilterPatch::new().search("globex")).await;
    assert_eq!(state.status, ListStatus::Ready);
    assert_eq!(state.records().len(), 1);
    assert_eq!(state.records()[0].id, "inv-2");

    release.send(()).unwrap();
    slow.await.unwrap();

    let state = view.state();
    assert_eq!(state.filters.search.as_deref(), Some("globex"));
    assert_eq!(state.records().len(), 1);
    assert_eq!(state.records()[0].id, "inv-2");
    assert_eq!(state.status, ListStatus::Ready);
}

#[tokio::test]
async fn test_error_is_distinct_from_empty() {
    let api = Arc::new(InMemoryApi::new());
    let client = client_with(api.clone());
    let view = client.list_view(Invoices);

    let state = view.initialize(view.default_filters()).await;
    assert_eq!(state.status, ListStatus::Empty);
    assert!(state.error().is_none());

    api.fail_next(500, r#"{"message":"database unavailable"}"#);
    let state = view.refetch().await;
    let err = state.error().expect("error state");
    assert_eq!(err.status, Some(500));
    assert_eq!(err.kind, ErrorKind::Unexpected);
    assert!(err.message.contains("database unavailable"));
    assert!(state.records().is_empty());

    // Recoverable with a refetch.
    let state = view.refetch().await;
    assert_eq!(state.status, ListStatus::Empty);
}

#[tokio::test]
async fn test_subscribers_see_loading_then_ready() {
    let api = seeded(3);
    let client = client_with(api);
    let view = client.list_view(Invoices);
    let mut updates = view.subscribe();

    view.initialize(view.default_filters()).await;

    assert!(updates.has_changed().unwrap());
    let latest = updates.borrow_and_update().clone();
    assert_eq!(latest.status, ListStatus::Ready);
    assert_eq!(
        latest.key,
        Some(QueryKey::list("invoices", &view.default_filters()))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_published_state_matches_current_state() {
    let api = seeded(30);
    let client = client_with(api);
    let view = client.list_view(Invoices);
    let updates = view.subscribe();
    view.initialize(view.default_filters()).await;

    for round in 0..20 {
        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let view = view.clone();
                tokio::spawn(async move {
                    view.update_filter(FilterPatch::new().search(format!("inv-00{}{}", round % 3, i)))
                        .await;
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let published = updates.borrow().clone();
        assert_eq!(published, view.state(), "round {}", round);
    }
}

#[tokio::test]
async fn test_zero_max_limit_still_fetches() {
    let api = seeded(5);
    let client = QueryClient::new(
        api.clone(),
        QueryCache::default(),
        Session::default(),
        ListDefaults {
            default_limit: 20,
            max_limit: 0,
        },
    );
    let view = client.list_view(Invoices);

    let state = view.initialize(view.default_filters()).await;
    assert_eq!(state.filters.limit, 1);
    assert_eq!(state.status, ListStatus::Ready);
    assert_eq!(state.records().len(), 1);
    assert_eq!(api.get_calls()[0].param("limit"), Some("1"));
}
