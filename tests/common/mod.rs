//! Shared test utilities and fake backends.

#![allow(dead_code, unused_imports)]

pub mod in_memory;
pub mod mock_backend;

use std::sync::Arc;
use std::time::Duration;

use erpview::cache::QueryCache;
use erpview::client::RemoteClient;
use erpview::config::{ListDefaults, SecureString};
use erpview::session::Session;
use erpview::QueryClient;
use serde_json::{json, Value};

pub use in_memory::InMemoryApi;

/// Client over `remote` with a long stale time, so reads are served from
/// cache unless something invalidates them.
pub fn client_with(remote: Arc<dyn RemoteClient>) -> QueryClient {
    QueryClient::new(
        remote,
        QueryCache::with_ttl(Duration::from_secs(300), Duration::from_secs(600)),
        Session::new(Some(SecureString::new("test-token".to_string()))),
        ListDefaults::default(),
    )
}

pub fn invoice(id: &str, number: &str, customer: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "invoiceNumber": number,
        "customerId": customer,
        "customerName": format!("{} Corp", customer),
        "status": "SENT",
        "currency": "USD",
        "total": 100.0,
        "createdAt": created_at,
    })
}

/// Invoices `inv-1..=inv-n`, each created one day after the previous.
pub fn invoices(n: usize) -> Vec<Value> {
    (1..=n)
        .map(|i| {
            invoice(
                &format!("inv-{}", i),
                &format!("INV-{:04}", i),
                if i % 2 == 0 { "acme" } else { "globex" },
                &format!("2026-01-{:02}T00:00:00Z", i),
            )
        })
        .collect()
}

/// Poll `condition` until it holds or a second passes.
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_secs(1) {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
