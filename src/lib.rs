//! List-view state synchronization against a paginated REST API.
//!
//! Screens hold a [`ListViewController`](ui::list::ListViewController)
//! whose filter state maps to a deterministic [`QueryKey`](query::QueryKey).
//! Reads go through a shared [`QueryCache`](cache::QueryCache); writes go
//! through a [`MutationDispatcher`](mutation::MutationDispatcher) that
//! invalidates the affected keys on success.

pub mod cache;
pub mod client;
pub mod config;
pub mod logging;
pub mod mutation;
pub mod query;
pub mod query_client;
pub mod resources;
pub mod session;
pub mod ui;

pub use query_client::QueryClient;
