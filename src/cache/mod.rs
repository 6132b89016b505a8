//! Shared query cache.

mod store;

pub use store::{CacheRead, EntrySnapshot, FetchStamp, InvalidationEvent, QueryCache};
