//! Query identities, filter state and response envelopes.

mod filter;
mod key;
mod page;

pub use filter::{FilterCondition, FilterOp, FilterPatch, FilterState, Sort, SortOrder};
pub use key::QueryKey;
pub use page::{ListPage, PageMeta};
