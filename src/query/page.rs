//! Response envelopes returned by list endpoints.

use serde::{Deserialize, Serialize};

/// Pagination metadata of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub current_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub items_per_page: u32,
}

/// One page of records: `{data: [...], meta: {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> ListPage<T> {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn has_next_page(&self) -> bool {
        self.meta.current_page < self.meta.total_pages
    }

    pub fn has_prev_page(&self) -> bool {
        self.meta.current_page > 1
    }
}
