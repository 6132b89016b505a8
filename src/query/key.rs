//! Deterministic cache identities.

use std::fmt;

use super::filter::FilterState;

const LIST_SEPARATOR: char = '|';
const DETAIL_SEPARATOR: char = '/';

/// Identity of one cached query.
///
/// List queries render as `resource|k=v&k=v` with parameters in the
/// canonical order of [`FilterState::query_pairs`]; detail queries render
/// as `resource/id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn list(resource: &str, filters: &FilterState) -> Self {
        let params = filters
            .query_pairs()
            .iter()
            .map(|(name, value)| format!("{}={}", escape(name), escape(value)))
            .collect::<Vec<_>>()
            .join("&");
        QueryKey(format!("{}{}{}", resource, LIST_SEPARATOR, params))
    }

    pub fn detail(resource: &str, id: &str) -> Self {
        QueryKey(format!("{}{}{}", resource, DETAIL_SEPARATOR, escape(id)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resource name this key belongs to.
    pub fn resource(&self) -> &str {
        self.0
            .split([LIST_SEPARATOR, DETAIL_SEPARATOR])
            .next()
            .unwrap_or(&self.0)
    }

    /// True when this key belongs to `prefix`.
    ///
    /// `invoices` matches `invoices`, `invoices|..` and `invoices/..` but
    /// not `invoices-archive|..`.
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        match self.0.strip_prefix(prefix) {
            Some(rest) => {
                rest.is_empty()
                    || rest.starts_with(LIST_SEPARATOR)
                    || rest.starts_with(DETAIL_SEPARATOR)
            }
            None => false,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Percent-escape the characters that delimit key segments.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '=' => out.push_str("%3D"),
            '|' => out.push_str("%7C"),
            '/' => out.push_str("%2F"),
            other => out.push(other),
        }
    }
    out
}
