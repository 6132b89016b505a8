//! Filter, sort and pagination state for a list view.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Sort direction, rendered the way the API expects (`ASC` / `DESC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}', expected ASC or DESC", other)),
        }
    }
}

/// Sort field and direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }

    /// Query-string form: `field:DIR`.
    pub fn to_param(&self) -> String {
        format!("{}:{}", self.field, self.order)
    }
}

impl Default for Sort {
    fn default() -> Self {
        Sort::desc("createdAt")
    }
}

impl FromStr for Sort {
    type Err = String;

    /// Parses `field` or `field:DIR`. A bare field sorts descending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, order) = match s.rsplit_once(':') {
            Some((field, dir)) => (field, dir.parse()?),
            None => (s, SortOrder::Desc),
        };
        if field.trim().is_empty() {
            return Err("sort field must not be empty".to_string());
        }
        Ok(Sort {
            field: field.trim().to_string(),
            order,
        })
    }
}

/// Filter operators understood by the API (`filter=field:$op:value`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    Not,
    In,
    Gt,
    Gte,
    Lt,
    Lte,
    Btw,
    ILike,
    Null,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "$eq",
            FilterOp::Not => "$not",
            FilterOp::In => "$in",
            FilterOp::Gt => "$gt",
            FilterOp::Gte => "$gte",
            FilterOp::Lt => "$lt",
            FilterOp::Lte => "$lte",
            FilterOp::Btw => "$btw",
            FilterOp::ILike => "$ilike",
            FilterOp::Null => "$null",
        }
    }
}

impl FromStr for FilterOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim_start_matches('$').to_ascii_lowercase().as_str() {
            "eq" => FilterOp::Eq,
            "not" => FilterOp::Not,
            "in" => FilterOp::In,
            "gt" => FilterOp::Gt,
            "gte" => FilterOp::Gte,
            "lt" => FilterOp::Lt,
            "lte" => FilterOp::Lte,
            "btw" => FilterOp::Btw,
            "ilike" => FilterOp::ILike,
            "null" => FilterOp::Null,
            other => return Err(format!("unknown filter operator '{}'", other)),
        };
        Ok(op)
    }
}

/// One filter condition applied to a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterCondition {
    pub op: FilterOp,
    pub value: String,
}

impl FilterCondition {
    pub fn new(op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            op,
            value: value.into(),
        }
    }

    pub fn eq(value: impl Into<String>) -> Self {
        Self::new(FilterOp::Eq, value)
    }

    pub fn any_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        Self::new(FilterOp::In, joined)
    }

    pub fn is_null() -> Self {
        Self::new(FilterOp::Null, "")
    }

    /// Query-string form for `field`: `field:$op:value`, or `field:$null`.
    pub fn to_param(&self, field: &str) -> String {
        if self.op == FilterOp::Null {
            format!("{}:{}", field, self.op.as_str())
        } else {
            format!("{}:{}:{}", field, self.op.as_str(), self.value)
        }
    }
}

/// Complete parameter set of one list view.
///
/// Values are kept normalized (blank search and blank scope values are
/// dropped) so that two states compare equal exactly when they would
/// send the same request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub page: u32,
    pub limit: u32,
    pub sort: Sort,
    pub search: Option<String>,
    /// Parent-scoping parameters such as `customerId`.
    pub scope: BTreeMap<String, String>,
    pub filters: BTreeMap<String, FilterCondition>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            sort: Sort::default(),
            search: None,
            scope: BTreeMap::new(),
            filters: BTreeMap::new(),
        }
    }
}

impl FilterState {
    pub fn new(limit: u32, sort: Sort) -> Self {
        Self {
            limit: limit.max(1),
            sort,
            ..Self::default()
        }
    }

    pub fn with_scope(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.scope.insert(field.into(), value.trim().to_string());
        }
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, condition: FilterCondition) -> Self {
        self.filters.insert(field.into(), condition);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = normalize(Some(search.into()));
        self
    }

    /// Required scope fields that have no value.
    pub fn missing_scope<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .map(String::as_str)
            .filter(|field| !self.scope.contains_key(*field))
            .collect()
    }

    /// Merge a patch into this state.
    ///
    /// When sort, search, scope or filters change and the patch does not
    /// name a page, the page goes back to 1.
    pub fn apply(&self, patch: &FilterPatch) -> FilterState {
        let mut next = self.clone();

        if let Some(limit) = patch.limit {
            next.limit = limit.max(1);
        }
        if let Some(sort) = &patch.sort {
            next.sort = sort.clone();
        }
        if let Some(search) = &patch.search {
            next.search = normalize(search.clone());
        }
        for (field, value) in &patch.scope {
            match normalize(value.clone()) {
                Some(value) => {
                    next.scope.insert(field.clone(), value);
                }
                None => {
                    next.scope.remove(field);
                }
            }
        }
        for (field, condition) in &patch.filters {
            match condition {
                Some(condition) => {
                    next.filters.insert(field.clone(), condition.clone());
                }
                None => {
                    next.filters.remove(field);
                }
            }
        }

        let criteria_changed = next.sort != self.sort
            || next.search != self.search
            || next.scope != self.scope
            || next.filters != self.filters;

        match patch.page {
            Some(page) => next.page = page.max(1),
            None if criteria_changed => next.page = 1,
            None => {}
        }

        next
    }

    /// Request parameters in their canonical order.
    ///
    /// `page`, `limit`, `sortBy`, scope fields (by name), `search`, then
    /// one `filter` entry per field (by name).
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(4 + self.scope.len() + self.filters.len());
        pairs.push(("page".to_string(), self.page.to_string()));
        pairs.push(("limit".to_string(), self.limit.to_string()));
        pairs.push(("sortBy".to_string(), self.sort.to_param()));
        for (field, value) in &self.scope {
            pairs.push((field.clone(), value.clone()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        for (field, condition) in &self.filters {
            pairs.push(("filter".to_string(), condition.to_param(field)));
        }
        pairs
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Partial update to a [`FilterState`].
///
/// `None` leaves a field untouched. For `search`, `scope` and `filters`
/// an inner `None` removes the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<Sort>,
    pub search: Option<Option<String>>,
    pub scope: BTreeMap<String, Option<String>>,
    pub filters: BTreeMap<String, Option<FilterCondition>>,
}

impl FilterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(Some(search.into()));
        self
    }

    pub fn clear_search(mut self) -> Self {
        self.search = Some(None);
        self
    }

    pub fn scope(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.scope.insert(field.into(), Some(value.into()));
        self
    }

    pub fn remove_scope(mut self, field: impl Into<String>) -> Self {
        self.scope.insert(field.into(), None);
        self
    }

    pub fn filter(mut self, field: impl Into<String>, condition: FilterCondition) -> Self {
        self.filters.insert(field.into(), Some(condition));
        self
    }

    pub fn remove_filter(mut self, field: impl Into<String>) -> Self {
        self.filters.insert(field.into(), None);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
