//! In-memory stand-in for the REST API.
//!
//! Stores JSON records per collection path and answers list requests with
//! the same envelope, paging, search and `$eq` filtering the real API uses.

#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use erpview::client::{ApiError, RemoteClient, WriteMethod};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// One call as seen by the fake.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Call {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct ApiState {
    collections: HashMap<String, Vec<Value>>,
    calls: Vec<Call>,
    failures: VecDeque<(u16, String)>,
    holds: VecDeque<oneshot::Receiver<()>>,
    next_id: u64,
}

#[derive(Default)]
pub struct InMemoryApi {
    state: Mutex<ApiState>,
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, path: &str, records: Vec<Value>) {
        let mut state = self.state.lock();
        state.next_id += records.len() as u64;
        state.collections.insert(path.to_string(), records);
    }

    pub fn records(&self, path: &str) -> Vec<Value> {
        self.state
            .lock()
            .collections
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn get_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == "GET")
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Make the next call fail with `status` and `body`.
    pub fn fail_next(&self, status: u16, body: &str) {
        self.state
            .lock()
            .failures
            .push_back((status, body.to_string()));
    }

    /// Hold the next call, read or write, until the returned sender fires
    /// or is dropped.
    pub fn hold_next_call(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().holds.push_back(rx);
        tx
    }

    fn record_call(&self, method: &str, path: &str, query: &[(String, String)]) -> Option<ApiError> {
        let mut state = self.state.lock();
        state.calls.push(Call {
            method: method.to_string(),
            path: path.to_string(),
            query: query.to_vec(),
        });
        state
            .failures
            .pop_front()
            .map(|(status, body)| ApiError::from_status(status, &body))
    }

    async fn wait_if_held(&self) {
        let hold = self.state.lock().holds.pop_front();
        if let Some(hold) = hold {
            let _ = hold.await;
        }
    }

    fn split_detail(&self, path: &str) -> Option<(String, String)> {
        let state = self.state.lock();
        if state.collections.contains_key(path) {
            return None;
        }
        let (collection, id) = path.rsplit_once('/')?;
        Some((collection.to_string(), id.to_string()))
    }

    fn list(&self, path: &str, query: &[(String, String)]) -> Value {
        let records = self.records(path);
        let mut page = 1u32;
        let mut limit = 20u32;
        let mut sort: Option<(String, bool)> = None;
        let mut search: Option<String> = None;
        let mut eq_filters: Vec<(String, String)> = Vec::new();

        for (name, value) in query {
            match name.as_str() {
                "page" => page = value.parse().unwrap_or(1),
                "limit" => limit = value.parse().unwrap_or(20),
                "sortBy" => {
                    let (field, dir) = value.rsplit_once(':').unwrap_or((value.as_str(), "DESC"));
                    sort = Some((field.to_string(), dir == "ASC"));
                }
                "search" => search = Some(value.to_lowercase()),
                "filter" => {
                    let mut parts = value.splitn(3, ':');
                    let field = parts.next().unwrap_or_default();
                    let op = parts.next().unwrap_or_default();
                    let operand = parts.next().unwrap_or_default();
                    if op == "$eq" {
                        eq_filters.push((field.to_string(), operand.to_string()));
                    }
                }
                other => eq_filters.push((other.to_string(), value.clone())),
            }
        }

        let mut matching: Vec<Value> = records
            .into_iter()
            .filter(|r| {
                eq_filters
                    .iter()
                    .all(|(field, expected)| field_text(r, field).as_deref() == Some(expected.as_str()))
            })
            .filter(|r| match &search {
                Some(needle) => r
                    .as_object()
                    .map(|o| {
                        o.values()
                            .filter_map(|v| v.as_str())
                            .any(|s| s.to_lowercase().contains(needle))
                    })
                    .unwrap_or(false),
                None => true,
            })
            .collect();

        if let Some((field, ascending)) = sort {
            matching.sort_by(|a, b| {
                let ord = compare(a.get(&field), b.get(&field));
                if ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        let total = matching.len() as u64;
        let limit = limit.max(1);
        let total_pages = total.div_ceil(limit as u64) as u32;
        let data: Vec<Value> = matching
            .into_iter()
            .skip(((page.max(1) - 1) * limit) as usize)
            .take(limit as usize)
            .collect();

        json!({
            "data": data,
            "meta": {
                "currentPage": page,
                "totalItems": total,
                "totalPages": total_pages,
                "itemsPerPage": limit,
            }
        })
    }
}

fn field_text(record: &Value, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl RemoteClient for InMemoryApi {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, ApiError> {
        let failure = self.record_call("GET", path, query);
        self.wait_if_held().await;
        if let Some(err) = failure {
            return Err(err);
        }

        match self.split_detail(path) {
            Some((collection, id)) => self
                .records(&collection)
                .into_iter()
                .find(|r| r.get("id").and_then(Value::as_str) == Some(id.as_str()))
                .ok_or_else(|| ApiError::from_status(404, r#"{"message":"Not found"}"#)),
            None => Ok(self.list(path, query)),
        }
    }

    async fn send(
        &self,
        method: WriteMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, ApiError> {
        let verb = match method {
            WriteMethod::Post => "POST",
            WriteMethod::Put => "PUT",
            WriteMethod::Delete => "DELETE",
        };
        let failure = self.record_call(verb, path, &[]);
        self.wait_if_held().await;
        if let Some(err) = failure {
            return Err(err);
        }

        let mut state = self.state.lock();
        match method {
            WriteMethod::Post => {
                state.next_id += 1;
                let id = format!("rec-{}", state.next_id);
                let mut record = body.unwrap_or_else(|| json!({}));
                record["id"] = json!(id);
                state
                    .collections
                    .entry(path.to_string())
                    .or_default()
                    .push(record.clone());
                Ok(Some(record))
            }
            WriteMethod::Put => {
                let (collection, id) = path
                    .rsplit_once('/')
                    .ok_or_else(|| ApiError::from_status(404, ""))?;
                let records = state.collections.entry(collection.to_string()).or_default();
                let existing = records
                    .iter_mut()
                    .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
                    .ok_or_else(|| ApiError::from_status(404, r#"{"message":"Not found"}"#))?;
                if let (Some(target), Some(Value::Object(patch))) =
                    (existing.as_object_mut(), body)
                {
                    for (k, v) in patch {
                        target.insert(k, v);
                    }
                }
                Ok(Some(existing.clone()))
            }
            WriteMethod::Delete => {
                let (collection, id) = path
                    .rsplit_once('/')
                    .ok_or_else(|| ApiError::from_status(404, ""))?;
                let records = state.collections.entry(collection.to_string()).or_default();
                let before = records.len();
                records.retain(|r| r.get("id").and_then(Value::as_str) != Some(id));
                if records.len() == before {
                    return Err(ApiError::from_status(404, r#"{"message":"Not found"}"#));
                }
                Ok(None)
            }
        }
    }
}
