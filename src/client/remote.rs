use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::timeout;

use crate::client::error::ApiError;
use crate::config::ApiConfig;
use crate::session::Session;

/// HTTP verb of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMethod {
    Post,
    Put,
    Delete,
}

impl WriteMethod {
    fn as_method(self) -> Method {
        match self {
            WriteMethod::Post => Method::POST,
            WriteMethod::Put => Method::PUT,
            WriteMethod::Delete => Method::DELETE,
        }
    }
}

/// Transport to the REST API.
///
/// Paths are relative to the API base (e.g. `invoices` or `invoices/42`).
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// GET `path` with query parameters, returning the decoded JSON body.
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, ApiError>;

    /// Perform a write. Returns `None` when the response has no body.
    async fn send(
        &self,
        method: WriteMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, ApiError>;
}

/// Decode a JSON payload into a typed value, tagging failures with `resource`.
pub fn decode<T: DeserializeOwned>(resource: &str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|source| ApiError::Decode {
        resource: resource.to_string(),
        source,
    })
}

/// Path of one record: `collection/{id}` with `id` percent-encoded as a
/// single segment, so ids containing `/`, `?` or `#` stay inside it.
pub fn record_path(collection: &str, id: &str) -> Result<String, ApiError> {
    let mut url = Url::parse("http://records.invalid/")
        .map_err(|e| ApiError::Unexpected(format!("Failed to build record path: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::Unexpected("Failed to build record path".to_string()))?
        .pop_if_empty()
        .extend(collection.split('/').filter(|s| !s.is_empty()))
        .push(id);
    Ok(url.path().trim_start_matches('/').to_string())
}

/// [`RemoteClient`] over `reqwest`.
pub struct HttpRemote {
    client: Client,
    base_url: String,
    session: Session,
    request_timeout: Duration,
}

impl HttpRemote {
    pub fn new(api: &ApiConfig, session: Session) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(api.connect_timeout_seconds as u64))
            .user_agent(api.user_agent.clone())
            .build()
            .map_err(|e| ApiError::Unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            session,
            request_timeout: Duration::from_secs(api.timeout_seconds as u64),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");

        // Read at request time so a cleared session stops sending the token.
        if let Some(token) = self.session.token() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token.expose()));
        }
        builder
    }

    async fn execute(&self, builder: RequestBuilder, url: &str) -> Result<Option<Value>, ApiError> {
        let result = timeout(self.request_timeout, async {
            let response = builder.send().await.map_err(|e| ApiError::Connection {
                url: url.to_string(),
                source: e,
            })?;

            let status = response.status();
            let text = response.text().await.map_err(|e| ApiError::Connection {
                url: url.to_string(),
                source: e,
            })?;

            if !status.is_success() {
                return Err(ApiError::from_status(status.as_u16(), &text));
            }

            if text.trim().is_empty() {
                return Ok(None);
            }

            serde_json::from_str(&text)
                .map(Some)
                .map_err(|source| ApiError::Decode {
                    resource: url.to_string(),
                    source,
                })
        })
        .await;

        match result {
            Ok(outcome) => outcome,
            Err(_) => Err(ApiError::Timeout {
                url: url.to_string(),
                duration: self.request_timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl RemoteClient for HttpRemote {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, ApiError> {
        let url = self.url(path);
        tracing::debug!(%url, params = query.len(), "GET");

        let builder = self.request(Method::GET, &url).query(query);
        self.execute(builder, &url)
            .await?
            .ok_or_else(|| ApiError::Unexpected(format!("Empty response body from '{}'", url)))
    }

    async fn send(
        &self,
        method: WriteMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, ApiError> {
        let url = self.url(path);
        tracing::debug!(%url, ?method, "Write");

        let mut builder = self.request(method.as_method(), &url);
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        self.execute(builder, &url).await
    }
}
