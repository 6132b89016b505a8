//! The shared root every screen talks through.
//!
//! A [`QueryClient`] bundles one cache, one remote transport and the
//! session. Controllers and dispatchers created from the same client share
//! all three, so a write through one is visible to every list that reads
//! the same resource.

use std::sync::Arc;

use serde_json::Value;

use crate::cache::QueryCache;
use crate::client::{decode, record_path, ApiError, HttpRemote, RemoteClient, WriteMethod};
use crate::config::{Config, ListDefaults};
use crate::mutation::MutationDispatcher;
use crate::query::{FilterState, ListPage, QueryKey};
use crate::resources::Resource;
use crate::session::Session;
use crate::ui::list::ListViewController;

struct ClientInner {
    cache: QueryCache,
    remote: Arc<dyn RemoteClient>,
    session: Session,
    list: ListDefaults,
}

#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<ClientInner>,
}

impl QueryClient {
    pub fn new(
        remote: Arc<dyn RemoteClient>,
        cache: QueryCache,
        session: Session,
        list: ListDefaults,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                cache,
                remote,
                session,
                list,
            }),
        }
    }

    /// Wire an HTTP-backed client from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let session = Session::from_config(&config.auth);
        let remote = HttpRemote::new(&config.api, session.clone())?;
        Ok(Self::new(
            Arc::new(remote),
            QueryCache::new(&config.cache),
            session,
            config.list.clone(),
        ))
    }

    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub fn list_defaults(&self) -> &ListDefaults {
        &self.inner.list
    }

    /// New list-view controller for `resource`.
    pub fn list_view<R: Resource>(&self, resource: R) -> ListViewController<R> {
        ListViewController::new(self.clone(), resource)
    }

    pub fn mutations(&self) -> MutationDispatcher {
        MutationDispatcher::new(self.clone())
    }

    /// Fetch one page, served from the cache when a fresh entry exists
    /// and `force` is false.
    pub async fn fetch_list<R: Resource>(
        &self,
        resource: &R,
        filters: &FilterState,
        force: bool,
    ) -> Result<Arc<ListPage<R::Record>>, ApiError> {
        let descriptor = resource.descriptor();
        if let Some(field) = filters.missing_scope(&descriptor.required_scope).first() {
            return Err(ApiError::MissingScope {
                resource: descriptor.name.clone(),
                field: field.to_string(),
            });
        }

        let key = QueryKey::list(&descriptor.name, filters);
        if !force {
            if let Some(page) = self.cache().get_fresh::<ListPage<R::Record>>(&key) {
                tracing::trace!(key = %key, "Cache hit");
                return Ok(page);
            }
        }

        let stamp = self.cache().begin_fetch();
        let json = self.get_json(&descriptor.path, &filters.query_pairs()).await?;
        let page: Arc<ListPage<R::Record>> = Arc::new(decode(&descriptor.name, json)?);
        self.cache().insert_fetched(key, Arc::clone(&page), stamp);
        Ok(page)
    }

    /// Fetch a single record by id through the cache.
    pub async fn fetch_one<R: Resource>(
        &self,
        resource: &R,
        id: &str,
        force: bool,
    ) -> Result<Arc<R::Record>, ApiError> {
        let descriptor = resource.descriptor();
        let key = QueryKey::detail(&descriptor.name, id);
        if !force {
            if let Some(record) = self.cache().get_fresh::<R::Record>(&key) {
                return Ok(record);
            }
        }

        let stamp = self.cache().begin_fetch();
        let path = record_path(&descriptor.path, id)?;
        let json = self.get_json(&path, &[]).await?;
        let record: Arc<R::Record> = Arc::new(decode(&descriptor.name, json)?);
        self.cache().insert_fetched(key, Arc::clone(&record), stamp);
        Ok(record)
    }

    pub(crate) async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value, ApiError> {
        self.inner
            .remote
            .get(path, query)
            .await
            .map_err(|e| self.observe(e))
    }

    pub(crate) async fn send_json(
        &self,
        method: WriteMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, ApiError> {
        self.inner
            .remote
            .send(method, path, body)
            .await
            .map_err(|e| self.observe(e))
    }

    /// Global handling shared by every call: an authorization failure
    /// ends the local session and marks everything read under it stale.
    fn observe(&self, err: ApiError) -> ApiError {
        if self.inner.session.handle_error(&err) {
            let marked = self.inner.cache.invalidate_all();
            tracing::warn!(error = %err, marked, "Authorization rejected, login required");
        }
        err
    }
}
