//! Writes against the API followed by cache invalidation.
//!
//! A successful write marks every cached query of the written resource
//! (and of its declared dependents) stale; nothing is merged into cached
//! pages. A failed write leaves the cache untouched.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::client::{decode, record_path, ApiError, WriteMethod};
use crate::query_client::QueryClient;
use crate::resources::{Resource, ResourceDescriptor};

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome<T> {
    /// Record echoed by the API, if the response had a body.
    pub record: Option<T>,
    /// Prefixes that were invalidated.
    pub invalidated: Vec<String>,
}

#[derive(Clone)]
pub struct MutationDispatcher {
    client: QueryClient,
    pending: Arc<AtomicUsize>,
}

impl MutationDispatcher {
    pub fn new(client: QueryClient) -> Self {
        Self {
            client,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Writes currently in flight through this dispatcher.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub async fn create<R, B>(
        &self,
        resource: &R,
        body: &B,
    ) -> Result<MutationOutcome<R::Record>, ApiError>
    where
        R: Resource,
        B: Serialize + ?Sized,
    {
        let descriptor = resource.descriptor();
        let body = to_body(body)?;
        let path = descriptor.path.clone();
        self.perform::<R>(&descriptor, WriteMethod::Post, &path, Some(body))
            .await
    }

    pub async fn update<R, B>(
        &self,
        resource: &R,
        id: &str,
        body: &B,
    ) -> Result<MutationOutcome<R::Record>, ApiError>
    where
        R: Resource,
        B: Serialize + ?Sized,
    {
        let descriptor = resource.descriptor();
        let body = to_body(body)?;
        let path = record_path(&descriptor.path, id)?;
        self.perform::<R>(&descriptor, WriteMethod::Put, &path, Some(body))
            .await
    }

    pub async fn delete<R: Resource>(
        &self,
        resource: &R,
        id: &str,
    ) -> Result<MutationOutcome<R::Record>, ApiError> {
        let descriptor = resource.descriptor();
        let path = record_path(&descriptor.path, id)?;
        self.perform::<R>(&descriptor, WriteMethod::Delete, &path, None)
            .await
    }

    async fn perform<R: Resource>(
        &self,
        descriptor: &ResourceDescriptor,
        method: WriteMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<MutationOutcome<R::Record>, ApiError> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        let pending = scopeguard::guard(Arc::clone(&self.pending), |pending| {
            pending.fetch_sub(1, Ordering::SeqCst);
        });
        let result = self.client.send_json(method, path, body).await;
        drop(pending);

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(resource = %descriptor.name, ?method, error = %err, "Mutation failed");
                return Err(err);
            }
        };

        // The write happened, so invalidate before decoding the echo.
        let invalidated = descriptor.invalidation_prefixes();
        let cache = self.client.cache();
        let marked: usize = invalidated.iter().map(|p| cache.invalidate_prefix(p)).sum();
        tracing::info!(
            resource = %descriptor.name,
            ?method,
            prefixes = ?invalidated,
            marked,
            "Mutation succeeded"
        );

        // Delete responses carry no record worth decoding. The write is
        // committed either way, so an unreadable echo is not an error.
        let record = match response {
            Some(json) if method != WriteMethod::Delete && !json.is_null() => {
                match decode::<R::Record>(&descriptor.name, json) {
                    Ok(record) => Some(record),
                    Err(err) => {
                        tracing::warn!(resource = %descriptor.name, ?method, error = %err, "Mutation response not decodable");
                        None
                    }
                }
            }
            _ => None,
        };

        Ok(MutationOutcome {
            record,
            invalidated,
        })
    }
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::Unexpected(format!("Failed to encode request body: {}", e)))
}
