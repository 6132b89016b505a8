//! Process-wide query cache with prefix invalidation.
//!
//! Entries are type-erased so one cache can hold pages of every resource;
//! readers ask for the concrete type they stored. A handle is cheap to
//! clone and every clone sees the same entries.

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::config::CacheConfig;
use crate::query::QueryKey;

const EVENT_CHANNEL_CAPACITY: usize = 64;
const INVALIDATION_HISTORY: usize = 256;

/// Broadcast whenever cached entries are marked stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationEvent {
    /// Keys belonging to this resource prefix.
    Prefix(String),
    All,
}

impl InvalidationEvent {
    pub fn affects(&self, key: &QueryKey) -> bool {
        match self {
            InvalidationEvent::Prefix(prefix) => key.matches_prefix(prefix),
            InvalidationEvent::All => true,
        }
    }
}

/// Issue-time marker of a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchStamp {
    epoch: u64,
    generation: u64,
}

/// A cached value together with its freshness at read time.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    pub value: Arc<T>,
    pub fresh: bool,
    pub age: Duration,
}

/// Metadata of one entry, for inspection and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub key: QueryKey,
    pub stale: bool,
    pub generation: u64,
    pub fetched_at: Instant,
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
    stale: bool,
    generation: u64,
}

struct CacheInner {
    entries: HashMap<QueryKey, CacheEntry>,
    next_generation: u64,
    /// Monotonic counter bumped by every invalidation.
    epoch: u64,
    /// Recent invalidations as `(epoch, event)`, oldest first.
    history: VecDeque<(u64, InvalidationEvent)>,
    last_sweep: Instant,
}

impl CacheInner {
    fn sweep(&mut self, gc_after: Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.fetched_at.elapsed() < gc_after);
        self.last_sweep = Instant::now();
        before - self.entries.len()
    }

    /// True if `key` was invalidated after `since`, or if history no longer
    /// reaches back that far.
    fn invalidated_since(&self, key: &QueryKey, since: u64) -> bool {
        if since >= self.epoch {
            return false;
        }
        match self.history.front() {
            Some((oldest, _)) if *oldest <= since + 1 => self
                .history
                .iter()
                .any(|(epoch, event)| *epoch > since && event.affects(key)),
            _ => true,
        }
    }
}

/// Shared cache handle.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<RwLock<CacheInner>>,
    events: broadcast::Sender<InvalidationEvent>,
    stale_after: Duration,
    gc_after: Duration,
}

impl QueryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_ttl(
            Duration::from_secs(config.stale_after_seconds),
            Duration::from_secs(config.gc_after_seconds),
        )
    }

    pub fn with_ttl(stale_after: Duration, gc_after: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                entries: HashMap::new(),
                next_generation: 1,
                epoch: 0,
                history: VecDeque::new(),
                last_sweep: Instant::now(),
            })),
            events,
            stale_after,
            gc_after,
        }
    }

    /// Stamp a fetch before issuing it and hand the stamp to
    /// [`insert_fetched`](Self::insert_fetched) with the response.
    pub fn begin_fetch(&self) -> FetchStamp {
        let mut inner = self.inner.write();
        let generation = inner.next_generation;
        inner.next_generation += 1;
        FetchStamp {
            epoch: inner.epoch,
            generation,
        }
    }

    /// Read an entry of type `T`, fresh or not.
    pub fn get<T: Any + Send + Sync>(&self, key: &QueryKey) -> Option<CacheRead<T>> {
        let inner = self.inner.read();
        let entry = inner.entries.get(key)?;
        let value = Arc::clone(&entry.value).downcast::<T>().ok()?;
        let age = entry.fetched_at.elapsed();
        Some(CacheRead {
            value,
            fresh: !entry.stale && age < self.stale_after,
            age,
        })
    }

    /// Read an entry only if it can be shown without refetching.
    pub fn get_fresh<T: Any + Send + Sync>(&self, key: &QueryKey) -> Option<Arc<T>> {
        self.get(key)
            .filter(|read: &CacheRead<T>| read.fresh)
            .map(|read| read.value)
    }

    /// Store a value fetched now.
    pub fn insert<T: Any + Send + Sync>(&self, key: QueryKey, value: Arc<T>) -> u64 {
        let stamp = self.begin_fetch();
        self.insert_fetched(key, value, stamp);
        stamp.generation
    }

    /// Store the response of a fetch stamped with `stamp`.
    ///
    /// Returns false without touching the entry when a fetch issued later
    /// already stored its response. If the key was invalidated while the
    /// request was in flight the value is stored already stale, so the
    /// next read fetches again.
    pub fn insert_fetched<T: Any + Send + Sync>(
        &self,
        key: QueryKey,
        value: Arc<T>,
        stamp: FetchStamp,
    ) -> bool {
        let mut inner = self.inner.write();
        if let Some(existing) = inner.entries.get(&key) {
            if existing.generation > stamp.generation {
                tracing::debug!(key = %key, "Dropping response superseded by a newer fetch");
                return false;
            }
        }

        // Expired entries are swept here at most once per GC age.
        if inner.last_sweep.elapsed() >= self.gc_after {
            let dropped = inner.sweep(self.gc_after);
            if dropped > 0 {
                tracing::debug!(dropped, "Cache entries collected");
            }
        }

        let stale = inner.invalidated_since(&key, stamp.epoch);
        if stale {
            tracing::debug!(key = %key, "Storing response that was invalidated in flight");
        }

        inner.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
                stale,
                generation: stamp.generation,
            },
        );
        true
    }

    /// Mark every key under `prefix` stale. Returns how many were marked.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        self.invalidate(InvalidationEvent::Prefix(prefix.to_string()))
    }

    pub fn invalidate_all(&self) -> usize {
        self.invalidate(InvalidationEvent::All)
    }

    fn invalidate(&self, event: InvalidationEvent) -> usize {
        let marked = {
            let mut inner = self.inner.write();
            inner.epoch += 1;
            let epoch = inner.epoch;
            inner.history.push_back((epoch, event.clone()));
            while inner.history.len() > INVALIDATION_HISTORY {
                inner.history.pop_front();
            }

            let mut marked = 0;
            for (key, entry) in inner.entries.iter_mut() {
                if event.affects(key) && !entry.stale {
                    entry.stale = true;
                    marked += 1;
                }
            }
            marked
        };

        tracing::debug!(?event, marked, "Cache invalidated");
        // No receivers is fine: nothing is mounted.
        let _ = self.events.send(event);
        marked
    }

    /// Drop entries older than the GC age now. Returns how many were
    /// dropped. Inserts also sweep on their own once per GC age.
    pub fn collect_garbage(&self) -> usize {
        self.inner.write().sweep(self.gc_after)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InvalidationEvent> {
        self.events.subscribe()
    }

    /// Entry metadata sorted by key.
    pub fn snapshot(&self) -> Vec<EntrySnapshot> {
        let inner = self.inner.read();
        let mut entries: Vec<EntrySnapshot> = inner
            .entries
            .iter()
            .map(|(key, entry)| EntrySnapshot {
                key: key.clone(),
                stale: entry.stale,
                generation: entry.generation,
                fetched_at: entry.fetched_at,
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}
