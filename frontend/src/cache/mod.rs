//! In-memory store of service data shared by every view.
//!
//! Values are kept per [`CacheKey`]. Concurrent readers of a key share one
//! fetch, values go stale after [`CacheConfig::stale_time_ms`] and are then
//! refreshed in the background, and mutations mark whole [`Family`]s dirty so
//! the next read goes back to the service.

pub mod key;

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture, Shared};

pub use key::{CacheKey, Family, Mutation};

use crate::api::ApiError;
use crate::runtime::Runtime;

type CachedValue = Rc<dyn Any>;
type FetchResult = Result<CachedValue, ApiError>;
type Fetcher = Rc<dyn Fn() -> LocalBoxFuture<'static, FetchResult>>;
type PendingFetch = Shared<LocalBoxFuture<'static, FetchResult>>;
type Listener = Rc<dyn Fn(&CacheEvent)>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheConfig {
    pub stale_time_ms: f64,
    /// Automatic retries after a failed fetch.
    pub retry: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_ms: 30_000.0,
            retry: 1,
        }
    }
}

/// Delivered to subscribers when a fetch for their key settles.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    Updated,
    Failed(ApiError),
}

#[derive(Default)]
struct Entry {
    value: Option<CachedValue>,
    fetched_at: Option<f64>,
    dirty: bool,
    /// Bumped by every invalidation; results of older fetches are dropped.
    generation: u64,
    /// Fetch for the current generation that readers can join.
    pending: Option<PendingFetch>,
    /// Most recently started fetch of any generation.
    last_fetch: Option<PendingFetch>,
    fetcher: Option<Fetcher>,
    listeners: Vec<(u64, Listener)>,
}

impl Entry {
    fn is_fresh(&self, now: f64, stale_time_ms: f64) -> bool {
        !self.dirty
            && self.value.is_some()
            && self
                .fetched_at
                .is_some_and(|fetched_at| now - fetched_at < stale_time_ms)
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<CacheKey, Entry>,
    next_listener_id: u64,
}

enum Lookup {
    Ready(CachedValue),
    Wait(PendingFetch),
}

#[derive(Clone)]
pub struct QueryCache {
    inner: Rc<RefCell<Inner>>,
    runtime: Rc<dyn Runtime>,
    config: CacheConfig,
}

impl QueryCache {
    pub fn new(runtime: Rc<dyn Runtime>, config: CacheConfig) -> Self {
        Self {
            inner: Rc::default(),
            runtime,
            config,
        }
    }

    /// Reads `key`, fetching with `fetch` when there is nothing usable cached.
    ///
    /// A fresh value is returned as is. A stale value is returned immediately
    /// while a refresh runs in the background. Missing or invalidated values
    /// are fetched, joining a fetch already in flight for the same key.
    pub async fn get<V, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<Rc<V>, ApiError>
    where
        V: 'static,
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<V, ApiError>> + 'static,
    {
        let fetcher: Fetcher = Rc::new(move || {
            let fut = fetch();
            async move { fut.await.map(|value| Rc::new(value) as CachedValue) }.boxed_local()
        });

        let value = match self.lookup(&key, fetcher) {
            Lookup::Ready(value) => value,
            Lookup::Wait(pending) => pending.await?,
        };
        downcast(&key, value)
    }

    /// Current value for `key` without fetching.
    pub fn peek<V: 'static>(&self, key: &CacheKey) -> Option<Rc<V>> {
        let value = self.inner.borrow().entries.get(key)?.value.clone()?;
        value.downcast::<V>().ok()
    }

    pub fn is_fetching(&self, key: &CacheKey) -> bool {
        self.inner
            .borrow()
            .entries
            .get(key)
            .is_some_and(|entry| entry.pending.is_some())
    }

    /// Marks every key of `family` dirty. Keys that are being watched are
    /// refetched right away.
    pub fn invalidate(&self, family: Family) {
        let mut tasks = Vec::new();
        {
            let mut inner = self.inner.borrow_mut();
            for (key, entry) in inner.entries.iter_mut() {
                if key.family() != family {
                    continue;
                }
                entry.dirty = true;
                entry.generation += 1;
                entry.pending = None;

                if entry.listeners.is_empty() {
                    continue;
                }
                if let Some(fetcher) = entry.fetcher.clone() {
                    let (_, task) = self.prepare_fetch(key, entry, fetcher);
                    tasks.push(task);
                }
            }
        }

        log::debug!(
            "Invalidated {} ({} watched keys refetching)",
            family,
            tasks.len()
        );
        for task in tasks {
            self.runtime.spawn(task);
        }
    }

    /// Forgets `key` entirely. A fetch still in flight for it settles into
    /// nothing and its listeners are dropped without being called.
    pub fn remove(&self, key: &CacheKey) {
        let removed = self.inner.borrow_mut().entries.remove(key);
        if removed.is_some() {
            log::debug!("Removed {}", key);
        }
    }

    /// Applies the invalidations a successful mutation implies.
    pub fn apply(&self, mutation: Mutation) {
        for family in mutation.invalidates() {
            self.invalidate(*family);
        }
    }

    /// Calls `listener` whenever a fetch for `key` settles, until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe(
        &self,
        key: &CacheKey,
        listener: impl Fn(&CacheEvent) + 'static,
    ) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        inner.next_listener_id += 1;
        let id = inner.next_listener_id;
        inner
            .entries
            .entry(key.clone())
            .or_default()
            .listeners
            .push((id, Rc::new(listener)));

        Subscription {
            inner: Rc::downgrade(&self.inner),
            key: key.clone(),
            id,
        }
    }

    fn lookup(&self, key: &CacheKey, fetcher: Fetcher) -> Lookup {
        let now = self.runtime.now_ms();
        let (lookup, task) = {
            let mut inner = self.inner.borrow_mut();
            let entry = inner.entries.entry(key.clone()).or_default();
            entry.fetcher = Some(Rc::clone(&fetcher));

            match entry.value.clone() {
                Some(value) if !entry.dirty => {
                    let task = if entry.is_fresh(now, self.config.stale_time_ms)
                        || entry.pending.is_some()
                    {
                        None
                    } else {
                        log::debug!("Serving stale {} while revalidating", key);
                        Some(self.prepare_fetch(key, entry, fetcher).1)
                    };
                    (Lookup::Ready(value), task)
                }
                _ => match entry.pending.clone() {
                    Some(pending) => (Lookup::Wait(pending), None),
                    None => {
                        let (pending, task) = self.prepare_fetch(key, entry, fetcher);
                        (Lookup::Wait(pending), Some(task))
                    }
                },
            }
        };

        if let Some(task) = task {
            self.runtime.spawn(task);
        }
        lookup
    }

    /// Registers a new fetch on `entry` and returns it with the task that
    /// drives it. The task must be spawned once the cache is no longer
    /// borrowed.
    fn prepare_fetch(
        &self,
        key: &CacheKey,
        entry: &mut Entry,
        fetcher: Fetcher,
    ) -> (PendingFetch, LocalBoxFuture<'static, ()>) {
        let (tx, rx) = oneshot::channel();
        let generation = entry.generation;
        let previous = entry.last_fetch.take();
        let retry = self.config.retry;
        let cache = self.clone();
        let key = key.clone();

        let task = async move {
            // One fetch per key at a time, even across invalidations.
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            let result = fetch_with_retry(&key, &fetcher, retry).await;
            cache.settle(&key, generation, &result);
            let _ = tx.send(result);
        }
        .boxed_local();

        let pending = rx
            .map(|received| {
                received.unwrap_or_else(|_| Err(ApiError::Transport("fetch was abandoned".into())))
            })
            .boxed_local()
            .shared();

        entry.pending = Some(pending.clone());
        entry.last_fetch = Some(pending.clone());
        (pending, task)
    }

    fn settle(&self, key: &CacheKey, generation: u64, result: &FetchResult) {
        let now = self.runtime.now_ms();
        let listeners: Vec<Listener> = {
            let mut inner = self.inner.borrow_mut();
            let Some(entry) = inner.entries.get_mut(key) else {
                return;
            };
            if entry.generation != generation {
                log::debug!("Dropping result for {} fetched before invalidation", key);
                return;
            }

            entry.pending = None;
            match result {
                Ok(value) => {
                    entry.value = Some(Rc::clone(value));
                    entry.fetched_at = Some(now);
                    entry.dirty = false;
                }
                // Whatever was cached before stays.
                Err(err) => log::error!("Fetching {} failed: {}", key, err),
            }
            entry.listeners.iter().map(|(_, listener)| Rc::clone(listener)).collect()
        };

        let event = match result {
            Ok(_) => CacheEvent::Updated,
            Err(err) => CacheEvent::Failed(err.clone()),
        };
        for listener in listeners {
            listener(&event);
        }
    }
}

/// Keeps a cache listener registered while alive.
pub struct Subscription {
    inner: Weak<RefCell<Inner>>,
    key: CacheKey,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut inner = inner.borrow_mut();
        if let Some(entry) = inner.entries.get_mut(&self.key) {
            entry.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

async fn fetch_with_retry(key: &CacheKey, fetcher: &Fetcher, retry: u32) -> FetchResult {
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Err(err) if attempt < retry => {
                attempt += 1;
                log::warn!(
                    "Fetching {} failed ({}), retrying {}/{}",
                    key,
                    err,
                    attempt,
                    retry
                );
            }
            result => return result,
        }
    }
}

fn downcast<V: 'static>(key: &CacheKey, value: CachedValue) -> Result<Rc<V>, ApiError> {
    value
        .downcast::<V>()
        .map_err(|_| ApiError::Decode(format!("cache entry {} holds an unexpected type", key)))
}
