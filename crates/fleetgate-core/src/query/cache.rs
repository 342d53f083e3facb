// ── Query cache ──
//
// Keyed by endpoint + canonical arguments. Identical concurrent requests
// share one in-flight fetch; results stay cached while subscribed and for
// a grace period afterwards. Fetches run as spawned tasks, so they settle
// into the cache even when every subscriber has gone.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use fleetgate_api::Transport;
use futures_util::FutureExt;
use tokio::sync::watch;
use tracing::{debug, trace};

use super::endpoint::{MutationEndpoint, QueryEndpoint};
use super::entry::{CacheEntry, ErasedData, FetchFuture, QueryState, QueryStatus};
use super::key::CacheKey;
use super::tag::Tag;
use crate::error::CoreError;
use crate::store::DataStore;

/// Shared query cache. Cheaply cloneable.
#[derive(Clone)]
pub struct QueryCache {
    pub(super) inner: Arc<CacheInner>,
}

pub(super) struct CacheInner {
    executor: Arc<dyn Transport>,
    store: Arc<DataStore>,
    pub(super) entries: DashMap<CacheKey, CacheEntry>,
    keep_unused_for: Duration,
    next_fetch_id: AtomicU64,
}

impl QueryCache {
    /// `executor` is normally an [`AuthInterceptor`](fleetgate_api::AuthInterceptor).
    pub fn new(
        executor: Arc<dyn Transport>,
        store: Arc<DataStore>,
        keep_unused_for: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                executor,
                store,
                entries: DashMap::new(),
                keep_unused_for,
                next_fetch_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Register interest in `endpoint(arg)`.
    ///
    /// Starts a fetch when the entry is new, stale or failed and nothing is
    /// in flight; otherwise joins the existing entry. Must be called from
    /// within a tokio runtime.
    pub fn subscribe<E: QueryEndpoint>(
        &self,
        endpoint: Arc<E>,
        arg: E::Arg,
    ) -> Result<Subscription<E>, CoreError> {
        let key = CacheKey::new(endpoint.name(), &arg)?;
        let changes = {
            let mut entry = self
                .inner
                .entries
                .entry(key.clone())
                .or_insert_with(CacheEntry::new);
            entry.subscribers += 1;
            entry.release_epoch += 1;
            if entry.needs_fetch() {
                self.inner.start_fetch(&mut entry, &key, &endpoint, &arg);
            }
            trace!(%key, subscribers = entry.subscribers, "subscribed");
            entry.watch()
        };
        Ok(Subscription {
            cache: self.clone(),
            key,
            endpoint,
            arg,
            changes,
        })
    }

    /// One-shot read: subscribe, wait for the settled result, unsubscribe.
    pub async fn query<E: QueryEndpoint>(
        &self,
        endpoint: Arc<E>,
        arg: E::Arg,
    ) -> Result<Arc<E::Output>, CoreError> {
        let subscription = self.subscribe(endpoint, arg)?;
        subscription.result().await.into_result()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Run a write and invalidate the tags it declares.
    ///
    /// Mutations are never deduplicated: two calls send two requests.
    pub async fn mutate<M: MutationEndpoint>(
        &self,
        endpoint: &M,
        arg: M::Arg,
    ) -> Result<M::Output, CoreError> {
        debug!(endpoint = %endpoint.name(), "running mutation");
        let raw = self
            .inner
            .executor
            .execute(endpoint.build_request(&arg))
            .await?;
        let output = endpoint.transform_response(raw)?;
        let tags = endpoint.invalidates_tags(&output, &arg);
        self.invalidate(&tags);
        Ok(output)
    }

    /// Bind a mutation endpoint for repeated triggering.
    pub fn mutation<M: MutationEndpoint>(&self, endpoint: M) -> MutationTrigger<M> {
        MutationTrigger {
            cache: self.clone(),
            endpoint: Arc::new(endpoint),
        }
    }

    // ── Inspection / lifecycle ───────────────────────────────────────

    pub fn status(&self, key: &CacheKey) -> Option<QueryStatus> {
        self.inner.entries.get(key).map(|entry| entry.status)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Forget every cached result (logout).
    ///
    /// Entries with live subscribers are kept but reset to `Idle`; results
    /// of fetches started before the reset are discarded.
    pub fn reset(&self) {
        let inner = &self.inner;
        inner.entries.retain(|_, entry| {
            if entry.subscribers == 0 {
                return false;
            }
            entry.status = QueryStatus::Idle;
            entry.data = None;
            entry.error = None;
            entry.provided_tags.clear();
            entry.fetched_at = None;
            entry.in_flight = None;
            entry.stale_on_settle = false;
            entry.fetch_id = inner.next_fetch_id();
            entry.notify();
            true
        });
        debug!(kept = inner.entries.len(), "query cache reset");
    }
}

impl CacheInner {
    fn next_fetch_id(&self) -> u64 {
        self.next_fetch_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn start_fetch<E: QueryEndpoint>(
        self: &Arc<Self>,
        entry: &mut CacheEntry,
        key: &CacheKey,
        endpoint: &Arc<E>,
        arg: &E::Arg,
    ) {
        let fetch_id = self.next_fetch_id();
        let fetch = run_fetch(
            Arc::downgrade(self),
            key.clone(),
            fetch_id,
            Arc::clone(endpoint),
            arg.clone(),
        )
        .boxed()
        .shared();

        entry.in_flight = Some(fetch.clone());
        entry.fetch_id = fetch_id;
        entry.stale_on_settle = false;
        entry.status = QueryStatus::Loading;
        entry.notify();
        debug!(%key, "fetch started");

        tokio::spawn(fetch);
    }

    /// The in-flight fetch to wait on, starting one if the entry needs it.
    ///
    /// Without `force`, failed entries are left alone until re-subscribed.
    fn ensure_fresh<E: QueryEndpoint>(
        self: &Arc<Self>,
        key: &CacheKey,
        endpoint: &Arc<E>,
        arg: &E::Arg,
        force: bool,
    ) -> Option<FetchFuture> {
        let mut entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(CacheEntry::new);
        let refetch = force || matches!(entry.status, QueryStatus::Idle | QueryStatus::Stale);
        if entry.in_flight.is_none() && refetch {
            self.start_fetch(&mut entry, key, endpoint, arg);
        }
        entry.in_flight.clone()
    }

    fn is_current(&self, key: &CacheKey, fetch_id: u64) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.fetch_id == fetch_id)
    }

    /// Record a fetch outcome. Superseded fetches are dropped.
    fn settle(
        self: &Arc<Self>,
        key: &CacheKey,
        fetch_id: u64,
        outcome: Result<(ErasedData, Vec<Tag>), CoreError>,
    ) {
        let release = {
            let Some(mut entry) = self.entries.get_mut(key) else {
                return;
            };
            if entry.fetch_id != fetch_id {
                trace!(%key, "discarding superseded fetch");
                return;
            }
            entry.in_flight = None;
            match outcome {
                Ok((data, tags)) => {
                    entry.data = Some(data);
                    entry.error = None;
                    entry.provided_tags = tags.into_iter().collect();
                    entry.fetched_at = Some(Utc::now());
                    entry.status = if std::mem::take(&mut entry.stale_on_settle) {
                        QueryStatus::Stale
                    } else {
                        QueryStatus::Success
                    };
                }
                Err(err) => {
                    entry.error = Some(err);
                    entry.provided_tags.clear();
                    entry.stale_on_settle = false;
                    entry.status = QueryStatus::Error;
                }
            }
            trace!(%key, status = %entry.status, "fetch settled");
            entry.notify();

            if entry.subscribers == 0 {
                entry.release_epoch += 1;
                Some(entry.release_epoch)
            } else {
                None
            }
        };
        if let Some(epoch) = release {
            self.schedule_eviction(key.clone(), epoch);
        }
    }

    fn release(self: &Arc<Self>, key: &CacheKey) {
        let epoch = {
            let Some(mut entry) = self.entries.get_mut(key) else {
                return;
            };
            entry.subscribers = entry.subscribers.saturating_sub(1);
            entry.release_epoch += 1;
            trace!(%key, subscribers = entry.subscribers, "unsubscribed");
            if entry.subscribers > 0 || entry.in_flight.is_some() {
                return;
            }
            entry.release_epoch
        };
        self.schedule_eviction(key.clone(), epoch);
    }

    fn schedule_eviction(self: &Arc<Self>, key: CacheKey, epoch: u64) {
        if self.keep_unused_for.is_zero() {
            self.evict_if_unused(&key, epoch);
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.evict_if_unused(&key, epoch);
            return;
        };
        let cache = Arc::downgrade(self);
        let delay = self.keep_unused_for;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(cache) = cache.upgrade() {
                cache.evict_if_unused(&key, epoch);
            }
        });
    }

    fn evict_if_unused(&self, key: &CacheKey, epoch: u64) {
        let evicted = self.entries.remove_if(key, |_, entry| {
            entry.subscribers == 0 && entry.in_flight.is_none() && entry.release_epoch == epoch
        });
        if evicted.is_some() {
            debug!(%key, "evicted unused cache entry");
        }
    }
}

async fn run_fetch<E: QueryEndpoint>(
    cache: Weak<CacheInner>,
    key: CacheKey,
    fetch_id: u64,
    endpoint: Arc<E>,
    arg: E::Arg,
) -> Result<ErasedData, CoreError> {
    let executor = match cache.upgrade() {
        Some(inner) => Arc::clone(&inner.executor),
        None => return Err(CoreError::Disconnected),
    };

    let outcome = match executor.execute(endpoint.build_request(&arg)).await {
        Ok(raw) => endpoint.transform_response(raw).map(Arc::new),
        Err(err) => Err(CoreError::from(err)),
    };

    let Some(inner) = cache.upgrade() else {
        return outcome.map(|output| -> ErasedData { output });
    };
    match outcome {
        Ok(output) => {
            let tags = endpoint.provides_tags(&output, &arg);
            if inner.is_current(&key, fetch_id) {
                endpoint.on_success(&inner.store, &output);
            }
            let data: ErasedData = output;
            inner.settle(&key, fetch_id, Ok((Arc::clone(&data), tags)));
            Ok(data)
        }
        Err(err) => {
            debug!(%key, error = %err, "fetch failed");
            inner.settle(&key, fetch_id, Err(err.clone()));
            Err(err)
        }
    }
}

// ── Subscription ─────────────────────────────────────────────────────

/// A live interest in one query. Dropping it unsubscribes.
pub struct Subscription<E: QueryEndpoint> {
    cache: QueryCache,
    key: CacheKey,
    endpoint: Arc<E>,
    arg: E::Arg,
    changes: watch::Receiver<u64>,
}

impl<E: QueryEndpoint> Subscription<E> {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Current snapshot. Never starts a fetch.
    pub fn state(&self) -> QueryState<E::Output> {
        self.cache
            .inner
            .entries
            .get(&self.key)
            .map_or_else(QueryState::idle, |entry| QueryState::from_entry(&entry))
    }

    /// Wait for a settled result.
    ///
    /// Joins the in-flight fetch if there is one; a stale entry is
    /// re-fetched first.
    pub async fn result(&self) -> QueryState<E::Output> {
        let pending = self
            .cache
            .inner
            .ensure_fresh(&self.key, &self.endpoint, &self.arg, false);
        if let Some(pending) = pending {
            let _ = pending.await;
        }
        self.state()
    }

    /// Fetch again regardless of status (joins a fetch already in flight).
    pub async fn refetch(&self) -> QueryState<E::Output> {
        let pending = self
            .cache
            .inner
            .ensure_fresh(&self.key, &self.endpoint, &self.arg, true);
        if let Some(pending) = pending {
            let _ = pending.await;
        }
        self.state()
    }

    /// Wait for the entry's next transition.
    /// Returns `None` if the entry was dropped from the cache.
    pub async fn changed(&mut self) -> Option<QueryState<E::Output>> {
        self.changes.changed().await.ok()?;
        self.changes.borrow_and_update();
        Some(self.state())
    }
}

impl<E: QueryEndpoint> Drop for Subscription<E> {
    fn drop(&mut self) {
        self.cache.inner.release(&self.key);
    }
}

// ── Mutation trigger ─────────────────────────────────────────────────

/// A bound mutation endpoint.
pub struct MutationTrigger<M: MutationEndpoint> {
    cache: QueryCache,
    endpoint: Arc<M>,
}

impl<M: MutationEndpoint> MutationTrigger<M> {
    pub async fn trigger(&self, arg: M::Arg) -> Result<M::Output, CoreError> {
        self.cache.mutate(self.endpoint.as_ref(), arg).await
    }

    pub fn endpoint(&self) -> &M {
        &self.endpoint
    }
}
