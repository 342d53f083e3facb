// ── Cache entries ──

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, Shared};
use strum::Display;
use tokio::sync::watch;

use super::tag::Tag;
use crate::error::CoreError;

/// Lifecycle of one cache entry.
///
/// `Idle -> Loading -> (Success | Error)`, `Success -> Stale` on
/// invalidation, `Stale -> Loading` on the next access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
    Stale,
}

pub(crate) type ErasedData = Arc<dyn Any + Send + Sync>;
pub(crate) type FetchFuture = Shared<BoxFuture<'static, Result<ErasedData, CoreError>>>;

pub(crate) struct CacheEntry {
    pub(crate) status: QueryStatus,
    /// Last successful result. Kept through `Stale`, `Loading` and `Error`.
    pub(crate) data: Option<ErasedData>,
    pub(crate) error: Option<CoreError>,
    pub(crate) provided_tags: HashSet<Tag>,
    pub(crate) fetched_at: Option<DateTime<Utc>>,
    pub(crate) subscribers: usize,
    pub(crate) in_flight: Option<FetchFuture>,
    /// Identifies the fetch allowed to settle into this entry.
    pub(crate) fetch_id: u64,
    /// Set when an invalidation lands while a fetch is in flight; the
    /// result of that fetch is stored as `Stale`.
    pub(crate) stale_on_settle: bool,
    /// Bumped when the subscriber count changes; a scheduled eviction only
    /// runs if the epoch is unchanged.
    pub(crate) release_epoch: u64,
    changes: watch::Sender<u64>,
}

impl CacheEntry {
    pub(crate) fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            provided_tags: HashSet::new(),
            fetched_at: None,
            subscribers: 0,
            in_flight: None,
            fetch_id: 0,
            stale_on_settle: false,
            release_epoch: 0,
            changes,
        }
    }

    /// Whether an access should start a fetch.
    pub(crate) fn needs_fetch(&self) -> bool {
        self.in_flight.is_none()
            && matches!(
                self.status,
                QueryStatus::Idle | QueryStatus::Stale | QueryStatus::Error
            )
    }

    pub(crate) fn watch(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Wake every subscriber waiting in `changed()`.
    pub(crate) fn notify(&self) {
        self.changes.send_modify(|v| *v = v.wrapping_add(1));
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("status", &self.status)
            .field("has_data", &self.data.is_some())
            .field("error", &self.error)
            .field("provided_tags", &self.provided_tags)
            .field("subscribers", &self.subscribers)
            .field("in_flight", &self.in_flight.is_some())
            .finish_non_exhaustive()
    }
}

/// Snapshot of a query as seen by one subscriber.
#[derive(Debug)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    /// Last successful result, retained while stale or refetching.
    pub data: Option<Arc<T>>,
    pub error: Option<CoreError>,
    /// First load: fetching with nothing to show yet.
    pub is_loading: bool,
    /// Any fetch in flight, including background refetches.
    pub is_fetching: bool,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            is_loading: self.is_loading,
            is_fetching: self.is_fetching,
            fetched_at: self.fetched_at,
        }
    }
}

impl<T: Send + Sync + 'static> QueryState<T> {
    pub(crate) fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            is_loading: false,
            is_fetching: false,
            fetched_at: None,
        }
    }

    pub(crate) fn from_entry(entry: &CacheEntry) -> Self {
        let data = entry
            .data
            .as_ref()
            .and_then(|data| Arc::clone(data).downcast::<T>().ok());
        let is_fetching = entry.in_flight.is_some();
        Self {
            status: entry.status,
            is_loading: is_fetching && data.is_none(),
            data,
            error: entry.error.clone(),
            is_fetching,
            fetched_at: entry.fetched_at,
        }
    }

    /// Settled outcome: the error if the last fetch failed, the data otherwise.
    pub fn into_result(self) -> Result<Arc<T>, CoreError> {
        match (self.status, self.error, self.data) {
            (QueryStatus::Error, Some(err), _) => Err(err),
            (_, _, Some(data)) => Ok(data),
            (_, Some(err), None) => Err(err),
            (status, None, None) => Err(CoreError::Decode {
                message: format!("query has no data ({status})"),
            }),
        }
    }
}
