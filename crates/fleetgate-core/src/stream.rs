// ── Reactive table streams ──
//
// Subscription type for consuming table replacements from the DataStore.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::EntityTable;

/// A subscription to one resource type's table.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via `changed()` or by converting to a `Stream`.
pub struct TableStream<T: Send + Sync + 'static> {
    current: Arc<EntityTable<T>>,
    receiver: watch::Receiver<Arc<EntityTable<T>>>,
}

impl<T: Send + Sync + 'static> TableStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<Arc<EntityTable<T>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The table captured at creation time (or at the last `changed()`).
    pub fn current(&self) -> &Arc<EntityTable<T>> {
        &self.current
    }

    /// The latest table (may have changed since creation).
    pub fn latest(&self) -> Arc<EntityTable<T>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next replacement, returning the new table.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<EntityTable<T>>> {
        self.receiver.changed().await.ok()?;
        let table = self.receiver.borrow_and_update().clone();
        self.current = table.clone();
        Some(table)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> TableWatchStream<T> {
        TableWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding each new table.
pub struct TableWatchStream<T: Send + Sync + 'static> {
    inner: WatchStream<Arc<EntityTable<T>>>,
}

impl<T: Send + Sync + 'static> Stream for TableWatchStream<T> {
    type Item = Arc<EntityTable<T>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
