// ── Reactive table holder ──
//
// Holds the current table for a single resource type and broadcasts every
// replacement via `watch` channels.

use std::sync::Arc;

use tokio::sync::watch;

use super::table::EntityTable;

/// The current [`EntityTable`] of one resource type.
///
/// Replacing the table bumps a version counter and pushes the new snapshot
/// to every subscriber. Readers get a cheap `Arc` clone whose identity
/// changes only when the contents were replaced.
pub struct EntityCollection<T: Send + Sync + 'static> {
    /// Version counter, bumped on every replacement.
    version: watch::Sender<u64>,

    /// Current table.
    table: watch::Sender<Arc<EntityTable<T>>>,
}

impl<T: Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (table, _) = watch::channel(Arc::new(EntityTable::new()));
        Self { version, table }
    }

    /// Publish a new table.
    pub(crate) fn replace(&self, table: Arc<EntityTable<T>>) {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.table.send_modify(|current| *current = table);
        self.bump_version();
    }

    /// Drop every entity.
    pub(crate) fn clear(&self) {
        self.replace(Arc::new(EntityTable::new()));
    }

    /// Get the current table (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<EntityTable<T>> {
        self.table.borrow().clone()
    }

    /// Subscribe to table replacements.
    pub fn subscribe(&self) -> watch::Receiver<Arc<EntityTable<T>>> {
        self.table.subscribe()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.borrow().is_empty()
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}
