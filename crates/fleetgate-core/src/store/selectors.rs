// ── Memoized selectors ──
//
// Derived views over a table, recomputed only when the table identity
// changes. Tables are immutable, so `Arc` pointer equality is the cache key.

use std::sync::{Arc, Mutex, Weak};

use super::table::EntityTable;
use crate::model::EntityId;

type Projection<T, R> = Box<dyn Fn(&EntityTable<T>) -> R + Send + Sync>;

/// A projection over an [`EntityTable`] memoized on the table's identity.
///
/// Repeated calls with the same table `Arc` return the same `Arc<R>`.
pub struct Memoized<T, R> {
    project: Projection<T, R>,
    /// The last input (held weakly, so an old table is never kept alive)
    /// and the value derived from it.
    last: Mutex<Option<(Weak<EntityTable<T>>, Arc<R>)>>,
}

impl<T, R> Memoized<T, R> {
    pub fn new(project: impl Fn(&EntityTable<T>) -> R + Send + Sync + 'static) -> Self {
        Self {
            project: Box::new(project),
            last: Mutex::new(None),
        }
    }

    pub fn select(&self, table: &Arc<EntityTable<T>>) -> Arc<R> {
        let mut last = self.last.lock().expect("selector lock poisoned");
        if let Some((input, output)) = last.as_ref() {
            if std::ptr::eq(input.as_ptr(), Arc::as_ptr(table)) {
                return Arc::clone(output);
            }
        }
        let output = Arc::new((self.project)(table));
        *last = Some((Arc::downgrade(table), Arc::clone(&output)));
        output
    }
}

/// Every entity in table order.
pub fn select_all<T: Send + Sync + 'static>() -> Memoized<T, Vec<Arc<T>>> {
    Memoized::new(|table| table.entities().cloned().collect())
}

/// Ids in table order.
pub fn select_ids<T: Send + Sync + 'static>() -> Memoized<T, Vec<EntityId>> {
    Memoized::new(|table| table.ids().to_vec())
}

/// O(1) lookup; the entity `Arc` is itself stable across unchanged tables.
pub fn select_by_id<T>(table: &EntityTable<T>, id: &EntityId) -> Option<Arc<T>> {
    table.get(id).cloned()
}

pub fn select_total<T>(table: &EntityTable<T>) -> usize {
    table.len()
}
