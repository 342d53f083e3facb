// ── Central normalized store ──
//
// One reactive table per resource type. List queries publish their
// normalized tables here; logout empties everything.

use std::sync::Arc;

use tracing::debug;

use super::collection::EntityCollection;
use super::table::EntityTable;
use crate::model::{
    Car, Customer, Damage, Driver, EntityId, Notification, Payment, Rent, Resource, User,
};
use crate::stream::TableStream;

/// Normalized entity store for every resource type.
///
/// Thread-safe: readers take `Arc` snapshots, writers swap whole tables.
pub struct DataStore {
    pub(crate) users: EntityCollection<User>,
    pub(crate) customers: EntityCollection<Customer>,
    pub(crate) cars: EntityCollection<Car>,
    pub(crate) drivers: EntityCollection<Driver>,
    pub(crate) rents: EntityCollection<Rent>,
    pub(crate) damages: EntityCollection<Damage>,
    pub(crate) notifications: EntityCollection<Notification>,
    pub(crate) payments: EntityCollection<Payment>,
}

impl DataStore {
    pub fn new() -> Self {
        Self {
            users: EntityCollection::new(),
            customers: EntityCollection::new(),
            cars: EntityCollection::new(),
            drivers: EntityCollection::new(),
            rents: EntityCollection::new(),
            damages: EntityCollection::new(),
            notifications: EntityCollection::new(),
            payments: EntityCollection::new(),
        }
    }

    // ── Generic access ───────────────────────────────────────────────

    /// Current table for `T` (cheap `Arc` clone).
    pub fn table<T: Resource>(&self) -> Arc<EntityTable<T>> {
        T::collection(self).snapshot()
    }

    pub fn get<T: Resource>(&self, id: &EntityId) -> Option<Arc<T>> {
        T::collection(self).snapshot().get(id).cloned()
    }

    pub fn count<T: Resource>(&self) -> usize {
        T::collection(self).len()
    }

    pub fn subscribe<T: Resource>(&self) -> TableStream<T> {
        TableStream::new(T::collection(self).subscribe())
    }

    pub(crate) fn publish<T: Resource>(&self, table: Arc<EntityTable<T>>) {
        debug!(resource = %T::KIND, count = table.len(), "publishing table");
        T::collection(self).replace(table);
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Empty every table.
    pub fn reset(&self) {
        self.users.clear();
        self.customers.clear();
        self.cars.clear();
        self.drivers.clear();
        self.rents.clear();
        self.damages.clear();
        self.notifications.clear();
        self.payments.clear();
        debug!("entity store reset");
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::ingest_list;
    use serde_json::json;

    #[test]
    fn publish_and_read_back() {
        let store = DataStore::new();
        let cars: EntityTable<Car> =
            ingest_list(json!([{ "_id": "1", "plate": "A" }, { "_id": "2" }])).unwrap();
        let cars = Arc::new(cars);
        store.publish(Arc::clone(&cars));

        assert!(Arc::ptr_eq(&store.table::<Car>(), &cars));
        assert_eq!(store.count::<Car>(), 2);
        assert_eq!(
            store.get::<Car>(&EntityId::from("1")).unwrap().plate.as_deref(),
            Some("A")
        );
        assert_eq!(store.count::<Driver>(), 0);
    }

    #[test]
    fn reset_empties_every_table() {
        let store = DataStore::new();
        store.publish(Arc::new(ingest_list::<Rent>(json!([{ "_id": "1" }])).unwrap()));
        store.publish(Arc::new(ingest_list::<User>(json!([{ "_id": "1" }])).unwrap()));

        store.reset();
        assert!(store.table::<Rent>().is_empty());
        assert!(store.table::<User>().is_empty());
    }
}
