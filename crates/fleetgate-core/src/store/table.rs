// ── Normalized entity tables ──
//
// A table is an immutable `{ ids, entities }` pair: `ids` carries the
// display order, `entities` the O(1) lookup. Adapters never mutate a table
// in place; every operation returns a new one so selectors can memoize on
// table identity.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::model::{EntityId, Resource};

/// Ordered, id-keyed collection of one resource type.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityTable<T> {
    ids: Vec<EntityId>,
    entities: HashMap<EntityId, Arc<T>>,
}

impl<T> Default for EntityTable<T> {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            entities: HashMap::new(),
        }
    }
}

impl<T> EntityTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids in table order.
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    pub fn get(&self, id: &EntityId) -> Option<&Arc<T>> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Entities in table order.
    pub fn entities(&self) -> impl Iterator<Item = &Arc<T>> {
        self.ids.iter().filter_map(|id| self.entities.get(id))
    }
}

/// Stateless operations over [`EntityTable`]s of one resource type.
///
/// Ordering follows [`Resource::compare`].
pub struct EntityAdapter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for EntityAdapter<T> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: Resource> EntityAdapter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole contents with `list`.
    ///
    /// The first occurrence of a duplicated id wins.
    pub fn set_all(&self, list: impl IntoIterator<Item = T>) -> EntityTable<T> {
        let mut table = EntityTable::new();
        for entity in list {
            let id = entity.id().clone();
            if table.entities.contains_key(&id) {
                continue;
            }
            table.ids.push(id.clone());
            table.entities.insert(id, Arc::new(entity));
        }
        Self::sort(&mut table);
        table
    }

    /// Insert or replace a single entity.
    ///
    /// Untouched entities keep their `Arc` identity.
    pub fn upsert(&self, table: &EntityTable<T>, entity: T) -> EntityTable<T> {
        let mut next = table.clone();
        let id = entity.id().clone();
        if next.entities.insert(id.clone(), Arc::new(entity)).is_none() {
            next.ids.push(id);
        }
        Self::sort(&mut next);
        next
    }

    pub fn remove_one(&self, table: &EntityTable<T>, id: &EntityId) -> EntityTable<T> {
        let mut next = table.clone();
        if next.entities.remove(id).is_some() {
            next.ids.retain(|existing| existing != id);
        }
        next
    }

    pub fn remove_all(&self) -> EntityTable<T> {
        EntityTable::new()
    }

    fn sort(table: &mut EntityTable<T>) {
        let entities = &table.entities;
        table.ids.sort_by(|a, b| match (entities.get(a), entities.get(b)) {
            (Some(x), Some(y)) => T::compare(x, y),
            _ => a.cmp(b),
        });
    }
}
