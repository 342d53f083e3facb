// ── Resource contract ──
//
// Every record type the gateway stores implements `Resource`: it names its
// REST collection, exposes its id, and defines the order its tables are
// kept in.

use std::cmp::Ordering;
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::entity_id::EntityId;
use crate::store::{DataStore, EntityCollection};

/// The eight resource families exposed by the backend.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum ResourceKind {
    Users,
    Customers,
    Cars,
    Drivers,
    Rents,
    Damages,
    Notifications,
    Payments,
}

impl ResourceKind {
    /// REST collection path segment.
    pub fn collection(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Customers => "customers",
            Self::Cars => "cars",
            Self::Drivers => "drivers",
            Self::Rents => "rents",
            Self::Damages => "damages",
            Self::Notifications => "notifications",
            Self::Payments => "payments",
        }
    }
}

/// A record type held in the normalized store.
pub trait Resource: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn id(&self) -> &EntityId;

    /// 1-based display position assigned at ingestion. Not a storage key.
    fn rank(&self) -> Option<usize>;

    fn set_rank(&mut self, rank: usize);

    fn created_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Table ordering. Newest first by hex id unless overridden.
    fn compare(a: &Self, b: &Self) -> Ordering {
        by_hex_desc(a, b)
    }

    /// The store collection holding this resource's table.
    fn collection(store: &DataStore) -> &EntityCollection<Self>;
}

/// Newest-first by hex id.
pub fn by_hex_desc<T: Resource>(a: &T, b: &T) -> Ordering {
    a.id().cmp_hex_desc(b.id())
}

/// Newest-first by `createdAt`; undated records after dated ones, then by
/// hex id.
pub fn by_created_desc<T: Resource>(a: &T, b: &T) -> Ordering {
    let by_date = match (a.created_at(), b.created_at()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date.then_with(|| a.id().cmp_hex_desc(b.id()))
}

/// A link to another record, either as a bare id or populated inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Id(EntityId),
    Populated(serde_json::Map<String, serde_json::Value>),
}

impl Reference {
    /// The referenced record's id, if one can be found.
    pub fn id(&self) -> Option<EntityId> {
        match self {
            Self::Id(id) => Some(id.clone()),
            Self::Populated(map) => map
                .get("_id")
                .or_else(|| map.get("id"))
                .and_then(serde_json::Value::as_str)
                .map(EntityId::from),
        }
    }
}

/// Implements [`Resource`] for a record struct with `id`, `rank` and
/// `created_at` fields.
macro_rules! impl_resource {
    (@impl $ty:ty, $kind:ident, $field:ident, $cmp:path) => {
        impl $crate::model::resource::Resource for $ty {
            const KIND: $crate::model::resource::ResourceKind =
                $crate::model::resource::ResourceKind::$kind;

            fn id(&self) -> &$crate::model::EntityId {
                &self.id
            }

            fn rank(&self) -> Option<usize> {
                self.rank
            }

            fn set_rank(&mut self, rank: usize) {
                self.rank = Some(rank);
            }

            fn created_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
                self.created_at
            }

            fn compare(a: &Self, b: &Self) -> std::cmp::Ordering {
                $cmp(a, b)
            }

            fn collection(
                store: &$crate::store::DataStore,
            ) -> &$crate::store::EntityCollection<Self> {
                &store.$field
            }
        }
    };
    ($ty:ty, $kind:ident, $field:ident) => {
        impl_resource!(@impl $ty, $kind, $field, $crate::model::resource::by_hex_desc::<$ty>);
    };
    ($ty:ty, $kind:ident, $field:ident, by_created) => {
        impl_resource!(@impl $ty, $kind, $field, $crate::model::resource::by_created_desc::<$ty>);
    };
}

pub(crate) use impl_resource;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::IntoEnumIterator;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("cars".parse::<ResourceKind>().unwrap(), ResourceKind::Cars);
        assert_eq!("Payments".parse::<ResourceKind>().unwrap(), ResourceKind::Payments);
        assert!("trucks".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn every_kind_has_a_lowercase_collection() {
        for kind in ResourceKind::iter() {
            assert_eq!(kind.collection(), kind.to_string().to_lowercase());
        }
    }

    #[test]
    fn reference_accepts_id_or_populated_record() {
        let bare: Reference = serde_json::from_value(json!("64f0")).unwrap();
        assert_eq!(bare.id(), Some(EntityId::from("64f0")));

        let populated: Reference =
            serde_json::from_value(json!({ "_id": "64f1", "plate": "B-1" })).unwrap();
        assert_eq!(populated.id(), Some(EntityId::from("64f1")));
    }
}
