// ── Domain model ──
//
// Canonical record types for the eight resource families. Unknown fields
// are preserved in each record's `extra` map.

pub mod entity_id;
pub mod fleet;
pub mod people;
pub mod rental;
pub mod resource;

pub use entity_id::EntityId;
pub use fleet::{Car, Damage, Driver};
pub use people::{Customer, User};
pub use rental::{Notification, Payment, Rent};
pub use resource::{Reference, Resource, ResourceKind, by_created_desc, by_hex_desc};
