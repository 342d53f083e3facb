//! Client-side data layer for the fleet management API.
//!
//! Sits between the application and `fleetgate-api`:
//!
//! - **[`Gateway`]**: Central facade. Owns the [`AuthSession`], the
//!   reauthenticating transport, the [`QueryCache`] and the [`DataStore`];
//!   [`Gateway::resource`] hands out typed CRUD handles.
//!
//! - **[`QueryCache`]**: Deduplicating cache keyed by endpoint + canonical
//!   arguments. Identical concurrent reads share one request; entries are
//!   reference counted by [`Subscription`]s and evicted after a grace period.
//!
//! - **Invalidation**: Queries provide [`Tag`]s, mutations invalidate them.
//!   Matching entries go stale and re-fetch on their next access.
//!
//! - **[`DataStore`]**: Normalized `{ ids, entities }` tables per resource,
//!   ordered newest first, with memoized [`selectors`](store::selectors).
//!
//! - **Domain model** ([`model`]): `User`, `Customer`, `Car`, `Driver`,
//!   `Rent`, `Damage`, `Notification`, `Payment`.

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod model;
pub mod query;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{Credentials, GatewayConfig};
pub use error::CoreError;
pub use gateway::{Gateway, ResourceHandle};
pub use query::{
    CacheKey, MutationEndpoint, MutationTrigger, QueryCache, QueryEndpoint, QueryState,
    QueryStatus, Subscription, Tag, TagId,
};
pub use store::{DataStore, EntityAdapter, EntityTable, Memoized};
pub use stream::TableStream;

pub use fleetgate_api::{AuthSession, AuthSettings, LoginResponse};

pub use model::{
    Car, Customer, Damage, Driver, EntityId, Notification, Payment, Reference, Rent, Resource,
    ResourceKind, User,
};
