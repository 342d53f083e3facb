// ── Query layer ──
//
// Deduplicating query cache with tag-based invalidation.

pub mod cache;
pub mod endpoint;
pub mod entry;
pub mod invalidation;
pub mod key;
pub mod tag;

pub use cache::{MutationTrigger, QueryCache, Subscription};
pub use endpoint::{MutationEndpoint, QueryEndpoint};
pub use entry::{QueryState, QueryStatus};
pub use key::CacheKey;
pub use tag::{Tag, TagId, list_tags};
