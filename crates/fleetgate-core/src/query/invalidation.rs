// ── Invalidation graph ──
//
// A mutation's declared tags are diffed against the tags every live entry
// provided on its last success. Matches go `Stale` and re-fetch on their
// next access. There is no cascading: a stale entry never invalidates the
// tags it provides.

use std::collections::HashSet;

use tracing::debug;

use super::cache::QueryCache;
use super::entry::QueryStatus;
use super::key::CacheKey;
use super::tag::Tag;

/// Whether an entry providing `provided` is hit by any of `invalidated`.
pub fn provides_any(provided: &HashSet<Tag>, invalidated: &[Tag]) -> bool {
    provided
        .iter()
        .any(|tag| invalidated.iter().any(|hit| tag.is_invalidated_by(hit)))
}

impl QueryCache {
    /// Mark every entry matching `tags` stale, keeping its data.
    ///
    /// An entry with a fetch in flight is marked stale once that fetch
    /// settles. Returns the keys that were hit.
    pub fn invalidate(&self, tags: &[Tag]) -> Vec<CacheKey> {
        if tags.is_empty() {
            return Vec::new();
        }
        let mut hit = Vec::new();
        for mut entry in self.inner.entries.iter_mut() {
            if !provides_any(&entry.provided_tags, tags) {
                continue;
            }
            if entry.in_flight.is_some() {
                entry.stale_on_settle = true;
            } else if entry.status == QueryStatus::Success {
                entry.status = QueryStatus::Stale;
                entry.notify();
            }
            hit.push(entry.key().clone());
        }
        debug!(?tags, hit = hit.len(), "invalidated cache entries");
        hit
    }
}
