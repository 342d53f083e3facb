// ── Cache tags ──
//
// A tag names a slice of server state: a whole resource list, or a single
// record. Queries provide tags, mutations invalidate them.

use std::fmt;

use crate::model::{EntityId, ResourceKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagId {
    /// The resource's list as a whole.
    List,
    Id(EntityId),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub kind: ResourceKind,
    pub id: TagId,
}

impl Tag {
    pub fn list(kind: ResourceKind) -> Self {
        Self {
            kind,
            id: TagId::List,
        }
    }

    pub fn id(kind: ResourceKind, id: impl Into<EntityId>) -> Self {
        Self {
            kind,
            id: TagId::Id(id.into()),
        }
    }

    /// Whether a cached result providing `self` goes stale when `invalidated`
    /// is invalidated.
    ///
    /// A list is stale when the list itself or any record of the same type
    /// changes. A record is stale only when that record changes; invalidating
    /// the list does not touch single-record results.
    pub fn is_invalidated_by(&self, invalidated: &Tag) -> bool {
        if self.kind != invalidated.kind {
            return false;
        }
        match (&self.id, &invalidated.id) {
            (TagId::List, _) => true,
            (TagId::Id(provided), TagId::Id(changed)) => provided == changed,
            (TagId::Id(_), TagId::List) => false,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            TagId::List => write!(f, "{}:LIST", self.kind),
            TagId::Id(id) => write!(f, "{}:{id}", self.kind),
        }
    }
}

/// Tags provided by a list result: the list plus one per record.
pub fn list_tags<'a>(kind: ResourceKind, ids: impl IntoIterator<Item = &'a EntityId>) -> Vec<Tag> {
    std::iter::once(Tag::list(kind))
        .chain(ids.into_iter().map(|id| Tag::id(kind, id.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_matches_list_and_members() {
        let provided = Tag::list(ResourceKind::Cars);
        assert!(provided.is_invalidated_by(&Tag::list(ResourceKind::Cars)));
        assert!(provided.is_invalidated_by(&Tag::id(ResourceKind::Cars, "42")));
    }

    #[test]
    fn record_matches_only_itself() {
        let provided = Tag::id(ResourceKind::Cars, "42");
        assert!(provided.is_invalidated_by(&Tag::id(ResourceKind::Cars, "42")));
        assert!(!provided.is_invalidated_by(&Tag::id(ResourceKind::Cars, "43")));
        assert!(!provided.is_invalidated_by(&Tag::list(ResourceKind::Cars)));
    }

    #[test]
    fn other_types_never_match() {
        let provided = Tag::list(ResourceKind::Rents);
        assert!(!provided.is_invalidated_by(&Tag::list(ResourceKind::Cars)));
        assert!(!provided.is_invalidated_by(&Tag::id(ResourceKind::Cars, "42")));
    }

    #[test]
    fn display_format() {
        assert_eq!(Tag::list(ResourceKind::Drivers).to_string(), "Drivers:LIST");
        assert_eq!(Tag::id(ResourceKind::Cars, "ab").to_string(), "Cars:ab");
    }

    #[test]
    fn list_tags_include_every_id() {
        let ids = [EntityId::from("1"), EntityId::from("2")];
        let tags = list_tags(ResourceKind::Cars, &ids);
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0], Tag::list(ResourceKind::Cars));
        assert_eq!(tags[2], Tag::id(ResourceKind::Cars, "2"));
    }
}
