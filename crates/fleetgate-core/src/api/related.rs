// ── Cross-resource invalidation ──
//
// Some writes change data served by other resources' lists: booking a car
// changes car and driver availability, a damage report changes the car's
// state, a payment changes the rent's balance.

use crate::model::ResourceKind;
use crate::query::Tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Update,
    Delete,
}

/// Extra tags invalidated by `op` on `kind`, beyond the resource's own.
pub fn related_tags(kind: ResourceKind, op: WriteOp) -> Vec<Tag> {
    let lists: &[ResourceKind] = match (kind, op) {
        (ResourceKind::Rents, _) => &[ResourceKind::Cars, ResourceKind::Drivers],
        (ResourceKind::Damages, WriteOp::Create | WriteOp::Delete) => &[ResourceKind::Cars],
        (ResourceKind::Payments, _) => &[ResourceKind::Rents],
        _ => &[],
    };
    lists.iter().copied().map(Tag::list).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cars_have_no_dependents() {
        assert!(related_tags(ResourceKind::Cars, WriteOp::Create).is_empty());
        assert!(related_tags(ResourceKind::Users, WriteOp::Delete).is_empty());
    }

    #[test]
    fn payments_touch_rents() {
        assert_eq!(
            related_tags(ResourceKind::Payments, WriteOp::Create),
            [Tag::list(ResourceKind::Rents)]
        );
    }

    #[test]
    fn damage_edits_leave_cars_alone() {
        assert!(related_tags(ResourceKind::Damages, WriteOp::Update).is_empty());
    }
}
