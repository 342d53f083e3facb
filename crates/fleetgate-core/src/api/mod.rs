// ── Resource endpoints ──
//
// Query and mutation definitions for the fleet API, plus the table of
// cross-resource invalidations.

mod actions;
mod related;
mod resources;

pub use actions::{CloseRent, MarkNotificationsRead};
pub use related::{WriteOp, related_tags};
pub use resources::{
    CreateMutation, DeleteManyMutation, DeleteMutation, GetQuery, ListQuery, Patch, UpdateMutation,
};
