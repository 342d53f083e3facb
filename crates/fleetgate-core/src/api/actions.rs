// ── Resource-specific actions ──

use fleetgate_api::ApiRequest;
use serde_json::{Value, json};

use crate::error::CoreError;
use crate::model::{EntityId, Rent, ResourceKind};
use crate::query::{MutationEndpoint, Tag};
use crate::store::decode_echo;

/// `PATCH /rents/<id>/close`: end a rental and release its car and driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloseRent;

impl MutationEndpoint for CloseRent {
    type Arg = EntityId;
    /// The closed rent, when the server echoes it.
    type Output = Option<Rent>;

    fn name(&self) -> String {
        "rents.close".into()
    }

    fn build_request(&self, id: &EntityId) -> ApiRequest {
        ApiRequest::patch(format!("rents/{id}/close"))
    }

    fn transform_response(&self, raw: Value) -> Result<Option<Rent>, CoreError> {
        decode_echo(raw)
    }

    fn invalidates_tags(&self, _output: &Option<Rent>, id: &EntityId) -> Vec<Tag> {
        vec![
            Tag::id(ResourceKind::Rents, id.clone()),
            Tag::list(ResourceKind::Cars),
            Tag::list(ResourceKind::Drivers),
        ]
    }
}

/// `PATCH /notifications/read`: mark notifications read.
///
/// An empty id list marks every notification read.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkNotificationsRead;

impl MutationEndpoint for MarkNotificationsRead {
    type Arg = Vec<EntityId>;
    type Output = ();

    fn name(&self) -> String {
        "notifications.read".into()
    }

    fn build_request(&self, ids: &Vec<EntityId>) -> ApiRequest {
        let request = ApiRequest::patch("notifications/read");
        if ids.is_empty() {
            request.json(json!({ "all": true }))
        } else {
            request.json(json!({ "ids": ids }))
        }
    }

    fn transform_response(&self, _raw: Value) -> Result<(), CoreError> {
        Ok(())
    }

    fn invalidates_tags(&self, (): &(), _ids: &Vec<EntityId>) -> Vec<Tag> {
        vec![Tag::list(ResourceKind::Notifications)]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fleetgate_api::Method;

    #[test]
    fn close_rent_releases_car_and_driver() {
        let id = EntityId::from("65a1");
        let request = CloseRent.build_request(&id);
        assert_eq!(request.method, Method::Patch);
        assert_eq!(request.path, "rents/65a1/close");

        let tags = CloseRent.invalidates_tags(&None, &id);
        assert!(tags.contains(&Tag::id(ResourceKind::Rents, "65a1")));
        assert!(tags.contains(&Tag::list(ResourceKind::Cars)));
        assert!(tags.contains(&Tag::list(ResourceKind::Drivers)));
    }

    #[test]
    fn mark_read_body() {
        let all = MarkNotificationsRead.build_request(&Vec::new());
        assert_eq!(all.body, Some(json!({ "all": true })));
        let some = MarkNotificationsRead.build_request(&vec![EntityId::from("1")]);
        assert_eq!(some.body, Some(json!({ "ids": ["1"] })));
    }
}
