// ── Generic resource endpoints ──
//
// CRUD endpoints shared by every resource type. Each one derives its path
// from the resource's collection and its tags from the resource kind.

use std::marker::PhantomData;
use std::sync::Arc;

use fleetgate_api::ApiRequest;
use serde_json::{Value, json};

use super::related::{WriteOp, related_tags};
use crate::error::CoreError;
use crate::model::{EntityId, Resource};
use crate::query::{MutationEndpoint, QueryEndpoint, Tag, list_tags};
use crate::store::{DataStore, EntityTable, decode_echo, decode_record, ingest_list};

fn record_path<T: Resource>(id: &EntityId) -> String {
    format!("{}/{id}", T::KIND.collection())
}

macro_rules! marker_endpoint {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            pub struct $name<T> {
                _marker: PhantomData<fn() -> T>,
            }

            impl<T> $name<T> {
                pub fn new() -> Self {
                    Self { _marker: PhantomData }
                }
            }

            impl<T> Default for $name<T> {
                fn default() -> Self {
                    Self::new()
                }
            }
        )*
    };
}

marker_endpoint!(
    /// `GET /<collection>`: the full, normalized list.
    ListQuery,
    /// `GET /<collection>/<id>`.
    GetQuery,
    /// `POST /<collection>`.
    CreateMutation,
    /// `PATCH /<collection>/<id>`.
    UpdateMutation,
    /// `DELETE /<collection>/<id>`.
    DeleteMutation,
    /// `POST /<collection>/delete-many` with `{ "ids": [...] }`.
    DeleteManyMutation,
);

// ── Queries ──────────────────────────────────────────────────────────

impl<T: Resource> QueryEndpoint for ListQuery<T> {
    type Arg = ();
    type Output = EntityTable<T>;

    fn name(&self) -> String {
        format!("{}.list", T::KIND.collection())
    }

    fn build_request(&self, (): &()) -> ApiRequest {
        ApiRequest::get(T::KIND.collection())
    }

    fn transform_response(&self, raw: Value) -> Result<EntityTable<T>, CoreError> {
        ingest_list(raw)
    }

    fn provides_tags(&self, output: &EntityTable<T>, (): &()) -> Vec<Tag> {
        list_tags(T::KIND, output.ids())
    }

    fn on_success(&self, store: &DataStore, output: &Arc<EntityTable<T>>) {
        store.publish(Arc::clone(output));
    }
}

impl<T: Resource> QueryEndpoint for GetQuery<T> {
    type Arg = EntityId;
    type Output = T;

    fn name(&self) -> String {
        format!("{}.get", T::KIND.collection())
    }

    fn build_request(&self, id: &EntityId) -> ApiRequest {
        ApiRequest::get(record_path::<T>(id))
    }

    fn transform_response(&self, raw: Value) -> Result<T, CoreError> {
        decode_record(raw)
    }

    fn provides_tags(&self, _output: &T, id: &EntityId) -> Vec<Tag> {
        vec![Tag::id(T::KIND, id.clone())]
    }
}

// ── Mutations ────────────────────────────────────────────────────────

impl<T: Resource> MutationEndpoint for CreateMutation<T> {
    /// Request body.
    type Arg = Value;
    /// The created record, when the server echoes it.
    type Output = Option<T>;

    fn name(&self) -> String {
        format!("{}.create", T::KIND.collection())
    }

    fn build_request(&self, body: &Value) -> ApiRequest {
        ApiRequest::post(T::KIND.collection()).json(body.clone())
    }

    fn transform_response(&self, raw: Value) -> Result<Option<T>, CoreError> {
        decode_echo(raw)
    }

    fn invalidates_tags(&self, _output: &Option<T>, _body: &Value) -> Vec<Tag> {
        let mut tags = vec![Tag::list(T::KIND)];
        tags.extend(related_tags(T::KIND, WriteOp::Create));
        tags
    }
}

/// Arguments for [`UpdateMutation`].
#[derive(Debug, Clone)]
pub struct Patch {
    pub id: EntityId,
    pub body: Value,
}

impl<T: Resource> MutationEndpoint for UpdateMutation<T> {
    type Arg = Patch;
    type Output = Option<T>;

    fn name(&self) -> String {
        format!("{}.update", T::KIND.collection())
    }

    fn build_request(&self, patch: &Patch) -> ApiRequest {
        ApiRequest::patch(record_path::<T>(&patch.id)).json(patch.body.clone())
    }

    fn transform_response(&self, raw: Value) -> Result<Option<T>, CoreError> {
        decode_echo(raw)
    }

    fn invalidates_tags(&self, _output: &Option<T>, patch: &Patch) -> Vec<Tag> {
        let mut tags = vec![Tag::id(T::KIND, patch.id.clone())];
        tags.extend(related_tags(T::KIND, WriteOp::Update));
        tags
    }
}

impl<T: Resource> MutationEndpoint for DeleteMutation<T> {
    type Arg = EntityId;
    type Output = ();

    fn name(&self) -> String {
        format!("{}.delete", T::KIND.collection())
    }

    fn build_request(&self, id: &EntityId) -> ApiRequest {
        ApiRequest::delete(record_path::<T>(id))
    }

    fn transform_response(&self, _raw: Value) -> Result<(), CoreError> {
        Ok(())
    }

    fn invalidates_tags(&self, (): &(), id: &EntityId) -> Vec<Tag> {
        let mut tags = vec![Tag::id(T::KIND, id.clone()), Tag::list(T::KIND)];
        tags.extend(related_tags(T::KIND, WriteOp::Delete));
        tags
    }
}

impl<T: Resource> MutationEndpoint for DeleteManyMutation<T> {
    type Arg = Vec<EntityId>;
    type Output = ();

    fn name(&self) -> String {
        format!("{}.delete-many", T::KIND.collection())
    }

    fn build_request(&self, ids: &Vec<EntityId>) -> ApiRequest {
        ApiRequest::post(format!("{}/delete-many", T::KIND.collection())).json(json!({ "ids": ids }))
    }

    fn transform_response(&self, _raw: Value) -> Result<(), CoreError> {
        Ok(())
    }

    fn invalidates_tags(&self, (): &(), ids: &Vec<EntityId>) -> Vec<Tag> {
        let mut tags = vec![Tag::list(T::KIND)];
        tags.extend(ids.iter().map(|id| Tag::id(T::KIND, id.clone())));
        tags.extend(related_tags(T::KIND, WriteOp::Delete));
        tags
    }
}
