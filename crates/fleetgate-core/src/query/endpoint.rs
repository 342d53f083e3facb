// ── Endpoint definitions ──
//
// An endpoint turns typed arguments into an `ApiRequest` and a raw JSON
// response back into typed output. Queries additionally declare the tags
// their results provide; mutations declare the tags they invalidate.

use std::sync::Arc;

use fleetgate_api::ApiRequest;
use serde::Serialize;
use serde_json::Value;

use super::tag::Tag;
use crate::error::CoreError;
use crate::store::DataStore;

/// A cacheable read.
pub trait QueryEndpoint: Send + Sync + 'static {
    /// Part of the cache key; structurally equal arguments share one entry.
    type Arg: Serialize + Clone + Send + Sync + 'static;
    type Output: Send + Sync + 'static;

    /// Cache namespace, unique per endpoint.
    fn name(&self) -> String;

    fn build_request(&self, arg: &Self::Arg) -> ApiRequest;

    fn transform_response(&self, raw: Value) -> Result<Self::Output, CoreError>;

    fn provides_tags(&self, output: &Self::Output, arg: &Self::Arg) -> Vec<Tag>;

    /// Runs after a successful fetch, before subscribers are notified.
    fn on_success(&self, _store: &DataStore, _output: &Arc<Self::Output>) {}
}

/// A write. Never deduplicated, never cached.
pub trait MutationEndpoint: Send + Sync + 'static {
    type Arg: Send + Sync + 'static;
    type Output: Send + Sync + 'static;

    fn name(&self) -> String;

    fn build_request(&self, arg: &Self::Arg) -> ApiRequest;

    fn transform_response(&self, raw: Value) -> Result<Self::Output, CoreError>;

    fn invalidates_tags(&self, output: &Self::Output, arg: &Self::Arg) -> Vec<Tag>;
}
