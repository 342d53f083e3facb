#![allow(clippy::unwrap_used)]
// Query cache behaviour over an in-memory transport.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use fleetgate_api::{Error, Method, Transport};
use fleetgate_core::api::{CreateMutation, DeleteMutation, GetQuery, ListQuery};
use fleetgate_core::{
    Car, CoreError, DataStore, EntityId, QueryCache, QueryStatus, ResourceKind, Subscription, Tag,
};
use futures_util::future::join_all;
use serde_json::{Value, json};

use common::ScriptedTransport;

// ── Helpers ─────────────────────────────────────────────────────────

fn cache_over(transport: &Arc<ScriptedTransport>, keep_unused_for: Duration) -> QueryCache {
    let executor: Arc<dyn Transport> = Arc::clone(transport) as Arc<dyn Transport>;
    QueryCache::new(executor, Arc::new(DataStore::new()), keep_unused_for)
}

fn cars_list() -> Arc<ListQuery<Car>> {
    Arc::new(ListQuery::new())
}

/// GET /cars answers with one more car each time; POST echoes a new car.
fn growing_fleet() -> ScriptedTransport {
    let gets = AtomicUsize::new(0);
    ScriptedTransport::new(move |request| match (request.method, request.path.as_str()) {
        (Method::Get, "cars") => {
            let n = gets.fetch_add(1, Ordering::SeqCst) + 1;
            let cars: Vec<Value> = (1..=n).map(|i| json!({ "_id": format!("{i:x}") })).collect();
            Ok(Value::Array(cars))
        }
        (Method::Post, "cars") => Ok(json!({ "_id": "ff", "plate": "NEW-1" })),
        _ => Ok(Value::Null),
    })
}

// ── Deduplication ───────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_subscribers_share_one_request() {
    let transport = Arc::new(
        ScriptedTransport::new(|_| Ok(json!([{ "_id": "3" }, { "_id": "ff" }])))
            .with_delay(Duration::from_millis(50)),
    );
    let cache = cache_over(&transport, Duration::from_secs(60));

    let subs: Vec<_> = (0..5)
        .map(|_| cache.subscribe(cars_list(), ()).unwrap())
        .collect();
    let loading = subs[0].state();
    assert_eq!(loading.status, QueryStatus::Loading);
    assert!(loading.is_loading);

    let states = join_all(subs.iter().map(Subscription::result)).await;

    assert_eq!(transport.count(Method::Get, "cars"), 1);
    let first = states[0].data.clone().unwrap();
    for state in &states {
        assert_eq!(state.status, QueryStatus::Success);
        assert!(Arc::ptr_eq(state.data.as_ref().unwrap(), &first));
    }
    assert!(Arc::ptr_eq(&cache.store().table::<Car>(), &first));
}

#[tokio::test]
async fn distinct_arguments_are_cached_separately() {
    let transport = Arc::new(ScriptedTransport::new(|request| {
        let id = request.path.trim_start_matches("cars/");
        Ok(json!({ "_id": id }))
    }));
    let cache = cache_over(&transport, Duration::from_secs(60));
    let get = Arc::new(GetQuery::<Car>::new());

    let a = cache.query(Arc::clone(&get), EntityId::from("a")).await.unwrap();
    let b = cache.query(Arc::clone(&get), EntityId::from("b")).await.unwrap();
    let a_again = cache.query(get, EntityId::from("a")).await.unwrap();

    assert_eq!(a.id, EntityId::from("a"));
    assert_eq!(b.id, EntityId::from("b"));
    assert!(Arc::ptr_eq(&a, &a_again));
    assert_eq!(transport.calls().len(), 2);
}

#[tokio::test]
async fn mutations_are_never_deduplicated() {
    let transport = Arc::new(growing_fleet());
    let cache = cache_over(&transport, Duration::from_secs(60));
    let create = CreateMutation::<Car>::new();
    let body = json!({ "plate": "NEW-1" });

    let (first, second) = tokio::join!(
        cache.mutate(&create, body.clone()),
        cache.mutate(&create, body)
    );
    first.unwrap();
    second.unwrap();
    assert_eq!(transport.count(Method::Post, "cars"), 2);
}

// ── Invalidation and stale data ─────────────────────────────────────

#[tokio::test]
async fn mutation_marks_list_stale_until_next_access() {
    let transport = Arc::new(growing_fleet());
    let cache = cache_over(&transport, Duration::from_secs(60));

    let sub = cache.subscribe(cars_list(), ()).unwrap();
    assert_eq!(sub.result().await.data.unwrap().len(), 1);

    let created = cache
        .mutate(&CreateMutation::<Car>::new(), json!({ "plate": "NEW-1" }))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.plate.as_deref(), Some("NEW-1"));

    // Stale keeps the old data and does not refetch on its own.
    let stale = sub.state();
    assert_eq!(stale.status, QueryStatus::Stale);
    assert_eq!(stale.data.unwrap().len(), 1);
    assert_eq!(transport.count(Method::Get, "cars"), 1);

    // Next access refetches exactly once.
    let fresh = sub.result().await;
    assert_eq!(fresh.status, QueryStatus::Success);
    assert_eq!(fresh.data.unwrap().len(), 2);
    assert_eq!(transport.count(Method::Get, "cars"), 2);
    assert_eq!(cache.store().count::<Car>(), 2);
}

#[tokio::test]
async fn new_subscriber_refetches_stale_entry_with_data_retained() {
    let transport = Arc::new(growing_fleet().with_delay(Duration::from_millis(20)));
    let cache = cache_over(&transport, Duration::from_secs(60));

    let first = cache.subscribe(cars_list(), ()).unwrap();
    first.result().await;
    cache.invalidate(&[Tag::list(ResourceKind::Cars)]);

    let second = cache.subscribe(cars_list(), ()).unwrap();
    let refetching = second.state();
    assert_eq!(refetching.status, QueryStatus::Loading);
    assert!(refetching.is_fetching);
    assert!(!refetching.is_loading);
    assert_eq!(refetching.data.unwrap().len(), 1);

    let (a, b) = tokio::join!(first.result(), second.result());
    assert_eq!(a.data.unwrap().len(), 2);
    assert_eq!(b.data.unwrap().len(), 2);
    assert_eq!(transport.count(Method::Get, "cars"), 2);
}

#[tokio::test(start_paused = true)]
async fn invalidation_during_fetch_settles_stale() {
    let transport =
        Arc::new(growing_fleet().with_delay(Duration::from_millis(100)));
    let cache = cache_over(&transport, Duration::from_secs(60));

    let sub = cache.subscribe(cars_list(), ()).unwrap();
    sub.result().await;

    let (refetched, hit) = tokio::join!(sub.refetch(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.invalidate(&[Tag::id(ResourceKind::Cars, "1")])
    });
    assert_eq!(hit.len(), 1);
    assert_eq!(refetched.status, QueryStatus::Stale);
    assert_eq!(refetched.data.unwrap().len(), 2);

    assert_eq!(sub.result().await.status, QueryStatus::Success);
    assert_eq!(transport.count(Method::Get, "cars"), 3);
}

#[tokio::test]
async fn mutation_trigger_invalidates_record_and_list() {
    let transport = Arc::new(growing_fleet());
    let cache = cache_over(&transport, Duration::from_secs(60));

    let sub = cache.subscribe(cars_list(), ()).unwrap();
    sub.result().await;

    let delete = cache.mutation(DeleteMutation::<Car>::new());
    delete.trigger(EntityId::from("1")).await.unwrap();
    delete.trigger(EntityId::from("1")).await.unwrap();

    assert_eq!(transport.count(Method::Delete, "cars/1"), 2);
    assert_eq!(sub.state().status, QueryStatus::Stale);
}

// ── Failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_query_records_no_tags_and_waits_for_reissue() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&attempts);
    let transport = Arc::new(ScriptedTransport::new(move |_| {
        if seen.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(Error::from_status(500, json!({ "message": "boom" })))
        } else {
            Ok(json!([{ "_id": "1" }]))
        }
    }));
    let cache = cache_over(&transport, Duration::from_secs(60));

    let sub = cache.subscribe(cars_list(), ()).unwrap();
    let failed = sub.result().await;
    assert_eq!(failed.status, QueryStatus::Error);
    let err = failed.clone().into_result().unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(matches!(err, CoreError::Api { ref message, .. } if message == "boom"));

    assert!(cache.invalidate(&[Tag::list(ResourceKind::Cars)]).is_empty());

    // Reading again does not retry on its own.
    assert_eq!(sub.result().await.status, QueryStatus::Error);
    assert_eq!(attempts.load(Ordering::SeqCst), 1);

    // Re-issuing the query does.
    let again = cache.subscribe(cars_list(), ()).unwrap();
    assert_eq!(again.result().await.status, QueryStatus::Success);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn zero_grace_evicts_on_last_unsubscribe() {
    let transport = Arc::new(growing_fleet());
    let cache = cache_over(&transport, Duration::ZERO);

    let a = cache.subscribe(cars_list(), ()).unwrap();
    let b = cache.subscribe(cars_list(), ()).unwrap();
    a.result().await;

    drop(a);
    assert_eq!(cache.len(), 1);
    drop(b);
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn unused_entries_survive_the_grace_period_only() {
    let transport = Arc::new(growing_fleet());
    let cache = cache_over(&transport, Duration::from_secs(60));

    let sub = cache.subscribe(cars_list(), ()).unwrap();
    sub.result().await;
    drop(sub);

    tokio::time::sleep(Duration::from_secs(30)).await;
    let back = cache.subscribe(cars_list(), ()).unwrap();
    assert_eq!(back.state().status, QueryStatus::Success);
    assert_eq!(transport.count(Method::Get, "cars"), 1);

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(cache.len(), 1);

    drop(back);
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert!(cache.is_empty());
}

#[tokio::test]
async fn changed_reports_transitions() {
    let transport = Arc::new(growing_fleet().with_delay(Duration::from_millis(10)));
    let cache = cache_over(&transport, Duration::from_secs(60));

    let mut sub = cache.subscribe(cars_list(), ()).unwrap();
    let settled = sub.changed().await.unwrap();
    assert_eq!(settled.status, QueryStatus::Success);

    cache.invalidate(&[Tag::list(ResourceKind::Cars)]);
    assert_eq!(sub.changed().await.unwrap().status, QueryStatus::Stale);
}

#[tokio::test(start_paused = true)]
async fn reset_discards_in_flight_results() {
    let transport = Arc::new(growing_fleet().with_delay(Duration::from_millis(100)));
    let cache = cache_over(&transport, Duration::from_secs(60));

    let sub = cache.subscribe(cars_list(), ()).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    cache.reset();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let state = sub.state();
    assert_eq!(state.status, QueryStatus::Idle);
    assert!(state.data.is_none());
    assert!(cache.store().table::<Car>().is_empty());
}
