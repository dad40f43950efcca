mod common;

use std::sync::Arc;

use common::{ok_text, MockTransport};
use offsync::prelude::*;

const INDEX: &str = "https://app.example.com/index.html";
const APP_JS: &str = "https://app.example.com/js/app.js";
const MAIN_CSS: &str = "https://app.example.com/css/main.css";

fn memory_store() -> AbstractBucketStore {
    Arc::new(MemoryBucketStore::new())
}

fn lifecycle(
    store: &AbstractBucketStore,
    transport: &Arc<MockTransport>,
    tag: &str,
    manifest: &[&str],
) -> Lifecycle {
    Lifecycle::new(
        Arc::clone(store),
        Arc::clone(transport) as AbstractTransport,
        VersionTag::new(tag),
        manifest.iter().map(|s| s.to_string()).collect(),
    )
}

#[tokio::test]
async fn install_seeds_every_manifest_asset() {
    let transport = MockTransport::new();
    transport.route(INDEX, ok_text("<html>"));
    transport.route(APP_JS, ok_text("alert(1)"));
    transport.route(MAIN_CSS, ok_text("body{}"));
    let store = memory_store();

    let lifecycle =
        lifecycle(&store, &transport, "v2", &[INDEX, APP_JS, MAIN_CSS]);
    assert_eq!(lifecycle.state(), LifecycleState::Installing);

    let seeded = lifecycle.install().await.unwrap();
    assert_eq!(seeded, 3);
    assert_eq!(lifecycle.state(), LifecycleState::Waiting);

    assert_eq!(store.keys("v2-static").await.unwrap().len(), 3);
    let entry = store
        .get("v2-static", &RequestKey::new(Method::Get, APP_JS))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.response.text(), "alert(1)");
}

#[tokio::test]
async fn install_is_all_or_nothing_on_http_error() {
    let transport = MockTransport::new();
    transport.route(INDEX, ok_text("<html>"));
    // APP_JS unrouted: the mock answers 404
    let store = memory_store();

    let lifecycle = lifecycle(&store, &transport, "v2", &[INDEX, APP_JS]);
    let res = lifecycle.install().await;

    assert!(matches!(res, Err(EngineError::InstallFailed { .. })));
    assert_eq!(lifecycle.state(), LifecycleState::Installing);
    // nothing was written: the previous generation stays in service
    assert!(store.keys("v2-static").await.unwrap().is_empty());
    assert!(store.buckets().await.unwrap().is_empty());
}

#[tokio::test]
async fn install_is_all_or_nothing_on_connectivity_failure() {
    let transport = MockTransport::new();
    transport.set_offline(true);
    let store = memory_store();

    let lifecycle = lifecycle(&store, &transport, "v2", &[INDEX]);
    let res = lifecycle.install().await;

    assert!(matches!(res, Err(EngineError::InstallFailed { .. })));
    assert_eq!(lifecycle.state(), LifecycleState::Installing);
    assert!(store.buckets().await.unwrap().is_empty());
}

#[tokio::test]
async fn activate_evicts_buckets_of_older_generations() {
    let transport = MockTransport::new();
    transport.route(INDEX, ok_text("<html v2>"));
    let store = memory_store();

    // previous generation still present
    let old_key = RequestKey::new(Method::Get, INDEX);
    store.put("v1-static", &old_key, ok_text("<html v1>")).await.unwrap();
    store.put("v1-dynamic", &old_key, ok_text("{}")).await.unwrap();

    let lifecycle = lifecycle(&store, &transport, "v2", &[INDEX]);
    lifecycle.install().await.unwrap();

    // double-buffering: the old generation is untouched until activation
    assert!(store.get("v1-static", &old_key).await.unwrap().is_some());

    let mut evicted = lifecycle.activate().await.unwrap();
    evicted.sort();
    assert_eq!(evicted, vec!["v1-dynamic", "v1-static"]);
    assert_eq!(lifecycle.state(), LifecycleState::Active);

    let buckets = store.buckets().await.unwrap();
    assert!(!buckets.contains(&"v1-static".to_string()));
    assert!(buckets.contains(&"v2-static".to_string()));
    assert!(store.get("v2-static", &old_key).await.unwrap().is_some());
}

#[tokio::test]
async fn activate_requires_a_completed_install() {
    let transport = MockTransport::new();
    let store = memory_store();

    let lifecycle = lifecycle(&store, &transport, "v2", &[]);
    let res = lifecycle.activate().await;
    assert!(matches!(
        res,
        Err(EngineError::InvalidState {
            expected: "waiting",
            ..
        })
    ));
}

#[tokio::test]
async fn install_cannot_run_twice() {
    let transport = MockTransport::new();
    let store = memory_store();

    let lifecycle = lifecycle(&store, &transport, "v2", &[]);
    lifecycle.install().await.unwrap();

    let res = lifecycle.install().await;
    assert!(matches!(
        res,
        Err(EngineError::InvalidState {
            expected: "installing",
            ..
        })
    ));
}

#[tokio::test]
async fn supersede_marks_the_generation_replaced() {
    let transport = MockTransport::new();
    let store = memory_store();

    let lifecycle = lifecycle(&store, &transport, "v1", &[]);
    lifecycle.install().await.unwrap();
    lifecycle.activate().await.unwrap();

    lifecycle.supersede();
    assert_eq!(lifecycle.state(), LifecycleState::Superseded);
}
