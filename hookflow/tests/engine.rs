use hookflow::{Engine, EngineError, HookContext, PageData, Plugin, RegistryError, WILDCARD};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

mod common;
use common::{foo_baz, init_tracing, patching, recording};

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_duplicate_namespace_keeps_first() {
    init_tracing();
    let (first, seen_first) = recording("dup", "track");
    let (second, seen_second) = recording("dup", "track");
    let engine = Engine::new([first, second]);

    assert_eq!(engine.plugins(), vec!["dup"]);
    engine.track("click", None, None).await.unwrap();
    assert_eq!(seen_first.count(), 1);
    assert_eq!(seen_second.count(), 0);
}

#[test]
fn test_try_plugin_reports_duplicate() {
    let mut builder = Engine::builder();
    builder.try_plugin(Plugin::new("a")).unwrap();
    let err = builder.try_plugin(Plugin::new("a")).unwrap_err();
    assert_eq!(err, RegistryError::DuplicateNamespace("a".into()));
}

#[tokio::test]
async fn test_add_plugin_appends() {
    let engine = Engine::new([patching("a", "trackStart", json!({"a": true}))]);
    let (late, seen) = recording("late", "track");

    engine.add_plugin(late).unwrap();

    assert_eq!(engine.plugins(), vec!["a", "late"]);
    engine.track("click", None, None).await.unwrap();
    assert_eq!(seen.last().unwrap().get("a"), Some(&json!(true)));
}

#[test]
fn test_add_plugin_rejects_duplicate() {
    let engine = Engine::new([Plugin::new("a")]);
    let err = engine.add_plugin(Plugin::new("a")).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Registry(RegistryError::DuplicateNamespace(_))
    ));
}

#[tokio::test]
async fn test_in_flight_dispatch_keeps_its_snapshot() {
    let gate = Arc::new(tokio::sync::Notify::new());
    let release = gate.clone();
    let engine = Engine::new([Plugin::new("slow").hook("trackStart", move |_ctx: HookContext| {
        let gate = gate.clone();
        async move { gate.notified().await }
    })]);
    let (late, seen) = recording("late", "track");

    let running = tokio::spawn({
        let engine = engine.clone();
        async move { engine.track("click", None, None).await }
    });
    tokio::task::yield_now().await;
    engine.add_plugin(late).unwrap();
    release.notify_one();
    running.await.unwrap().unwrap();

    assert_eq!(seen.count(), 0);
    release.notify_one();
    engine.track("click", None, None).await.unwrap();
    assert_eq!(seen.count(), 1);
}

// ============================================================================
// Enable / disable
// ============================================================================

#[tokio::test]
async fn test_disabled_plugin_is_skipped_everywhere() {
    let (dest, seen) = recording("dest", "track");
    let engine = Engine::new([
        Plugin::new("muted")
            .hook_fn("trackStart", |_ctx: HookContext| json!({"muted": true}))
            .hook_fn("track:dest", |_ctx: HookContext| json!({"enriched": true})),
        dest,
    ]);

    engine.disable_plugin("muted").unwrap();
    assert_eq!(engine.is_enabled("muted"), Some(false));
    assert_eq!(engine.plugins(), vec!["muted", "dest"]);

    engine.track("click", None, None).await.unwrap();
    let delivered = seen.last().unwrap();
    assert!(!delivered.contains_key("muted"));
    assert!(!delivered.contains_key("enriched"));

    engine.enable_plugin("muted").unwrap();
    engine.track("click", None, None).await.unwrap();
    assert!(seen.last().unwrap().contains_key("enriched"));
}

#[test]
fn test_toggle_unknown_plugin_fails() {
    let engine = Engine::builder().build();
    let err = engine.disable_plugin("ghost").unwrap_err();
    assert!(matches!(err, EngineError::UnknownPlugin(ns) if ns == "ghost"));
    assert_eq!(engine.is_enabled("ghost"), None);
}

// ============================================================================
// Identity
// ============================================================================

#[tokio::test]
async fn test_identify_updates_identity() {
    let (dest, seen) = recording("dest", "track");
    let engine = Engine::new([
        patching("crm", "identifyStart", json!({"traits": {"plan": "pro"}})),
        dest,
    ]);
    let anonymous_id = engine.user().anonymous_id;

    engine.identify("u-42", Some(json!({"plan": "free"})), None).await.unwrap();

    let user = engine.user();
    assert_eq!(user.user_id.as_deref(), Some("u-42"));
    assert_eq!(user.traits.get("plan"), Some(&json!("pro")));
    assert_eq!(user.anonymous_id, anonymous_id);

    engine.track("click", None, None).await.unwrap();
    assert_eq!(seen.last().unwrap().get_str("userId"), Some("u-42"));
}

#[tokio::test]
async fn test_reset_clears_identity_after_dispatch() {
    let (watcher, seen) = recording("watcher", "reset");
    let engine = Engine::new([watcher]);
    engine.identify("u-42", None, None).await.unwrap();
    let anonymous_id = engine.user().anonymous_id;

    engine.reset().await.unwrap();

    assert_eq!(seen.last().unwrap().get_str("userId"), Some("u-42"));
    let user = engine.user();
    assert!(user.user_id.is_none());
    assert_ne!(user.anonymous_id, anonymous_id);
}

#[tokio::test]
async fn test_page_seeds_page_data() {
    let (dest, seen) = recording("dest", "page");
    let engine = Engine::new([dest]);

    engine
        .page(
            PageData::new("https://example.com/docs").with_title("Docs"),
            None,
        )
        .await
        .unwrap();

    let properties = seen.last().unwrap().get("properties").cloned().unwrap();
    assert_eq!(
        properties,
        json!({"url": "https://example.com/docs", "title": "Docs"})
    );
}

// ============================================================================
// Subscriptions
// ============================================================================

#[tokio::test]
async fn test_listeners_receive_final_payload() {
    let engine = Engine::new([patching("a", "trackComplete", foo_baz())]);
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    engine.on("track", move |payload| sink.lock().push(payload.clone()));

    engine.track("click", None, None).await.unwrap();
    engine.initialize().await.unwrap();

    let received = received.lock();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].get_str("foo"), Some("baz"));
}

#[tokio::test]
async fn test_once_wildcard_and_off() {
    let engine = Engine::builder().build();
    let once_hits = Arc::new(AtomicUsize::new(0));
    let all_hits = Arc::new(AtomicUsize::new(0));

    let hits = once_hits.clone();
    engine.once("track", move |_payload| {
        hits.fetch_add(1, Ordering::SeqCst);
    });
    let hits = all_hits.clone();
    let id = engine.on(WILDCARD, move |_payload| {
        hits.fetch_add(1, Ordering::SeqCst);
    });

    engine.track("a", None, None).await.unwrap();
    engine.track("b", None, None).await.unwrap();
    engine.initialize().await.unwrap();
    assert!(engine.off(id));
    engine.initialize().await.unwrap();

    assert_eq!(once_hits.load(Ordering::SeqCst), 1);
    assert_eq!(all_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_listeners_skip_rejected_dispatches() {
    let engine = Engine::builder().build();
    let hits = Arc::new(AtomicUsize::new(0));
    let counted = hits.clone();
    engine.on(WILDCARD, move |_payload| {
        counted.fetch_add(1, Ordering::SeqCst);
    });

    assert!(engine.dispatch("track", json!({})).await.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispatches_are_independent() {
    let engine = Engine::new([Plugin::new("echo").hook_fn("trackStart", |ctx: HookContext| {
        json!({"echo": ctx.payload.get_str("event")})
    })]);

    let runs = (0..16).map(|i| {
        let engine = engine.clone();
        tokio::spawn(async move { engine.track(format!("e{i}"), None, None).await })
    });
    let payloads = futures::future::join_all(runs).await;

    for (i, payload) in payloads.into_iter().enumerate() {
        let payload = payload.unwrap().unwrap();
        assert_eq!(payload.get_str("echo"), Some(format!("e{i}").as_str()));
    }
}
