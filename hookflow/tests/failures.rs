use hookflow::{
    Engine, EngineError, FailurePolicy, HookContext, Payload, Plugin, SeedError,
    testing::{failing, panicking},
};
use serde_json::json;

mod common;
use common::{init_tracing, patching, recording};

#[tokio::test]
async fn test_failing_phase_step_is_isolated() {
    init_tracing();
    let (watcher, seen) = recording("watcher", "trackStart");
    let engine = Engine::new([
        patching("a", "trackStart", json!({"a": 1})),
        Plugin::new("broken").hook("trackStart", failing("boom")),
        watcher,
    ]);

    let done = engine
        .dispatch("track", json!({"event": "click"}))
        .await
        .unwrap();

    assert_eq!(seen.last().unwrap().get("a"), Some(&json!(1)));
    assert_eq!(done.failures.len(), 1);
    let failure = &done.failures[0];
    assert_eq!(failure.namespace, "broken");
    assert_eq!(failure.hook, "trackStart");
    assert!(failure.to_string().contains("boom"));
}

#[tokio::test]
async fn test_failing_delivery_does_not_stop_others() {
    let (healthy, seen) = recording("healthy", "track");
    let engine = Engine::new([
        Plugin::new("down").hook("track", failing("unreachable")),
        healthy,
    ]);

    let done = engine
        .dispatch("track", json!({"event": "click"}))
        .await
        .unwrap();

    assert_eq!(seen.count(), 1);
    assert_eq!(done.failures[0].namespace, "down");
}

#[tokio::test]
async fn test_panicking_handler_is_isolated() {
    let (after, seen) = recording("after", "trackStart");
    let engine = Engine::new([
        Plugin::new("bad").hook("trackStart", panicking("handler bug")),
        after,
    ]);

    let done = engine
        .dispatch("track", json!({"event": "click"}))
        .await
        .unwrap();

    assert_eq!(seen.count(), 1);
    assert!(done.failures[0].is_panic());
    assert!(done.failures[0].to_string().contains("handler bug"));
}

#[tokio::test]
async fn test_malformed_result_is_isolated() {
    let (after, seen) = recording("after", "trackStart");
    let engine = Engine::new([patching("scalar", "trackStart", json!(42)), after]);

    let done = engine
        .dispatch("track", json!({"event": "click"}))
        .await
        .unwrap();

    let observed = seen.last().unwrap();
    assert_eq!(observed.get_str("event"), Some("click"));
    assert!(done.failures[0].is_malformed());
    assert_eq!(done.payload.action(), Some("track"));
}

#[tokio::test]
async fn test_failing_enrichment_falls_back_to_ready_payload() {
    let (dest, seen) = recording("dest", "track");
    let engine = Engine::new([
        Plugin::new("enrich").hook("track:dest", failing("lookup failed")),
        dest,
    ]);

    let done = engine
        .dispatch("track", json!({"event": "click"}))
        .await
        .unwrap();

    assert_eq!(seen.count(), 1);
    assert_eq!(done.failures[0].hook, "track:dest");
}

#[tokio::test]
async fn test_fail_fast_rejects_dispatch() {
    let (dest, seen) = recording("dest", "track");
    let engine = Engine::builder()
        .failure_policy(FailurePolicy::FailFast)
        .plugin(Plugin::new("broken").hook("trackStart", failing("boom")))
        .plugin(dest)
        .build();

    let err = engine.track("click", None, None).await.unwrap_err();

    let failure = err.as_handler_failure().unwrap();
    assert_eq!(failure.namespace, "broken");
    assert_eq!(seen.count(), 0);
}

#[tokio::test]
async fn test_seed_failure_rejects_before_any_handler() {
    let (dest, seen) = recording("dest", "trackStart");
    let engine = Engine::new([dest]);

    let err = engine
        .dispatch("track", json!({"properties": {}}))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Seed(SeedError::MissingArgument { name: "event", .. })
    ));
    assert_eq!(seen.count(), 0);
}

#[tokio::test]
async fn test_non_object_arguments_are_rejected() {
    let engine = Engine::builder().build();

    let err = engine.dispatch("track", json!([1, 2])).await.unwrap_err();

    assert!(matches!(
        err,
        EngineError::Seed(SeedError::InvalidArguments { .. })
    ));
}

#[tokio::test]
async fn test_custom_seed_rule_failure_rejects() {
    let engine = Engine::builder()
        .seed_rule("purchase", |input: &hookflow::SeedInput<'_>| -> Result<Payload, SeedError> {
            match input.args.get("total") {
                Some(total) if total.is_number() => {
                    Ok(Payload::new(input.action).with("total", total.clone()))
                }
                _ => Err(SeedError::MissingArgument {
                    action: input.action.to_string(),
                    name: "total",
                }),
            }
        })
        .plugin(Plugin::new("dest").hook_fn("purchase", |_ctx: HookContext| {}))
        .build();

    assert!(engine.dispatch("purchase", json!({})).await.is_err());
    let done = engine
        .dispatch("purchase", json!({"total": 9.5}))
        .await
        .unwrap();
    assert_eq!(done.payload.get("total"), Some(&json!(9.5)));
}

#[tokio::test]
async fn test_malformed_delivery_return_is_reported() {
    let (other, seen) = recording("other", "track");
    let engine = Engine::new([patching("odd", "track", json!("not a patch")), other]);

    let done = engine
        .dispatch("track", json!({"event": "click"}))
        .await
        .unwrap();

    assert_eq!(seen.count(), 1);
    assert_eq!(done.failures.len(), 1);
    assert_eq!(done.failures[0].namespace, "odd");
    assert!(done.failures[0].is_malformed());
}
