use std::future::Future;

use super::TestResult;
use crate::record::OutboxRecord;
use crate::traits::{OutboxRepository, Store};

fn make_event(id: &str, topic: &str) -> OutboxRecord {
    OutboxRecord {
        id: id.to_string(),
        topic: topic.to_string(),
        occurred_at: "2024-03-01T09:00:00Z".to_string(),
        payload: serde_json::json!({"convention_id": "conv-1"}),
    }
}

pub(super) async fn run_outbox_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "outbox",
        "empty_outbox_has_no_pending_events",
        empty_outbox_has_no_pending_events(factory).await,
    ));
    results.push(TestResult::from_result(
        "outbox",
        "queued_events_preserve_order",
        queued_events_preserve_order(factory).await,
    ));

    results
}

async fn empty_outbox_has_no_pending_events<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let pending = store.pending_events().await.map_err(|e| e.to_string())?;
    if !pending.is_empty() {
        return Err(format!("expected empty outbox, got {}", pending.len()));
    }
    Ok(())
}

async fn queued_events_preserve_order<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    store
        .queue_event(&make_event("e1", "ConventionPartiallySigned"))
        .await
        .map_err(|e| e.to_string())?;
    store
        .queue_event(&make_event("e2", "ConventionFullySigned"))
        .await
        .map_err(|e| e.to_string())?;

    let pending = store.pending_events().await.map_err(|e| e.to_string())?;
    let topics: Vec<&str> = pending.iter().map(|e| e.topic.as_str()).collect();
    if topics != ["ConventionPartiallySigned", "ConventionFullySigned"] {
        return Err(format!("unexpected order: {topics:?}"));
    }
    Ok(())
}
