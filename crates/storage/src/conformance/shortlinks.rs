use std::future::Future;

use super::TestResult;
use crate::error::StorageError;
use crate::record::ShortLinkRecord;
use crate::traits::{ShortLinkRepository, Store};

fn make_link(id: &str, single_use: bool) -> ShortLinkRecord {
    ShortLinkRecord {
        id: id.to_string(),
        long_url: "https://immersion.example/sign?jwt=abc".to_string(),
        single_use,
        created_at: "2024-03-01T09:00:00Z".to_string(),
    }
}

pub(super) async fn run_shortlink_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "shortlinks",
        "resolve_unknown_id_is_typed_absence",
        resolve_unknown_id_is_typed_absence(factory).await,
    ));
    results.push(TestResult::from_result(
        "shortlinks",
        "save_is_write_once",
        save_is_write_once(factory).await,
    ));
    results.push(TestResult::from_result(
        "shortlinks",
        "reusable_link_resolves_many_times",
        reusable_link_resolves_many_times(factory).await,
    ));
    results.push(TestResult::from_result(
        "shortlinks",
        "single_use_link_resolves_exactly_once",
        single_use_link_resolves_exactly_once(factory).await,
    ));

    results
}

async fn resolve_unknown_id_is_typed_absence<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    match store.resolve("nope").await {
        Ok(None) => Ok(()),
        Ok(Some(_)) => Err("expected None for unknown short id".to_string()),
        Err(e) => Err(format!("expected Ok(None), got error: {e}")),
    }
}

async fn save_is_write_once<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    store
        .save_short_link(&make_link("abc123", false))
        .await
        .map_err(|e| e.to_string())?;
    match store.save_short_link(&make_link("abc123", false)).await {
        Err(StorageError::ShortLinkExists { short_id }) if short_id == "abc123" => Ok(()),
        Err(e) => Err(format!("expected ShortLinkExists, got: {e}")),
        Ok(()) => Err("duplicate save was accepted".to_string()),
    }
}

async fn reusable_link_resolves_many_times<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    store
        .save_short_link(&make_link("abc123", false))
        .await
        .map_err(|e| e.to_string())?;
    for _ in 0..3 {
        let record = store
            .resolve("abc123")
            .await
            .map_err(|e| e.to_string())?
            .ok_or("link vanished")?;
        if record.long_url != "https://immersion.example/sign?jwt=abc" {
            return Err("resolved long_url differs".to_string());
        }
    }
    Ok(())
}

async fn single_use_link_resolves_exactly_once<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    store
        .save_short_link(&make_link("once01", true))
        .await
        .map_err(|e| e.to_string())?;
    store
        .resolve("once01")
        .await
        .map_err(|e| e.to_string())?
        .ok_or("first resolution missing")?;
    match store.resolve("once01").await {
        Err(StorageError::ShortLinkConsumed { short_id }) if short_id == "once01" => Ok(()),
        Err(e) => Err(format!("expected ShortLinkConsumed, got: {e}")),
        Ok(_) => Err("second resolution of a single-use link succeeded".to_string()),
    }
}
