use std::future::Future;

use time::macros::datetime;

use super::{make_agency, make_convention, TestResult};
use crate::error::StorageError;
use crate::traits::{AgencyRepository, ConventionQueries, ConventionRepository, Store};

pub(super) async fn run_convention_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "conventions",
        "get_unknown_id_is_typed_absence",
        get_unknown_id_is_typed_absence(factory).await,
    ));
    results.push(TestResult::from_result(
        "conventions",
        "insert_then_get_round_trips",
        insert_then_get_round_trips(factory).await,
    ));
    results.push(TestResult::from_result(
        "conventions",
        "update_unknown_id_returns_none",
        update_unknown_id_returns_none(factory).await,
    ));
    results.push(TestResult::from_result(
        "conventions",
        "update_with_stale_updated_at_is_conflict",
        update_with_stale_updated_at_is_conflict(factory).await,
    ));
    results.push(TestResult::from_result(
        "conventions",
        "conflicting_update_leaves_stored_row_unchanged",
        conflicting_update_leaves_stored_row_unchanged(factory).await,
    ));
    results.push(TestResult::from_result(
        "conventions",
        "read_model_includes_agency_delegation",
        read_model_includes_agency_delegation(factory).await,
    ));

    results
}

async fn get_unknown_id_is_typed_absence<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    match store.get_by_id("conv-ghost").await {
        Ok(None) => Ok(()),
        Ok(Some(_)) => Err("expected None for unknown id".to_string()),
        Err(e) => Err(format!("expected Ok(None), got error: {e}")),
    }
}

async fn insert_then_get_round_trips<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let convention = make_convention("conv-1", "agency-1");
    store.insert(&convention).await.map_err(|e| e.to_string())?;
    let loaded = store
        .get_by_id("conv-1")
        .await
        .map_err(|e| e.to_string())?
        .ok_or("inserted convention not readable")?;
    if loaded != convention {
        return Err("loaded convention differs from inserted".to_string());
    }
    Ok(())
}

async fn update_unknown_id_returns_none<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let convention = make_convention("conv-ghost", "agency-1");
    match store.update(&convention, convention.updated_at).await {
        Ok(None) => Ok(()),
        Ok(Some(id)) => Err(format!("expected None, got id '{id}'")),
        Err(e) => Err(format!("expected Ok(None), got error: {e}")),
    }
}

async fn update_with_stale_updated_at_is_conflict<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let convention = make_convention("conv-1", "agency-1");
    store.insert(&convention).await.map_err(|e| e.to_string())?;

    let mut edited = convention.clone();
    edited.updated_at = datetime!(2024-03-02 10:00 UTC);
    let stale = datetime!(2024-02-01 00:00 UTC);
    match store.update(&edited, stale).await {
        Err(StorageError::ConcurrentConflict { convention_id, .. }) if convention_id == "conv-1" => {
            Ok(())
        }
        Err(e) => Err(format!("expected ConcurrentConflict, got: {e}")),
        Ok(_) => Err("stale update was accepted".to_string()),
    }
}

async fn conflicting_update_leaves_stored_row_unchanged<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let convention = make_convention("conv-1", "agency-1");
    store.insert(&convention).await.map_err(|e| e.to_string())?;

    // Winner writes first.
    let mut winner = convention.clone();
    winner.updated_at = datetime!(2024-03-02 10:00 UTC);
    winner.status_justification = Some("winner".to_string());
    store
        .update(&winner, convention.updated_at)
        .await
        .map_err(|e| e.to_string())?;

    // Loser still presents the original updated_at.
    let mut loser = convention.clone();
    loser.updated_at = datetime!(2024-03-02 11:00 UTC);
    loser.status_justification = Some("loser".to_string());
    if store.update(&loser, convention.updated_at).await.is_ok() {
        return Err("second writer with stale updated_at was accepted".to_string());
    }

    let stored = store
        .get_by_id("conv-1")
        .await
        .map_err(|e| e.to_string())?
        .ok_or("convention vanished")?;
    if stored.status_justification.as_deref() != Some("winner") {
        return Err("stored row does not reflect the winning write".to_string());
    }
    Ok(())
}

async fn read_model_includes_agency_delegation<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    store
        .insert(&make_convention("conv-1", "agency-1"))
        .await
        .map_err(|e| e.to_string())?;
    store
        .insert_agency(&make_agency("agency-1", Some("agency-parent")))
        .await
        .map_err(|e| e.to_string())?;

    let read = store
        .get_convention_read_model("conv-1")
        .await
        .map_err(|e| e.to_string())?
        .ok_or("read model missing")?;
    if read.agency_refers_to.as_deref() != Some("agency-parent") {
        return Err("read model does not carry the agency delegation".to_string());
    }
    Ok(())
}
