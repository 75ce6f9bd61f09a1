use std::future::Future;

use super::TestResult;
use crate::record::{NotificationRecord, Recipient};
use crate::traits::{NotificationRepository, Store};

fn make_notification(id: &str, kind: &str, recipient: &Recipient, at: &str) -> NotificationRecord {
    NotificationRecord {
        id: id.to_string(),
        kind: kind.to_string(),
        convention_id: "conv-1".to_string(),
        recipient: recipient.clone(),
        created_at: at.to_string(),
    }
}

pub(super) async fn run_notification_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "notifications",
        "no_history_yields_none",
        no_history_yields_none(factory).await,
    ));
    results.push(TestResult::from_result(
        "notifications",
        "last_of_kind_returns_most_recent",
        last_of_kind_returns_most_recent(factory).await,
    ));
    results.push(TestResult::from_result(
        "notifications",
        "kind_and_recipient_are_both_discriminating",
        kind_and_recipient_are_both_discriminating(factory).await,
    ));

    results
}

async fn no_history_yields_none<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let recipient = Recipient::Email("bob@beneficiary.example".to_string());
    match store
        .last_of_kind("signature-reminder", "conv-1", &recipient)
        .await
    {
        Ok(None) => Ok(()),
        Ok(Some(_)) => Err("expected no notification history".to_string()),
        Err(e) => Err(format!("expected Ok(None), got error: {e}")),
    }
}

async fn last_of_kind_returns_most_recent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let recipient = Recipient::Sms("0612345678".to_string());
    for (id, at) in [
        ("n1", "2024-03-01T09:00:00Z"),
        ("n3", "2024-03-03T09:00:00Z"),
        ("n2", "2024-03-02T09:00:00Z"),
    ] {
        store
            .save_notification(&make_notification(id, "signature-reminder", &recipient, at))
            .await
            .map_err(|e| e.to_string())?;
    }
    let last = store
        .last_of_kind("signature-reminder", "conv-1", &recipient)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("no notification found")?;
    if last.id != "n3" {
        return Err(format!("expected most recent 'n3', got '{}'", last.id));
    }
    Ok(())
}

async fn kind_and_recipient_are_both_discriminating<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let bob = Recipient::Email("bob@beneficiary.example".to_string());
    let rep = Recipient::Email("rep@establishment.example".to_string());

    store
        .save_notification(&make_notification(
            "n1",
            "signature-reminder",
            &bob,
            "2024-03-01T09:00:00Z",
        ))
        .await
        .map_err(|e| e.to_string())?;
    store
        .save_notification(&make_notification(
            "n2",
            "assessment-link-reminder",
            &bob,
            "2024-03-02T09:00:00Z",
        ))
        .await
        .map_err(|e| e.to_string())?;

    let last = store
        .last_of_kind("signature-reminder", "conv-1", &bob)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("no notification found")?;
    if last.id != "n1" {
        return Err("another kind shadowed the queried one".to_string());
    }
    if store
        .last_of_kind("signature-reminder", "conv-1", &rep)
        .await
        .map_err(|e| e.to_string())?
        .is_some()
    {
        return Err("another recipient's history leaked".to_string());
    }
    Ok(())
}
