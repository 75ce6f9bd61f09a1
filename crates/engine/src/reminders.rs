//! Reminder throttling and notification fan-out.
//!
//! Reminder state is not stored directly: it is reconstructed from the
//! notification history by asking "when was the last notification of
//! this kind to this recipient for this convention". Each call site
//! passes its own cool-down, so the windows can differ per kind.
//!
//! Fan-out over signatories is the one place errors are recovered
//! locally: each recipient is attempted independently and failures are
//! aggregated into a per-recipient map instead of aborting siblings.

use std::collections::BTreeMap;

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use convene_core::{resolve_roles, Actor, Credential, Role};
use convene_storage::{
    NotificationRecord, NotificationRepository, Recipient, Store,
};
use convene_links::LinkLifetime;

use crate::engine::{random_id, Engine};
use crate::error::EngineError;

/// Initial signature invitation.
pub const SIGNATURE_LINK_KIND: &str = "signature-link";
/// Nudge to signatories who have not signed yet. 24h window.
pub const SIGNATURE_REMINDER_KIND: &str = "signature-reminder";
/// Nudge to the tutor to fill the assessment. 24h window.
pub const ASSESSMENT_LINK_REMINDER_KIND: &str = "assessment-link-reminder";

/// Front-end route signature links land on.
const SIGN_ROUTE: &str = "signer-convention";

/// Checks the notification history before a reminder goes out.
pub struct ReminderThrottle<'a, S> {
    store: &'a S,
}

impl<'a, S: NotificationRepository> ReminderThrottle<'a, S> {
    pub fn new(store: &'a S) -> Self {
        ReminderThrottle { store }
    }

    /// Fail with [`EngineError::Throttled`] if a notification of `kind`
    /// went to `recipient` for this convention within the last
    /// `cooldown_hours`.
    pub async fn assert_not_recently_sent(
        &self,
        kind: &str,
        convention_id: &str,
        recipient: &Recipient,
        cooldown_hours: i64,
        now: OffsetDateTime,
    ) -> Result<(), EngineError> {
        let last = self
            .store
            .last_of_kind(kind, convention_id, recipient)
            .await?;
        let Some(last) = last else {
            return Ok(());
        };
        let sent_at = OffsetDateTime::parse(&last.created_at, &Rfc3339)
            .map_err(|e| convene_storage::StorageError::Backend(e.to_string()))?;
        let cooldown = Duration::hours(cooldown_hours);
        let elapsed = now - sent_at;
        if elapsed < cooldown {
            return Err(EngineError::Throttled {
                kind: kind.to_string(),
                recipient: recipient.address().to_string(),
                remaining: cooldown - elapsed,
            });
        }
        Ok(())
    }
}

/// One link successfully prepared for a recipient.
#[derive(Debug, Clone, Serialize)]
pub struct SentLink {
    pub role: Role,
    pub email: String,
    /// Full magic-link URL, for the email body.
    pub long_url: String,
    /// Short URL, present when the recipient has a phone for SMS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_url: Option<String>,
}

/// Aggregate outcome of a fan-out: successes plus a per-recipient error
/// map keyed by email address.
#[derive(Debug, Clone, Serialize, Default)]
pub struct FanOutReport {
    pub sent: Vec<SentLink>,
    pub errors: BTreeMap<String, String>,
}

impl<S: Store> Engine<S> {
    /// Send the initial signature link to every unsigned signatory.
    pub async fn send_signature_links(
        &self,
        convention_id: &str,
        credential: &Credential,
    ) -> Result<FanOutReport, EngineError> {
        self.fan_out_signature_notifications(convention_id, credential, SIGNATURE_LINK_KIND, 24)
            .await
    }

    /// Re-send signature links to signatories who still have not
    /// signed, throttled per recipient.
    pub async fn send_signature_reminders(
        &self,
        convention_id: &str,
        credential: &Credential,
        cooldown_hours: i64,
    ) -> Result<FanOutReport, EngineError> {
        self.fan_out_signature_notifications(
            convention_id,
            credential,
            SIGNATURE_REMINDER_KIND,
            cooldown_hours,
        )
        .await
    }

    async fn fan_out_signature_notifications(
        &self,
        convention_id: &str,
        credential: &Credential,
        kind: &str,
        cooldown_hours: i64,
    ) -> Result<FanOutReport, EngineError> {
        let convention = self.load_convention(convention_id).await?;
        let user = self.load_credential_user(credential).await?;
        // Any resolved role may trigger notifications; resolution itself
        // rejects strangers.
        resolve_roles(credential, &convention, user.as_ref())?;

        let now = self.now();
        let unsigned: Vec<Actor> = convention
            .signatories
            .unsigned()
            .into_iter()
            .cloned()
            .collect();

        let mut report = FanOutReport::default();
        for actor in unsigned {
            match self
                .notify_one_signatory(&convention.id, &actor, kind, cooldown_hours, now)
                .await
            {
                Ok(link) => report.sent.push(link),
                Err(e) => {
                    tracing::warn!(
                        convention_id = %convention.id,
                        recipient = %actor.email,
                        error = %e,
                        "signature notification failed"
                    );
                    report.errors.insert(actor.email.clone(), e.to_string());
                }
            }
        }
        Ok(report)
    }

    /// Prepare and record one recipient's notification. Failures stay
    /// local to this recipient.
    async fn notify_one_signatory(
        &self,
        convention_id: &str,
        actor: &Actor,
        kind: &str,
        cooldown_hours: i64,
        now: OffsetDateTime,
    ) -> Result<SentLink, EngineError> {
        let throttle = ReminderThrottle::new(self.store.as_ref());
        let email_recipient = Recipient::Email(actor.email.clone());
        throttle
            .assert_not_recently_sent(kind, convention_id, &email_recipient, cooldown_hours, now)
            .await?;

        let token = self.tokens.issue_for_convention(
            convention_id,
            actor.role,
            &actor.email,
            SIGN_ROUTE,
            LinkLifetime::Short,
            now,
        );
        let long_url = self.tokens.link_url(SIGN_ROUTE, &token);

        let created_at = now.format(&Rfc3339).unwrap_or_default();
        self.store
            .save_notification(&NotificationRecord {
                id: random_id(),
                kind: kind.to_string(),
                convention_id: convention_id.to_string(),
                recipient: email_recipient,
                created_at: created_at.clone(),
            })
            .await?;

        let mut short_url = None;
        if let Some(phone) = &actor.phone {
            let sms_recipient = Recipient::Sms(phone.clone());
            throttle
                .assert_not_recently_sent(kind, convention_id, &sms_recipient, cooldown_hours, now)
                .await?;
            short_url = Some(self.short_links.shorten(&long_url, false, now).await?);
            self.store
                .save_notification(&NotificationRecord {
                    id: random_id(),
                    kind: kind.to_string(),
                    convention_id: convention_id.to_string(),
                    recipient: sms_recipient,
                    created_at,
                })
                .await?;
        }

        Ok(SentLink {
            role: actor.role,
            email: actor.email.clone(),
            long_url,
            short_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convene_storage::InMemoryStore;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-03-02 10:00 UTC);

    async fn store_with_reminder_at(at: &str) -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .save_notification(&NotificationRecord {
                id: "n1".to_string(),
                kind: SIGNATURE_REMINDER_KIND.to_string(),
                convention_id: "conv-1".to_string(),
                recipient: Recipient::Email("bob@beneficiary.example".to_string()),
                created_at: at.to_string(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn fresh_recipient_is_not_throttled() {
        let store = InMemoryStore::new();
        let throttle = ReminderThrottle::new(&store);
        throttle
            .assert_not_recently_sent(
                SIGNATURE_REMINDER_KIND,
                "conv-1",
                &Recipient::Email("bob@beneficiary.example".to_string()),
                24,
                NOW,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reminder_within_cooldown_is_throttled_with_remaining_wait() {
        // Sent 20h ago with a 24h window: 4h00 remain.
        let store = store_with_reminder_at("2024-03-01T14:00:00Z").await;
        let throttle = ReminderThrottle::new(&store);
        let err = throttle
            .assert_not_recently_sent(
                SIGNATURE_REMINDER_KIND,
                "conv-1",
                &Recipient::Email("bob@beneficiary.example".to_string()),
                24,
                NOW,
            )
            .await
            .unwrap_err();
        match err {
            EngineError::Throttled { remaining, .. } => {
                assert_eq!(remaining, Duration::hours(4));
            }
            other => panic!("expected Throttled, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cooldown_boundary_is_exclusive() {
        let throttle_store = store_with_reminder_at("2024-03-01T10:00:00Z").await;
        let throttle = ReminderThrottle::new(&throttle_store);
        let recipient = Recipient::Email("bob@beneficiary.example".to_string());

        // One millisecond before the window closes: blocked.
        let just_before = datetime!(2024-03-02 09:59:59.999 UTC);
        assert!(throttle
            .assert_not_recently_sent(
                SIGNATURE_REMINDER_KIND,
                "conv-1",
                &recipient,
                24,
                just_before
            )
            .await
            .is_err());

        // One millisecond past the window: allowed.
        let just_after = datetime!(2024-03-02 10:00:00.001 UTC);
        throttle
            .assert_not_recently_sent(
                SIGNATURE_REMINDER_KIND,
                "conv-1",
                &recipient,
                24,
                just_after
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn different_kind_does_not_throttle() {
        let store = store_with_reminder_at("2024-03-02T09:00:00Z").await;
        let throttle = ReminderThrottle::new(&store);
        throttle
            .assert_not_recently_sent(
                ASSESSMENT_LINK_REMINDER_KIND,
                "conv-1",
                &Recipient::Email("bob@beneficiary.example".to_string()),
                24,
                NOW,
            )
            .await
            .unwrap();
    }
}
