//! The engine: shared state and helpers for every operation.

use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use convene_core::{
    Clock, Convention, ConventionEvent, Credential, EventTopicTable, TransitionPolicy,
    TriggeredBy, User,
};
use convene_links::{CapabilityTokenIssuer, ShortLinkIssuer};
use convene_storage::{
    ConventionRepository, OutboxRecord, OutboxRepository, Store, UserRepository,
};

use crate::error::EngineError;

/// The convention lifecycle engine.
///
/// Generic over the storage backend; the policy and topic tables are
/// injected at construction so tests can substitute alternates.
pub struct Engine<S> {
    pub(crate) store: Arc<S>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) policy: TransitionPolicy,
    pub(crate) topics: EventTopicTable,
    pub(crate) tokens: CapabilityTokenIssuer,
    pub(crate) short_links: ShortLinkIssuer<S>,
}

impl<S: Store> Engine<S> {
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        tokens: CapabilityTokenIssuer,
        policy: TransitionPolicy,
        topics: EventTopicTable,
    ) -> Self {
        let short_links =
            ShortLinkIssuer::new(Arc::clone(&store), tokens.config().base_url.clone());
        Engine {
            store,
            clock,
            policy,
            topics,
            tokens,
            short_links,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn short_links(&self) -> &ShortLinkIssuer<S> {
        &self.short_links
    }

    pub fn tokens(&self) -> &CapabilityTokenIssuer {
        &self.tokens
    }

    /// Load a convention or fail with the domain not-found error.
    pub(crate) async fn load_convention(
        &self,
        convention_id: &str,
    ) -> Result<Convention, EngineError> {
        self.store
            .get_by_id(convention_id)
            .await?
            .ok_or_else(|| {
                convene_core::DomainError::ConventionNotFound {
                    convention_id: convention_id.to_string(),
                }
                .into()
            })
    }

    /// Load the user behind a connected-user credential, if any.
    /// Magic-link credentials need no lookup.
    pub(crate) async fn load_credential_user(
        &self,
        credential: &Credential,
    ) -> Result<Option<User>, EngineError> {
        match credential {
            Credential::ConnectedUser { user_id } => Ok(self.store.get_user(user_id).await?),
            Credential::ConventionMagicLink { .. } => Ok(None),
        }
    }

    /// Persist an updated convention and queue its lifecycle event.
    ///
    /// The repository's conditional write doubles as the OCC check;
    /// `Ok(None)` (the row vanished) becomes the not-found error. The
    /// event is stamped with the convention's own `updated_at`, so event
    /// time and entity time never diverge.
    pub(crate) async fn persist_and_queue(
        &self,
        updated: &Convention,
        expected_updated_at: OffsetDateTime,
        triggered_by: TriggeredBy,
    ) -> Result<(), EngineError> {
        self.store
            .update(updated, expected_updated_at)
            .await?
            .ok_or_else(|| convene_core::DomainError::ConventionNotFound {
                convention_id: updated.id.clone(),
            })?;

        if let Some(event) =
            ConventionEvent::for_status(&self.topics, updated, triggered_by, updated.updated_at)
        {
            self.queue(&event).await?;
        }
        Ok(())
    }

    /// Queue one event in the outbox.
    pub(crate) async fn queue(&self, event: &ConventionEvent) -> Result<(), EngineError> {
        let record = OutboxRecord {
            id: random_id(),
            topic: event.topic.clone(),
            occurred_at: event
                .occurred_at
                .format(&Rfc3339)
                .unwrap_or_default(),
            payload: serde_json::to_value(event)
                .map_err(|e| convene_storage::StorageError::Backend(e.to_string()))?,
        };
        self.store.queue_event(&record).await?;
        Ok(())
    }

    pub(crate) fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }
}

/// Opaque record id for outbox and notification rows.
pub(crate) fn random_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_are_opaque_and_distinct() {
        let a = random_id();
        let b = random_id();
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
    }
}
