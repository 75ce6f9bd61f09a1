//! The `edit` operation: pre-signature content updates.
//!
//! Editing is only legal while the convention is still signable. A
//! successful edit drops every recorded signature -- they covered the
//! previous content -- and returns the convention to `READY_TO_SIGN`,
//! which publishes no event.

use serde::Deserialize;

use convene_core::{
    resolve_roles, Actor, ConventionStatus, Credential, Signatories, TransitionContext,
};
use convene_storage::{ConventionRepository, Store};
use time::OffsetDateTime;

use crate::engine::Engine;
use crate::error::EngineError;

/// Replacement content for an edit. Identity, status and agency fields
/// are not editable through this operation.
#[derive(Debug, Clone, Deserialize)]
pub struct ConventionEdit {
    pub signatories: Signatories,
    pub establishment_tutor: Actor,
}

/// Input to [`Engine::edit`].
#[derive(Debug, Clone, Deserialize)]
pub struct EditInput {
    pub convention_id: String,
    /// The `updated_at` the caller last read. A mismatch is a conflict,
    /// surfaced by the storage layer.
    #[serde(with = "time::serde::rfc3339")]
    pub expected_updated_at: OffsetDateTime,
    pub edit: ConventionEdit,
}

impl<S: Store> Engine<S> {
    /// Replace the editable content of a still-signable convention.
    pub async fn edit(
        &self,
        input: EditInput,
        credential: &Credential,
    ) -> Result<String, EngineError> {
        let convention = self.load_convention(&input.convention_id).await?;
        let user = self.load_credential_user(credential).await?;
        let roles = resolve_roles(credential, &convention, user.as_ref())?;

        self.policy.ensure_transition_allowed(
            ConventionStatus::ReadyToSign,
            &roles,
            &TransitionContext::bare(&convention),
            false,
        )?;

        let now = self.now();
        let mut updated = convention.clone();
        updated.signatories = input.edit.signatories;
        updated.establishment_tutor = input.edit.establishment_tutor;
        updated.signatories.clear_signatures();
        updated.status = ConventionStatus::ReadyToSign;
        updated.updated_at = now;

        // The caller's own read token, not the freshly loaded row's:
        // an edit raced by another writer must conflict even if this
        // handler read the newer row.
        self.store
            .update(&updated, input.expected_updated_at)
            .await?
            .ok_or_else(|| convene_core::DomainError::ConventionNotFound {
                convention_id: updated.id.clone(),
            })?;

        tracing::info!(convention_id = %updated.id, "content edited, signatures reset");

        Ok(updated.id)
    }
}
