//! The `transfer_to_agency` operation.

use serde::Deserialize;

use convene_core::{resolve_roles, Credential, TransitionContext};
use convene_storage::{AgencyRepository, ConventionQueries, ConventionRepository, Store};

use crate::engine::Engine;
use crate::error::EngineError;

/// Event topic queued on a successful transfer. Transfers do not change
/// the status, so they sit outside the status-to-topic table.
const TRANSFER_TOPIC: &str = "ConventionTransferredToAgency";

/// Input to [`Engine::transfer_to_agency`].
#[derive(Debug, Clone, Deserialize)]
pub struct TransferInput {
    pub convention_id: String,
    pub target_agency_id: String,
}

impl<S: Store> Engine<S> {
    /// Move a convention to another agency.
    ///
    /// Only legal while the convention is not yet reviewed, and -- when
    /// the source agency delegates validation -- only for a counsellor
    /// or the back-office.
    pub async fn transfer_to_agency(
        &self,
        input: TransferInput,
        credential: &Credential,
    ) -> Result<String, EngineError> {
        let read = self
            .store
            .get_convention_read_model(&input.convention_id)
            .await?
            .ok_or_else(|| convene_core::DomainError::ConventionNotFound {
                convention_id: input.convention_id.clone(),
            })?;
        self.store
            .get_agency(&input.target_agency_id)
            .await?
            .ok_or_else(|| convene_core::DomainError::AgencyNotFound {
                agency_id: input.target_agency_id.clone(),
            })?;

        let user = self.load_credential_user(credential).await?;
        let roles = resolve_roles(credential, &read.convention, user.as_ref())?;

        self.policy
            .ensure_transfer_allowed(&roles, &TransitionContext::from(&read))?;

        let now = self.now();
        let mut updated = read.convention.clone();
        updated.agency_id = input.target_agency_id.clone();
        updated.updated_at = now;

        self.store
            .update(&updated, read.convention.updated_at)
            .await?
            .ok_or_else(|| convene_core::DomainError::ConventionNotFound {
                convention_id: updated.id.clone(),
            })?;

        let event = convene_core::ConventionEvent {
            topic: TRANSFER_TOPIC.to_string(),
            occurred_at: now,
            convention: updated.clone(),
            triggered_by: credential.triggered_by(),
        };
        self.queue(&event).await?;

        tracing::info!(
            convention_id = %updated.id,
            from = %read.convention.agency_id,
            to = %updated.agency_id,
            "convention transferred"
        );

        Ok(updated.id)
    }
}
