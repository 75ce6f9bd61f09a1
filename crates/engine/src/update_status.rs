//! The `update_status` operation: agency and back-office decisions.

use serde::Deserialize;

use convene_core::{
    apply_status_change, resolve_roles, ConventionStatus, Credential, PersonName, StatusChange,
    TransitionContext,
};
use convene_storage::{
    AgencyRepository, AssessmentRepository, ConventionQueries, Store,
};

use crate::engine::Engine;
use crate::error::EngineError;

/// Input to [`Engine::update_status`].
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusInput {
    pub convention_id: String,
    pub target: ConventionStatus,
    /// Required for terminal targets.
    #[serde(default)]
    pub justification: Option<String>,
}

impl<S: Store> Engine<S> {
    /// Transition a convention to `target` on behalf of the caller.
    ///
    /// Loads the read model and the owning agency, resolves the
    /// caller's roles, checks the assessment guard, runs the policy,
    /// computes the derived fields, persists, and queues the event --
    /// in that order, with no mutation before the last guard passes.
    pub async fn update_status(
        &self,
        input: UpdateStatusInput,
        credential: &Credential,
    ) -> Result<String, EngineError> {
        let read = self
            .store
            .get_convention_read_model(&input.convention_id)
            .await?
            .ok_or_else(|| convene_core::DomainError::ConventionNotFound {
                convention_id: input.convention_id.clone(),
            })?;
        let agency = self
            .store
            .get_agency(&read.convention.agency_id)
            .await?
            .ok_or_else(|| convene_core::DomainError::AgencyNotFound {
                agency_id: read.convention.agency_id.clone(),
            })?;

        let user = self.load_credential_user(credential).await?;
        let roles = resolve_roles(credential, &read.convention, user.as_ref())?;

        let has_assessment = self
            .store
            .get_by_convention_id(&input.convention_id)
            .await?
            .is_some();

        self.policy.ensure_transition_allowed(
            input.target,
            &roles,
            &TransitionContext::from(&read),
            has_assessment,
        )?;

        // The acting agency member's name travels with the matching
        // acceptance; magic-link callers have no account to name.
        let actor_name = user.as_ref().map(|u| PersonName {
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
        });
        let change = StatusChange {
            justification: input.justification.clone(),
            counsellor_name: actor_name.clone(),
            validator_name: actor_name,
        };

        let now = self.now();
        let updated = apply_status_change(&read.convention, input.target, &change, now)?;

        self.persist_and_queue(&updated, read.convention.updated_at, credential.triggered_by())
            .await?;

        tracing::info!(
            convention_id = %updated.id,
            agency = %agency.id,
            status = %updated.status,
            "status updated"
        );

        Ok(updated.id)
    }
}
