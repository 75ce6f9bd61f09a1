//! The `sign` operation.

use serde::{Deserialize, Serialize};

use convene_core::{sign_convention, ConventionStatus, Credential, Role};
use convene_storage::Store;

use crate::engine::Engine;
use crate::error::EngineError;

/// Input to [`Engine::sign`].
#[derive(Debug, Clone, Deserialize)]
pub struct SignInput {
    pub convention_id: String,
}

/// What a successful signature produced.
#[derive(Debug, Clone, Serialize)]
pub struct SignOutcome {
    pub convention_id: String,
    pub role: Role,
    pub status: ConventionStatus,
}

impl<S: Store> Engine<S> {
    /// Record one signatory's signature.
    ///
    /// Guards run in the core ([`sign_convention`]); this method loads,
    /// persists, and queues the resulting event (partially-signed or
    /// fully-signed, depending on the completion law).
    pub async fn sign(
        &self,
        input: SignInput,
        credential: &Credential,
    ) -> Result<SignOutcome, EngineError> {
        let convention = self.load_convention(&input.convention_id).await?;
        let user = self.load_credential_user(credential).await?;
        let now = self.now();

        let outcome =
            sign_convention(&convention, credential, user.as_ref(), &self.policy, now)?;

        self.persist_and_queue(
            &outcome.convention,
            convention.updated_at,
            credential.triggered_by(),
        )
        .await?;

        tracing::info!(
            convention_id = %outcome.convention.id,
            role = %outcome.role,
            status = %outcome.convention.status,
            "signature recorded"
        );

        Ok(SignOutcome {
            convention_id: outcome.convention.id,
            role: outcome.role,
            status: outcome.convention.status,
        })
    }
}
