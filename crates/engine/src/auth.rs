//! Turning a raw magic-link token into a [`Credential`].
//!
//! Convention-scoped tokens become magic-link credentials directly: the
//! signature, expiry and email hash were checked by the link layer, and
//! the convention binding is re-checked by role resolution. A
//! connected-user token instead re-loads the account by id, so a token
//! minted for a since-deleted account stops working immediately.

use convene_core::Credential;
use convene_links::TokenScope;
use convene_storage::{Store, UserRepository};

use crate::engine::Engine;
use crate::error::EngineError;

impl<S: Store> Engine<S> {
    /// Verify a token and produce the credential it grants.
    pub async fn authenticate(&self, token: &str) -> Result<Credential, EngineError> {
        let payload = self.tokens.verify(token, self.now())?;
        match payload.scope {
            TokenScope::Convention {
                convention_id,
                role,
                email,
                ..
            } => Ok(Credential::ConventionMagicLink {
                convention_id,
                role,
                email,
            }),
            TokenScope::ConnectedUser { user_id } => {
                let user = self.store.get_user(&user_id).await?.ok_or(
                    convene_core::DomainError::UserNotFound {
                        user_id: user_id.clone(),
                    },
                )?;
                Ok(Credential::ConnectedUser { user_id: user.id })
            }
        }
    }
}
