//! The two credential shapes a caller can present.
//!
//! Either a scoped magic-link token (bound to one convention, one role,
//! one email) or an authenticated user account. The union is closed and
//! matched exhaustively: a third credential kind cannot silently fall
//! through any check in this workspace.

use serde::{Deserialize, Serialize};

use crate::roles::Role;
use crate::{ConventionId, UserId};

/// What an inbound request carries to prove who is acting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Credential {
    /// A verified magic-link token scoped to one convention.
    ///
    /// The link crate has already checked the signature, the expiry and
    /// the email hash before this value exists; the core only re-checks
    /// the convention binding.
    ConventionMagicLink {
        convention_id: ConventionId,
        role: Role,
        email: String,
    },
    /// An authenticated account. Rights are looked up, not embedded.
    ConnectedUser { user_id: UserId },
}

/// Who triggered a domain event. Stamped on every published event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TriggeredBy {
    ConnectedUser { user_id: UserId },
    ConventionMagicLink { role: Role },
}

impl Credential {
    /// The event attribution for this credential.
    pub fn triggered_by(&self) -> TriggeredBy {
        match self {
            Credential::ConventionMagicLink { role, .. } => {
                TriggeredBy::ConventionMagicLink { role: *role }
            }
            Credential::ConnectedUser { user_id } => TriggeredBy::ConnectedUser {
                user_id: user_id.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_serializes_as_tagged_union() {
        let credential = Credential::ConventionMagicLink {
            convention_id: "conv-1".to_string(),
            role: Role::Beneficiary,
            email: "bob@beneficiary.example".to_string(),
        };
        let json = serde_json::to_value(&credential).unwrap();
        assert_eq!(json["kind"], "convention-magic-link");
        assert_eq!(json["role"], "beneficiary");

        let user = Credential::ConnectedUser {
            user_id: "user-1".to_string(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["kind"], "connected-user");
    }

    #[test]
    fn triggered_by_carries_role_or_user() {
        let link = Credential::ConventionMagicLink {
            convention_id: "conv-1".to_string(),
            role: Role::Validator,
            email: "v@agency.example".to_string(),
        };
        assert_eq!(
            link.triggered_by(),
            TriggeredBy::ConventionMagicLink {
                role: Role::Validator
            }
        );

        let user = Credential::ConnectedUser {
            user_id: "user-9".to_string(),
        };
        assert_eq!(
            user.triggered_by(),
            TriggeredBy::ConnectedUser {
                user_id: "user-9".to_string()
            }
        );
    }
}
