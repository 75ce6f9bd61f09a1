//! The signing protocol for a single signatory.
//!
//! Validates that the caller may sign, records the signature on the
//! matching slot, and computes the status the convention must advance
//! to, all without touching storage. Persistence and event publication
//! are the engine's job.

use time::OffsetDateTime;

use crate::convention::{status_after_signature, Convention};
use crate::credential::Credential;
use crate::error::DomainError;
use crate::party::User;
use crate::phone::is_mobile_phone;
use crate::resolver::resolve_roles;
use crate::roles::Role;
use crate::transition::{TransitionContext, TransitionPolicy};

/// A recorded signature: who signed, and the convention after the
/// signature and the resulting status bump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureOutcome {
    pub role: Role,
    pub convention: Convention,
}

/// Record one signatory's signature at `now`.
///
/// The acting role is resolved once from the credential. A connected
/// user can only reach this path as the establishment representative,
/// and only when their account email matches that slot; every other
/// connected-user role is refused.
pub fn sign_convention(
    convention: &Convention,
    credential: &Credential,
    user: Option<&User>,
    policy: &TransitionPolicy,
    now: OffsetDateTime,
) -> Result<SignatureOutcome, DomainError> {
    let roles = resolve_roles(credential, convention, user)?;

    // Exactly one signatory role may act; any other resolved role
    // cannot sign.
    let role = roles
        .iter()
        .copied()
        .find(|role| role.is_signatory())
        .ok_or_else(|| DomainError::RoleNotAllowedToSign {
            role: *roles.first().unwrap_or(&Role::ToReview),
        })?;

    let slot = convention
        .signatories
        .slot(role)
        .ok_or_else(|| DomainError::MissingActor {
            convention_id: convention.id.clone(),
            role,
        })?;

    // Reminders for the remaining signatories go out over SMS; an
    // unreachable number fails the signature now rather than the
    // reminder later.
    if let Some(phone) = &slot.phone {
        if !is_mobile_phone(phone) {
            return Err(DomainError::InvalidMobilePhoneNumber {
                role,
                phone: phone.clone(),
            });
        }
    }

    if let Some(signed_at) = slot.signed_at {
        return Err(DomainError::SignatoryAlreadySigned { role, signed_at });
    }

    let mut signed = convention.clone();
    signed
        .signatories
        .slot_mut(role)
        .ok_or_else(|| DomainError::MissingActor {
            convention_id: convention.id.clone(),
            role,
        })?
        .signed_at = Some(now);

    let target = status_after_signature(&signed.signatories);
    policy.ensure_transition_allowed(
        target,
        &[role],
        &TransitionContext::bare(convention),
        false,
    )?;

    signed.status = target;
    signed.updated_at = now;

    Ok(SignatureOutcome {
        role,
        convention: signed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convention::fixtures::{actor, two_party_convention};
    use crate::status::ConventionStatus;
    use std::collections::BTreeMap;
    use time::macros::datetime;

    fn beneficiary_link() -> Credential {
        Credential::ConventionMagicLink {
            convention_id: "conv-1".to_string(),
            role: Role::Beneficiary,
            email: "bob@beneficiary.example".to_string(),
        }
    }

    fn representative_link() -> Credential {
        Credential::ConventionMagicLink {
            convention_id: "conv-1".to_string(),
            role: Role::EstablishmentRepresentative,
            email: "rep@establishment.example".to_string(),
        }
    }

    const NOW: OffsetDateTime = datetime!(2024-03-02 10:00 UTC);

    #[test]
    fn first_signature_moves_to_partially_signed() {
        let convention = two_party_convention();
        let policy = TransitionPolicy::default();
        let outcome =
            sign_convention(&convention, &beneficiary_link(), None, &policy, NOW).unwrap();
        assert_eq!(outcome.role, Role::Beneficiary);
        assert_eq!(outcome.convention.status, ConventionStatus::PartiallySigned);
        assert_eq!(
            outcome.convention.signatories.beneficiary.signed_at,
            Some(NOW)
        );
        assert_eq!(outcome.convention.updated_at, NOW);
    }

    #[test]
    fn last_signature_moves_to_in_review() {
        let mut convention = two_party_convention();
        convention.status = ConventionStatus::PartiallySigned;
        convention.signatories.beneficiary.signed_at = Some(datetime!(2024-03-01 10:00 UTC));
        let policy = TransitionPolicy::default();
        let outcome =
            sign_convention(&convention, &representative_link(), None, &policy, NOW).unwrap();
        assert_eq!(outcome.convention.status, ConventionStatus::InReview);
        assert!(outcome.convention.signatories.all_signed());
    }

    #[test]
    fn double_signature_fails_and_reports_first_timestamp() {
        let mut convention = two_party_convention();
        convention.status = ConventionStatus::PartiallySigned;
        let first = datetime!(2024-03-01 10:00 UTC);
        convention.signatories.beneficiary.signed_at = Some(first);
        let policy = TransitionPolicy::default();
        let err =
            sign_convention(&convention, &beneficiary_link(), None, &policy, NOW).unwrap_err();
        assert_eq!(
            err,
            DomainError::SignatoryAlreadySigned {
                role: Role::Beneficiary,
                signed_at: first,
            }
        );
    }

    #[test]
    fn non_signatory_token_role_cannot_sign() {
        let convention = two_party_convention();
        let policy = TransitionPolicy::default();
        let credential = Credential::ConventionMagicLink {
            convention_id: "conv-1".to_string(),
            role: Role::Counsellor,
            email: "c@agency.example".to_string(),
        };
        let err = sign_convention(&convention, &credential, None, &policy, NOW).unwrap_err();
        assert_eq!(
            err,
            DomainError::RoleNotAllowedToSign {
                role: Role::Counsellor
            }
        );
    }

    #[test]
    fn absent_slot_is_missing_actor() {
        let convention = two_party_convention();
        let policy = TransitionPolicy::default();
        let credential = Credential::ConventionMagicLink {
            convention_id: "conv-1".to_string(),
            role: Role::BeneficiaryRepresentative,
            email: "parent@family.example".to_string(),
        };
        let err = sign_convention(&convention, &credential, None, &policy, NOW).unwrap_err();
        assert_eq!(
            err,
            DomainError::MissingActor {
                convention_id: "conv-1".to_string(),
                role: Role::BeneficiaryRepresentative,
            }
        );
    }

    #[test]
    fn landline_phone_fails_fast() {
        let mut convention = two_party_convention();
        convention.signatories.beneficiary.phone = Some("0112345678".to_string());
        let policy = TransitionPolicy::default();
        let err =
            sign_convention(&convention, &beneficiary_link(), None, &policy, NOW).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidMobilePhoneNumber {
                role: Role::Beneficiary,
                ..
            }
        ));
    }

    #[test]
    fn connected_user_signs_only_as_matching_establishment_representative() {
        let convention = two_party_convention();
        let policy = TransitionPolicy::default();
        let credential = Credential::ConnectedUser {
            user_id: "user-1".to_string(),
        };

        let matching = User {
            id: "user-1".to_string(),
            email: "rep@establishment.example".to_string(),
            first_name: "Renee".to_string(),
            last_name: "Duval".to_string(),
            is_backoffice_admin: false,
            agency_rights: BTreeMap::new(),
        };
        let outcome =
            sign_convention(&convention, &credential, Some(&matching), &policy, NOW).unwrap();
        assert_eq!(outcome.role, Role::EstablishmentRepresentative);

        // A counsellor account that is not the representative resolves
        // roles fine but cannot sign.
        let mut counsellor = matching.clone();
        counsellor.email = "c@agency.example".to_string();
        counsellor.agency_rights.insert(
            "agency-1".to_string(),
            crate::party::AgencyRights {
                roles: vec![crate::roles::AgencyRole::Counsellor],
                is_notified_by_email: true,
            },
        );
        let err = sign_convention(&convention, &credential, Some(&counsellor), &policy, NOW)
            .unwrap_err();
        assert!(matches!(err, DomainError::RoleNotAllowedToSign { .. }));
    }

    #[test]
    fn failed_second_attempt_leaves_input_untouched() {
        let mut convention = two_party_convention();
        convention.status = ConventionStatus::PartiallySigned;
        convention.signatories.beneficiary.signed_at = Some(datetime!(2024-03-01 10:00 UTC));
        let before = convention.clone();
        let policy = TransitionPolicy::default();
        let _ = sign_convention(&convention, &beneficiary_link(), None, &policy, NOW);
        assert_eq!(convention, before);
    }

    #[test]
    fn optional_employer_slot_participates_in_completion() {
        let mut convention = two_party_convention();
        convention.signatories.beneficiary_current_employer = Some(actor(
            Role::BeneficiaryCurrentEmployer,
            "boss@employer.example",
        ));
        convention.signatories.beneficiary.signed_at = Some(datetime!(2024-03-01 10:00 UTC));
        convention
            .signatories
            .establishment_representative
            .signed_at = Some(datetime!(2024-03-01 11:00 UTC));
        convention.status = ConventionStatus::PartiallySigned;

        let credential = Credential::ConventionMagicLink {
            convention_id: "conv-1".to_string(),
            role: Role::BeneficiaryCurrentEmployer,
            email: "boss@employer.example".to_string(),
        };
        let policy = TransitionPolicy::default();
        let outcome = sign_convention(&convention, &credential, None, &policy, NOW).unwrap();
        assert_eq!(outcome.convention.status, ConventionStatus::InReview);
    }
}
