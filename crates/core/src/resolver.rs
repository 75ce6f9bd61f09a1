//! Role resolution: credential + convention in, `Vec<Role>` out.
//!
//! Both credential shapes resolve to the same output so that every
//! downstream check (transition policy, signing protocol) is written
//! once, against roles, never against the credential kind.

use crate::convention::Convention;
use crate::credential::Credential;
use crate::error::DomainError;
use crate::party::User;
use crate::roles::Role;

/// Compute the roles the caller currently holds on `convention`.
///
/// For a scoped token the answer is exactly the token's role, after
/// checking the token is bound to this convention. Email-hash matching
/// against admissible addresses is the link-verification step's job, not
/// this one's.
///
/// For an authenticated user the caller must pass the loaded account as
/// `user` (or `None` when the lookup found nothing):
/// - back-office admins get [`Role::BackOffice`]
/// - an email matching the establishment representative's grants
///   [`Role::EstablishmentRepresentative`]
/// - rights on the convention's agency contribute their agency roles
///
/// An authenticated user ending up with no role at all is an error, not
/// an empty list.
pub fn resolve_roles(
    credential: &Credential,
    convention: &Convention,
    user: Option<&User>,
) -> Result<Vec<Role>, DomainError> {
    match credential {
        Credential::ConventionMagicLink {
            convention_id,
            role,
            ..
        } => {
            if *convention_id != convention.id {
                return Err(DomainError::ForbiddenMissingRights {
                    convention_id: convention.id.clone(),
                });
            }
            Ok(vec![*role])
        }
        Credential::ConnectedUser { user_id } => {
            let user = user.ok_or_else(|| DomainError::UserNotFound {
                user_id: user_id.clone(),
            })?;

            let mut roles = Vec::new();
            if user.is_backoffice_admin {
                roles.push(Role::BackOffice);
            }
            if user.email == convention.signatories.establishment_representative.email {
                roles.push(Role::EstablishmentRepresentative);
            }
            if let Some(rights) = user.rights_on_agency(&convention.agency_id) {
                roles.extend(rights.roles.iter().map(|r| r.as_role()));
            }

            if roles.is_empty() {
                return Err(DomainError::NoRightsOnAgency {
                    user_id: user.id.clone(),
                    agency_id: convention.agency_id.clone(),
                });
            }
            Ok(roles)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convention::fixtures::two_party_convention;
    use crate::party::AgencyRights;
    use crate::roles::AgencyRole;
    use std::collections::BTreeMap;

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            email: email.to_string(),
            first_name: "Claire".to_string(),
            last_name: "Morel".to_string(),
            is_backoffice_admin: false,
            agency_rights: BTreeMap::new(),
        }
    }

    #[test]
    fn token_bound_to_this_convention_yields_exactly_its_role() {
        let convention = two_party_convention();
        let credential = Credential::ConventionMagicLink {
            convention_id: "conv-1".to_string(),
            role: Role::Beneficiary,
            email: "bob@beneficiary.example".to_string(),
        };
        let roles = resolve_roles(&credential, &convention, None).unwrap();
        assert_eq!(roles, vec![Role::Beneficiary]);
    }

    #[test]
    fn token_bound_to_another_convention_is_forbidden_regardless_of_role() {
        let convention = two_party_convention();
        for role in [Role::Beneficiary, Role::Validator, Role::BackOffice] {
            let credential = Credential::ConventionMagicLink {
                convention_id: "conv-other".to_string(),
                role,
                email: "someone@example.com".to_string(),
            };
            let err = resolve_roles(&credential, &convention, None).unwrap_err();
            assert_eq!(
                err,
                DomainError::ForbiddenMissingRights {
                    convention_id: "conv-1".to_string()
                }
            );
        }
    }

    #[test]
    fn connected_user_accumulates_backoffice_representative_and_agency_roles() {
        let convention = two_party_convention();
        let mut user = user("user-1", "rep@establishment.example");
        user.is_backoffice_admin = true;
        user.agency_rights.insert(
            "agency-1".to_string(),
            AgencyRights {
                roles: vec![AgencyRole::Counsellor, AgencyRole::Validator],
                is_notified_by_email: true,
            },
        );
        let credential = Credential::ConnectedUser {
            user_id: "user-1".to_string(),
        };
        let roles = resolve_roles(&credential, &convention, Some(&user)).unwrap();
        assert_eq!(
            roles,
            vec![
                Role::BackOffice,
                Role::EstablishmentRepresentative,
                Role::Counsellor,
                Role::Validator,
            ]
        );
    }

    #[test]
    fn connected_user_with_no_role_fails_no_rights_on_agency() {
        let convention = two_party_convention();
        let user = user("user-2", "nobody@elsewhere.example");
        let credential = Credential::ConnectedUser {
            user_id: "user-2".to_string(),
        };
        let err = resolve_roles(&credential, &convention, Some(&user)).unwrap_err();
        assert_eq!(
            err,
            DomainError::NoRightsOnAgency {
                user_id: "user-2".to_string(),
                agency_id: "agency-1".to_string(),
            }
        );
    }

    #[test]
    fn missing_user_record_is_not_found() {
        let convention = two_party_convention();
        let credential = Credential::ConnectedUser {
            user_id: "ghost".to_string(),
        };
        let err = resolve_roles(&credential, &convention, None).unwrap_err();
        assert_eq!(
            err,
            DomainError::UserNotFound {
                user_id: "ghost".to_string()
            }
        );
    }

    #[test]
    fn rights_on_another_agency_do_not_count() {
        let convention = two_party_convention();
        let mut user = user("user-3", "c@other-agency.example");
        user.agency_rights.insert(
            "agency-other".to_string(),
            AgencyRights {
                roles: vec![AgencyRole::Validator],
                is_notified_by_email: false,
            },
        );
        let credential = Credential::ConnectedUser {
            user_id: "user-3".to_string(),
        };
        assert!(resolve_roles(&credential, &convention, Some(&user)).is_err());
    }
}
