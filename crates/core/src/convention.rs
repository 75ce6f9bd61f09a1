//! The Convention aggregate: signatory slots, actors, completion law.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::roles::Role;
use crate::status::ConventionStatus;
use crate::{AgencyId, ConventionId};

/// Display name of a human validator/counsellor, attached to the
/// convention when they act.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    pub first_name: String,
    pub last_name: String,
}

/// A human actor attached to the convention: a signatory slot or the
/// establishment tutor.
///
/// `signed_at` presence means the actor has signed. The tutor never
/// signs; its `signed_at` stays `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub role: Role,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(with = "time::serde::rfc3339::option")]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub signed_at: Option<OffsetDateTime>,
}

impl Actor {
    pub fn has_signed(&self) -> bool {
        self.signed_at.is_some()
    }
}

/// The fixed-shape signatory map.
///
/// Two slots are always present; two are optional depending on the
/// beneficiary's situation. Slot lookup is by role, exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signatories {
    pub beneficiary: Actor,
    pub establishment_representative: Actor,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub beneficiary_representative: Option<Actor>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub beneficiary_current_employer: Option<Actor>,
}

impl Signatories {
    /// All present signatory slots, in declaration order.
    pub fn present(&self) -> Vec<&Actor> {
        let mut slots = vec![&self.beneficiary, &self.establishment_representative];
        if let Some(actor) = &self.beneficiary_representative {
            slots.push(actor);
        }
        if let Some(actor) = &self.beneficiary_current_employer {
            slots.push(actor);
        }
        slots
    }

    /// The slot held by `role`, if that slot exists on this convention.
    pub fn slot(&self, role: Role) -> Option<&Actor> {
        match role {
            Role::Beneficiary => Some(&self.beneficiary),
            Role::EstablishmentRepresentative => Some(&self.establishment_representative),
            Role::BeneficiaryRepresentative => self.beneficiary_representative.as_ref(),
            Role::BeneficiaryCurrentEmployer => self.beneficiary_current_employer.as_ref(),
            _ => None,
        }
    }

    /// Mutable variant of [`Signatories::slot`].
    pub fn slot_mut(&mut self, role: Role) -> Option<&mut Actor> {
        match role {
            Role::Beneficiary => Some(&mut self.beneficiary),
            Role::EstablishmentRepresentative => Some(&mut self.establishment_representative),
            Role::BeneficiaryRepresentative => self.beneficiary_representative.as_mut(),
            Role::BeneficiaryCurrentEmployer => self.beneficiary_current_employer.as_mut(),
            _ => None,
        }
    }

    /// Whether every present slot has signed.
    pub fn all_signed(&self) -> bool {
        self.present().iter().all(|actor| actor.has_signed())
    }

    /// Present slots that have not signed yet.
    pub fn unsigned(&self) -> Vec<&Actor> {
        self.present()
            .into_iter()
            .filter(|actor| !actor.has_signed())
            .collect()
    }

    /// Drop every recorded signature. Used when the content is edited
    /// before validation: prior signatures no longer cover the content.
    pub fn clear_signatures(&mut self) {
        self.beneficiary.signed_at = None;
        self.establishment_representative.signed_at = None;
        if let Some(actor) = &mut self.beneficiary_representative {
            actor.signed_at = None;
        }
        if let Some(actor) = &mut self.beneficiary_current_employer {
            actor.signed_at = None;
        }
    }
}

/// The completion law: the status a convention must carry after a
/// signature has been recorded on `signatories`.
///
/// If every present slot is signed the convention moves to review;
/// otherwise it is partially signed. Callers never hand-roll this.
pub fn status_after_signature(signatories: &Signatories) -> ConventionStatus {
    if signatories.all_signed() {
        ConventionStatus::InReview
    } else {
        ConventionStatus::PartiallySigned
    }
}

/// The aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Convention {
    pub id: ConventionId,
    pub status: ConventionStatus,
    pub agency_id: AgencyId,
    pub signatories: Signatories,
    /// Supervises on site; distinct from the establishment
    /// representative, though the two may coincide.
    pub establishment_tutor: Actor,
    /// Optimistic-concurrency token. A caller submitting an update must
    /// present the `updated_at` it last read; a mismatch is a conflict.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Required free text for REJECTED / CANCELLED / DEPRECATED.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status_justification: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub date_approval: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub date_validation: Option<OffsetDateTime>,
    /// Names of the agency members who acted, once they have.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub agency_counsellor: Option<PersonName>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub agency_validator: Option<PersonName>,
}

/// Denormalized read view of a convention plus the agency fields the
/// transition guards need. Produced by the read-model queries, never
/// assembled by embedding an agency object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConventionReadModel {
    pub convention: Convention,
    pub agency_name: String,
    /// Parent agency id when the owning agency delegates validation.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub agency_refers_to: Option<AgencyId>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use time::macros::datetime;

    #[test]
    fn present_slots_follow_optional_shape() {
        let mut convention = two_party_convention();
        assert_eq!(convention.signatories.present().len(), 2);

        convention.signatories.beneficiary_representative =
            Some(actor(Role::BeneficiaryRepresentative, "parent@family.example"));
        assert_eq!(convention.signatories.present().len(), 3);
        assert!(convention
            .signatories
            .slot(Role::BeneficiaryRepresentative)
            .is_some());
        assert!(convention
            .signatories
            .slot(Role::BeneficiaryCurrentEmployer)
            .is_none());
    }

    #[test]
    fn non_signatory_roles_have_no_slot() {
        let convention = two_party_convention();
        assert!(convention.signatories.slot(Role::Counsellor).is_none());
        assert!(convention.signatories.slot(Role::EstablishmentTutor).is_none());
    }

    #[test]
    fn completion_law_over_all_subsets() {
        // For every subset of signed slots on a three-party convention:
        // all signed => InReview, otherwise => PartiallySigned.
        let signed = datetime!(2024-03-02 10:00 UTC);
        for mask in 0u8..8 {
            let mut convention = two_party_convention();
            convention.signatories.beneficiary_representative =
                Some(actor(Role::BeneficiaryRepresentative, "parent@family.example"));
            let roles = [
                Role::Beneficiary,
                Role::EstablishmentRepresentative,
                Role::BeneficiaryRepresentative,
            ];
            for (i, role) in roles.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    convention.signatories.slot_mut(*role).unwrap().signed_at = Some(signed);
                }
            }
            let expected = if mask == 0b111 {
                ConventionStatus::InReview
            } else {
                ConventionStatus::PartiallySigned
            };
            assert_eq!(
                status_after_signature(&convention.signatories),
                expected,
                "mask {mask:#05b}"
            );
        }
    }

    #[test]
    fn clear_signatures_resets_every_slot() {
        let mut convention = two_party_convention();
        let signed = datetime!(2024-03-02 10:00 UTC);
        convention.signatories.beneficiary.signed_at = Some(signed);
        convention.signatories.establishment_representative.signed_at = Some(signed);
        convention.signatories.clear_signatures();
        assert!(convention.signatories.unsigned().len() == 2);
        assert!(!convention.signatories.all_signed());
    }

    #[test]
    fn convention_round_trips_through_json() {
        let mut convention = two_party_convention();
        convention.signatories.beneficiary.signed_at = Some(datetime!(2024-03-02 10:00 UTC));
        let json = serde_json::to_string(&convention).unwrap();
        let back: Convention = serde_json::from_str(&json).unwrap();
        assert_eq!(back, convention);
    }
}
