//! Roles a caller can hold on a convention, and agency-level roles.
//!
//! Every authorization check downstream of the resolver is written
//! against [`Role`], never against the credential shape that produced it.

use serde::{Deserialize, Serialize};

/// A role held on a specific convention.
///
/// Kebab-case on the wire (`"establishment-representative"`, ...), which
/// is also the form embedded in magic-link token payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// The person doing the immersion.
    Beneficiary,
    /// Legal representative of a minor or protected beneficiary.
    BeneficiaryRepresentative,
    /// Current employer of the beneficiary, when the immersion happens
    /// alongside an existing job.
    BeneficiaryCurrentEmployer,
    /// Signs for the host establishment.
    EstablishmentRepresentative,
    /// Supervises the immersion on site. Does not sign.
    EstablishmentTutor,
    /// Agency member who reviews conventions.
    Counsellor,
    /// Agency member who validates conventions.
    Validator,
    /// Administers the agency's user rights.
    AgencyAdmin,
    /// Read-only agency member.
    AgencyViewer,
    /// Agency member whose rights are pending review.
    ToReview,
    /// Back-office operator. May act on any convention.
    BackOffice,
}

/// The roles that own a signatory slot on a convention.
pub const SIGNATORY_ROLES: [Role; 4] = [
    Role::Beneficiary,
    Role::BeneficiaryRepresentative,
    Role::BeneficiaryCurrentEmployer,
    Role::EstablishmentRepresentative,
];

impl Role {
    /// Whether this role owns a signatory slot.
    pub fn is_signatory(self) -> bool {
        SIGNATORY_ROLES.contains(&self)
    }

    /// The kebab-case wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Beneficiary => "beneficiary",
            Role::BeneficiaryRepresentative => "beneficiary-representative",
            Role::BeneficiaryCurrentEmployer => "beneficiary-current-employer",
            Role::EstablishmentRepresentative => "establishment-representative",
            Role::EstablishmentTutor => "establishment-tutor",
            Role::Counsellor => "counsellor",
            Role::Validator => "validator",
            Role::AgencyAdmin => "agency-admin",
            Role::AgencyViewer => "agency-viewer",
            Role::ToReview => "to-review",
            Role::BackOffice => "back-office",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role held inside an agency, granted per user in the agency's
/// rights table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgencyRole {
    Counsellor,
    Validator,
    AgencyAdmin,
    AgencyViewer,
    ToReview,
}

impl AgencyRole {
    /// The convention-level role this agency role translates to.
    pub fn as_role(self) -> Role {
        match self {
            AgencyRole::Counsellor => Role::Counsellor,
            AgencyRole::Validator => Role::Validator,
            AgencyRole::AgencyAdmin => Role::AgencyAdmin,
            AgencyRole::AgencyViewer => Role::AgencyViewer,
            AgencyRole::ToReview => Role::ToReview,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatory_roles_are_exactly_the_four_slots() {
        assert!(Role::Beneficiary.is_signatory());
        assert!(Role::EstablishmentRepresentative.is_signatory());
        assert!(Role::BeneficiaryRepresentative.is_signatory());
        assert!(Role::BeneficiaryCurrentEmployer.is_signatory());
        assert!(!Role::EstablishmentTutor.is_signatory());
        assert!(!Role::Counsellor.is_signatory());
        assert!(!Role::BackOffice.is_signatory());
    }

    #[test]
    fn roles_serialize_kebab_case() {
        let json = serde_json::to_string(&Role::EstablishmentRepresentative).unwrap();
        assert_eq!(json, "\"establishment-representative\"");
        let back: Role = serde_json::from_str("\"back-office\"").unwrap();
        assert_eq!(back, Role::BackOffice);
    }

    #[test]
    fn agency_roles_map_to_convention_roles() {
        assert_eq!(AgencyRole::Counsellor.as_role(), Role::Counsellor);
        assert_eq!(AgencyRole::Validator.as_role(), Role::Validator);
        assert_eq!(AgencyRole::ToReview.as_role(), Role::ToReview);
    }
}
