//! Agencies and authenticated users.
//!
//! Both are plain records resolved by id through their repositories.
//! An agency may itself refer to a parent agency (delegation); the
//! reference is a foreign key, never an embedded agency, and resolving
//! it is always an explicit one-hop lookup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::roles::AgencyRole;
use crate::{AgencyId, UserId};

/// What one user may do inside one agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyRights {
    pub roles: Vec<AgencyRole>,
    /// Whether agency notifications are emailed to this user.
    pub is_notified_by_email: bool,
}

/// The oversight organization that reviews and validates conventions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agency {
    pub id: AgencyId,
    pub name: String,
    /// Parent agency this one delegates validation to, if any.
    ///
    /// When set, this agency's counsellors review but its validators do
    /// not own agency-assignment decisions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refers_to_agency_id: Option<AgencyId>,
    /// Per-user rights table.
    #[serde(default)]
    pub user_rights: BTreeMap<UserId, AgencyRights>,
}

impl Agency {
    /// Rights of one user in this agency, if any.
    pub fn rights_of(&self, user_id: &str) -> Option<&AgencyRights> {
        self.user_rights.get(user_id)
    }

    /// Whether this agency delegates validation to a parent agency.
    pub fn is_delegating(&self) -> bool {
        self.refers_to_agency_id.is_some()
    }
}

/// An authenticated user account.
///
/// Carries the user's agency rights denormalized, so role resolution is
/// a map lookup rather than a join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub is_backoffice_admin: bool,
    /// Rights held across agencies, keyed by agency id.
    #[serde(default)]
    pub agency_rights: BTreeMap<AgencyId, AgencyRights>,
}

impl User {
    /// Rights this user holds on the given agency, if any.
    pub fn rights_on_agency(&self, agency_id: &str) -> Option<&AgencyRights> {
        self.agency_rights.get(agency_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rights(roles: Vec<AgencyRole>) -> AgencyRights {
        AgencyRights {
            roles,
            is_notified_by_email: true,
        }
    }

    #[test]
    fn rights_lookup_by_user() {
        let mut agency = Agency {
            id: "agency-1".to_string(),
            name: "Mission locale".to_string(),
            refers_to_agency_id: None,
            user_rights: BTreeMap::new(),
        };
        agency
            .user_rights
            .insert("user-1".to_string(), rights(vec![AgencyRole::Counsellor]));

        assert!(agency.rights_of("user-1").is_some());
        assert!(agency.rights_of("user-2").is_none());
        assert!(!agency.is_delegating());
    }

    #[test]
    fn delegation_is_a_plain_reference() {
        let agency = Agency {
            id: "agency-2".to_string(),
            name: "Antenne".to_string(),
            refers_to_agency_id: Some("agency-parent".to_string()),
            user_rights: BTreeMap::new(),
        };
        assert!(agency.is_delegating());
        assert_eq!(agency.refers_to_agency_id.as_deref(), Some("agency-parent"));
    }

    #[test]
    fn user_rights_on_agency() {
        let mut user = User {
            id: "user-1".to_string(),
            email: "c@agency.example".to_string(),
            first_name: "Claire".to_string(),
            last_name: "Morel".to_string(),
            is_backoffice_admin: false,
            agency_rights: BTreeMap::new(),
        };
        user.agency_rights
            .insert("agency-1".to_string(), rights(vec![AgencyRole::Validator]));

        assert_eq!(
            user.rights_on_agency("agency-1").unwrap().roles,
            vec![AgencyRole::Validator]
        );
        assert!(user.rights_on_agency("other").is_none());
    }
}
