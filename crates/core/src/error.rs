//! Domain errors.
//!
//! Every guard in this crate fails fast and synchronously with one of
//! these variants before any mutation is attempted. Each variant carries
//! the data a caller needs to act on it, not just a message.

use crate::roles::Role;
use crate::status::ConventionStatus;
use crate::{AgencyId, ConventionId, UserId};
use time::OffsetDateTime;

/// All errors produced by the convention domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// No convention with this id.
    ConventionNotFound { convention_id: ConventionId },
    /// No agency with this id.
    AgencyNotFound { agency_id: AgencyId },
    /// No user account with this id.
    UserNotFound { user_id: UserId },
    /// A scoped token bound to a different convention was presented.
    ForbiddenMissingRights { convention_id: ConventionId },
    /// An authenticated user holds no role at all on this convention.
    NoRightsOnAgency {
        user_id: UserId,
        agency_id: AgencyId,
    },
    /// None of the caller's roles may request the target status.
    RoleNotAllowedForTransition {
        roles: Vec<Role>,
        target: ConventionStatus,
    },
    /// The transition is not legal from the current status.
    InvalidStatusTransition {
        current: ConventionStatus,
        target: ConventionStatus,
    },
    /// Cancellation refused because an assessment already references the
    /// convention.
    CancellationBlockedByAssessment { convention_id: ConventionId },
    /// A semantic refine guard rejected the transition.
    TransitionGuardRejected { message: String },
    /// The resolved role is not one of the signatory roles.
    RoleNotAllowedToSign { role: Role },
    /// The signatory slot for this role does not exist on this
    /// convention.
    MissingActor {
        convention_id: ConventionId,
        role: Role,
    },
    /// The signatory's phone does not parse as a mobile number.
    InvalidMobilePhoneNumber { role: Role, phone: String },
    /// The signatory slot already carries a signature.
    SignatoryAlreadySigned {
        role: Role,
        signed_at: OffsetDateTime,
    },
    /// The target status requires a justification and none was given.
    MissingJustification { target: ConventionStatus },
    /// A delegating agency's validator may not transfer the convention.
    TransferNotAllowedForDelegatingAgency { agency_id: AgencyId },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::ConventionNotFound { convention_id } => {
                write!(f, "convention '{convention_id}' not found")
            }
            DomainError::AgencyNotFound { agency_id } => {
                write!(f, "agency '{agency_id}' not found")
            }
            DomainError::UserNotFound { user_id } => {
                write!(f, "user '{user_id}' not found")
            }
            DomainError::ForbiddenMissingRights { convention_id } => {
                write!(
                    f,
                    "token is not scoped to convention '{convention_id}'"
                )
            }
            DomainError::NoRightsOnAgency { user_id, agency_id } => {
                write!(
                    f,
                    "user '{user_id}' has no rights on agency '{agency_id}'"
                )
            }
            DomainError::RoleNotAllowedForTransition { roles, target } => {
                let held: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
                write!(
                    f,
                    "none of the roles [{}] may request status '{target}'",
                    held.join(", ")
                )
            }
            DomainError::InvalidStatusTransition { current, target } => {
                write!(f, "cannot go from status '{current}' to '{target}'")
            }
            DomainError::CancellationBlockedByAssessment { convention_id } => {
                write!(
                    f,
                    "convention '{convention_id}' already has an assessment and cannot be cancelled"
                )
            }
            DomainError::TransitionGuardRejected { message } => f.write_str(message),
            DomainError::RoleNotAllowedToSign { role } => {
                write!(f, "role '{role}' is not allowed to sign")
            }
            DomainError::MissingActor {
                convention_id,
                role,
            } => {
                write!(
                    f,
                    "convention '{convention_id}' has no '{role}' signatory"
                )
            }
            DomainError::InvalidMobilePhoneNumber { role, phone } => {
                write!(
                    f,
                    "signatory '{role}' phone '{phone}' is not a mobile number"
                )
            }
            DomainError::SignatoryAlreadySigned { role, signed_at } => {
                write!(f, "signatory '{role}' already signed at {signed_at}")
            }
            DomainError::MissingJustification { target } => {
                write!(f, "status '{target}' requires a justification")
            }
            DomainError::TransferNotAllowedForDelegatingAgency { agency_id } => {
                write!(
                    f,
                    "agency '{agency_id}' delegates validation; only a counsellor or the back-office may transfer"
                )
            }
        }
    }
}

impl std::error::Error for DomainError {}
