//! Convention status enum and its lifecycle predicates.

use serde::{Deserialize, Serialize};

/// The closed set of convention statuses.
///
/// Serialized in SCREAMING_SNAKE_CASE to match the stored and wire form
/// (`READY_TO_SIGN`, `PARTIALLY_SIGNED`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConventionStatus {
    /// Created, no signature recorded yet.
    ReadyToSign,
    /// At least one signatory has signed, at least one has not.
    PartiallySigned,
    /// Every present signatory has signed; awaiting the agency.
    InReview,
    /// A counsellor of the agency accepted the convention.
    AcceptedByCounsellor,
    /// A validator accepted the convention. The immersion may start.
    AcceptedByValidator,
    /// Refused by the agency. Terminal.
    Rejected,
    /// Cancelled after validation. Terminal.
    Cancelled,
    /// Abandoned before validation (expired, superseded, withdrawn). Terminal.
    Deprecated,
}

impl ConventionStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [ConventionStatus; 8] = [
        ConventionStatus::ReadyToSign,
        ConventionStatus::PartiallySigned,
        ConventionStatus::InReview,
        ConventionStatus::AcceptedByCounsellor,
        ConventionStatus::AcceptedByValidator,
        ConventionStatus::Rejected,
        ConventionStatus::Cancelled,
        ConventionStatus::Deprecated,
    ];

    /// Statuses in which signatures may still be collected and the
    /// content may still be edited.
    pub fn is_signable(self) -> bool {
        matches!(
            self,
            ConventionStatus::ReadyToSign | ConventionStatus::PartiallySigned
        )
    }

    /// Terminal statuses: no further status transition is accepted.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ConventionStatus::Rejected | ConventionStatus::Cancelled | ConventionStatus::Deprecated
        )
    }

    /// A validator has accepted the convention.
    pub fn is_validated(self) -> bool {
        matches!(self, ConventionStatus::AcceptedByValidator)
    }

    /// A counsellor has accepted (reviewed) the convention.
    pub fn is_reviewed(self) -> bool {
        matches!(self, ConventionStatus::AcceptedByCounsellor)
    }

    /// Terminal/negative statuses require a free-text justification.
    pub fn requires_justification(self) -> bool {
        self.is_terminal()
    }

    /// The stored SCREAMING_SNAKE_CASE name.
    pub fn as_str(self) -> &'static str {
        match self {
            ConventionStatus::ReadyToSign => "READY_TO_SIGN",
            ConventionStatus::PartiallySigned => "PARTIALLY_SIGNED",
            ConventionStatus::InReview => "IN_REVIEW",
            ConventionStatus::AcceptedByCounsellor => "ACCEPTED_BY_COUNSELLOR",
            ConventionStatus::AcceptedByValidator => "ACCEPTED_BY_VALIDATOR",
            ConventionStatus::Rejected => "REJECTED",
            ConventionStatus::Cancelled => "CANCELLED",
            ConventionStatus::Deprecated => "DEPRECATED",
        }
    }
}

impl std::fmt::Display for ConventionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
