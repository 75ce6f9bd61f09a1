//! Derived status fields.
//!
//! Applying a status change touches more than the status: validation and
//! approval dates, the justification, and the acting agency member's
//! name are all pure functions of the target status. Centralizing them
//! here keeps the orchestration free of per-status special cases.

use time::OffsetDateTime;

use crate::convention::{Convention, PersonName};
use crate::error::DomainError;
use crate::status::ConventionStatus;

/// A requested status change and its optional accompanying fields.
#[derive(Debug, Clone, Default)]
pub struct StatusChange {
    /// Free text. Required for terminal targets, discarded otherwise.
    pub justification: Option<String>,
    /// Name of the acting counsellor, attached on counsellor acceptance.
    pub counsellor_name: Option<PersonName>,
    /// Name of the acting validator, attached on validation.
    pub validator_name: Option<PersonName>,
}

/// Produce the convention as it must be stored after transitioning to
/// `target` at `now`.
///
/// - `date_validation` is stamped only on validation
/// - `date_approval` is stamped on counsellor acceptance and carried
///   over through validation
/// - the justification is required for terminal targets and discarded
///   for all others
/// - counsellor/validator names are attached only with the matching
///   target
///
/// The policy check has already happened; this function only computes
/// fields. The one validation it owns is the justification invariant,
/// which is about the change payload rather than roles or statuses.
pub fn apply_status_change(
    convention: &Convention,
    target: ConventionStatus,
    change: &StatusChange,
    now: OffsetDateTime,
) -> Result<Convention, DomainError> {
    if target.requires_justification()
        && change
            .justification
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .is_none()
    {
        return Err(DomainError::MissingJustification { target });
    }

    let mut updated = convention.clone();
    updated.status = target;
    updated.updated_at = now;

    match target {
        ConventionStatus::AcceptedByCounsellor => {
            updated.date_approval = Some(now);
            updated.date_validation = None;
        }
        ConventionStatus::AcceptedByValidator => {
            updated.date_validation = Some(now);
            // date_approval carried over from counsellor acceptance.
        }
        _ => {}
    }

    updated.status_justification = if target.requires_justification() {
        change.justification.clone()
    } else {
        None
    };

    if target == ConventionStatus::AcceptedByCounsellor {
        if let Some(name) = &change.counsellor_name {
            updated.agency_counsellor = Some(name.clone());
        }
    }
    if target == ConventionStatus::AcceptedByValidator {
        if let Some(name) = &change.validator_name {
            updated.agency_validator = Some(name.clone());
        }
    }

    Ok(updated)
}
