//! Table-driven transition policy.
//!
//! For each target status the table answers: which roles may request it,
//! from which source statuses it is legal, and an optional semantic
//! refine guard for cases a role/status pair cannot express.
//!
//! Guard order is fixed -- role, then status, then the cancellation
//! assessment guard, then refine -- so error messages are deterministic.
//!
//! The table is immutable, injected configuration: construct it once
//! (usually via `Default`) and hand it to whatever runs transitions.
//! Tests substitute alternate tables.

use std::collections::BTreeMap;

use crate::convention::{Convention, ConventionReadModel};
use crate::error::DomainError;
use crate::roles::{Role, SIGNATORY_ROLES};
use crate::status::ConventionStatus;

/// The read-model slice the guards need.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    pub convention: &'a Convention,
    /// Parent agency id when the owning agency delegates validation.
    pub agency_refers_to: Option<&'a str>,
}

impl<'a> From<&'a ConventionReadModel> for TransitionContext<'a> {
    fn from(read: &'a ConventionReadModel) -> Self {
        TransitionContext {
            convention: &read.convention,
            agency_refers_to: read.agency_refers_to.as_deref(),
        }
    }
}

impl<'a> TransitionContext<'a> {
    /// Context for a bare convention, with no agency fields loaded.
    /// Sufficient for the signing path, whose targets carry no refine
    /// guard.
    pub fn bare(convention: &'a Convention) -> Self {
        TransitionContext {
            convention,
            agency_refers_to: None,
        }
    }
}

/// A semantic guard evaluated after the role and status checks.
/// Returns the rejection message, or `None` to let the transition pass.
pub type RefineGuard = fn(&TransitionContext<'_>) -> Option<String>;

/// One row of the policy table.
#[derive(Debug, Clone)]
pub struct TransitionRule {
    /// Roles permitted to request this target status.
    pub valid_roles: Vec<Role>,
    /// Source statuses from which the transition is legal.
    pub valid_initial_statuses: Vec<ConventionStatus>,
    /// Optional semantic guard, applied last.
    pub refine: Option<RefineGuard>,
}

/// The policy table plus the agency-transfer rule.
#[derive(Debug, Clone)]
pub struct TransitionPolicy {
    rules: BTreeMap<ConventionStatus, TransitionRule>,
    transfer: TransitionRule,
}

/// Validators of a delegating agency only act after their counsellor.
fn refine_validator_of_delegating_agency(ctx: &TransitionContext<'_>) -> Option<String> {
    if ctx.agency_refers_to.is_some()
        && ctx.convention.status != ConventionStatus::AcceptedByCounsellor
    {
        Some(format!(
            "agency '{}' delegates validation; the convention must be accepted by a counsellor first",
            ctx.convention.agency_id
        ))
    } else {
        None
    }
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        let agency_roles = vec![Role::Counsellor, Role::Validator, Role::BackOffice];
        let mut rules = BTreeMap::new();

        // Re-entry into READY_TO_SIGN happens when the content is edited
        // while still signable: signatories trigger it through an edit,
        // agency members and the back-office through a correction.
        let mut ready_roles = SIGNATORY_ROLES.to_vec();
        ready_roles.extend_from_slice(&agency_roles);
        rules.insert(
            ConventionStatus::ReadyToSign,
            TransitionRule {
                valid_roles: ready_roles,
                valid_initial_statuses: vec![
                    ConventionStatus::ReadyToSign,
                    ConventionStatus::PartiallySigned,
                ],
                refine: None,
            },
        );
        rules.insert(
            ConventionStatus::PartiallySigned,
            TransitionRule {
                valid_roles: SIGNATORY_ROLES.to_vec(),
                valid_initial_statuses: vec![
                    ConventionStatus::ReadyToSign,
                    ConventionStatus::PartiallySigned,
                ],
                refine: None,
            },
        );
        rules.insert(
            ConventionStatus::InReview,
            TransitionRule {
                valid_roles: SIGNATORY_ROLES.to_vec(),
                valid_initial_statuses: vec![
                    ConventionStatus::ReadyToSign,
                    ConventionStatus::PartiallySigned,
                ],
                refine: None,
            },
        );
        rules.insert(
            ConventionStatus::AcceptedByCounsellor,
            TransitionRule {
                valid_roles: vec![Role::Counsellor, Role::BackOffice],
                valid_initial_statuses: vec![ConventionStatus::InReview],
                refine: None,
            },
        );
        rules.insert(
            ConventionStatus::AcceptedByValidator,
            TransitionRule {
                valid_roles: vec![Role::Validator, Role::BackOffice],
                valid_initial_statuses: vec![
                    ConventionStatus::InReview,
                    ConventionStatus::AcceptedByCounsellor,
                ],
                refine: Some(refine_validator_of_delegating_agency),
            },
        );
        rules.insert(
            ConventionStatus::Rejected,
            TransitionRule {
                valid_roles: agency_roles.clone(),
                valid_initial_statuses: vec![
                    ConventionStatus::ReadyToSign,
                    ConventionStatus::PartiallySigned,
                    ConventionStatus::InReview,
                    ConventionStatus::AcceptedByCounsellor,
                ],
                refine: None,
            },
        );
        rules.insert(
            ConventionStatus::Cancelled,
            TransitionRule {
                valid_roles: agency_roles.clone(),
                valid_initial_statuses: vec![ConventionStatus::AcceptedByValidator],
                refine: None,
            },
        );
        rules.insert(
            ConventionStatus::Deprecated,
            TransitionRule {
                valid_roles: agency_roles.clone(),
                valid_initial_statuses: vec![
                    ConventionStatus::ReadyToSign,
                    ConventionStatus::PartiallySigned,
                    ConventionStatus::InReview,
                    ConventionStatus::AcceptedByCounsellor,
                ],
                refine: None,
            },
        );

        TransitionPolicy {
            rules,
            transfer: TransitionRule {
                valid_roles: agency_roles,
                valid_initial_statuses: vec![
                    ConventionStatus::ReadyToSign,
                    ConventionStatus::PartiallySigned,
                    ConventionStatus::InReview,
                ],
                refine: None,
            },
        }
    }
}

impl TransitionPolicy {
    /// Build a policy from explicit rules. `Default` provides the
    /// production table.
    pub fn new(rules: BTreeMap<ConventionStatus, TransitionRule>, transfer: TransitionRule) -> Self {
        TransitionPolicy { rules, transfer }
    }

    /// The rule for a target status, if the table has one.
    pub fn rule(&self, target: ConventionStatus) -> Option<&TransitionRule> {
        self.rules.get(&target)
    }

    /// Validate a requested transition to `target`.
    ///
    /// Check order: role, then source status, then the cancellation
    /// assessment guard, then the refine guard.
    pub fn ensure_transition_allowed(
        &self,
        target: ConventionStatus,
        roles: &[Role],
        ctx: &TransitionContext<'_>,
        has_assessment: bool,
    ) -> Result<(), DomainError> {
        let current = ctx.convention.status;
        // A target absent from the table is never reachable.
        let rule = self
            .rules
            .get(&target)
            .ok_or(DomainError::InvalidStatusTransition { current, target })?;

        if !roles.iter().any(|role| rule.valid_roles.contains(role)) {
            return Err(DomainError::RoleNotAllowedForTransition {
                roles: roles.to_vec(),
                target,
            });
        }
        if !rule.valid_initial_statuses.contains(&current) {
            return Err(DomainError::InvalidStatusTransition { current, target });
        }
        if target == ConventionStatus::Cancelled && has_assessment {
            return Err(DomainError::CancellationBlockedByAssessment {
                convention_id: ctx.convention.id.clone(),
            });
        }
        if let Some(refine) = rule.refine {
            if let Some(message) = refine(ctx) {
                return Err(DomainError::TransitionGuardRejected { message });
            }
        }
        Ok(())
    }

    /// Validate an agency transfer.
    ///
    /// Same shape as a status transition, plus: when the source agency
    /// itself delegates validation, only a counsellor or the back-office
    /// may request the transfer.
    pub fn ensure_transfer_allowed(
        &self,
        roles: &[Role],
        ctx: &TransitionContext<'_>,
    ) -> Result<(), DomainError> {
        let current = ctx.convention.status;
        if !roles
            .iter()
            .any(|role| self.transfer.valid_roles.contains(role))
        {
            return Err(DomainError::RoleNotAllowedForTransition {
                roles: roles.to_vec(),
                target: current,
            });
        }
        if !self.transfer.valid_initial_statuses.contains(&current) {
            return Err(DomainError::InvalidStatusTransition {
                current,
                target: current,
            });
        }
        if ctx.agency_refers_to.is_some()
            && !roles
                .iter()
                .any(|role| matches!(role, Role::Counsellor | Role::BackOffice))
        {
            return Err(DomainError::TransferNotAllowedForDelegatingAgency {
                agency_id: ctx.convention.agency_id.to_string(),
            });
        }
        Ok(())
    }
}
