//! convene-core: Convention lifecycle domain library.
//!
//! A Convention is a multi-party work-immersion agreement that moves
//! through a closed status lifecycle: signatories sign in any order,
//! the owning agency reviews and validates, and negative outcomes
//! (rejection, cancellation, deprecation) are terminal.
//!
//! This crate holds everything that can be expressed without I/O:
//!
//! - [`Convention`] -- the aggregate, its signatory slots, the
//!   completion law ([`status_after_signature`])
//! - [`ConventionStatus`] -- the status enum and its predicates
//! - [`Credential`] / [`resolve_roles`] -- the two credential shapes
//!   (scoped magic-link token vs. authenticated user) unified into one
//!   `Vec<Role>` output
//! - [`TransitionPolicy`] -- the table of role/status-gated transitions
//!   with ordered guards
//! - [`sign_convention`] -- the signing protocol for one signatory
//! - [`apply_status_change`] -- derived-field computation per target
//!   status
//! - [`EventTopicTable`] -- the status-to-event-topic mapping
//!
//! Orchestration over repositories lives in `convene-engine`.

pub mod clock;
pub mod convention;
pub mod credential;
pub mod derived;
pub mod error;
pub mod events;
pub mod party;
pub mod phone;
pub mod resolver;
pub mod roles;
pub mod signing;
pub mod status;
pub mod transition;

// ── Convenience re-exports: key types ────────────────────────────────

pub use clock::{Clock, FixedClock, SystemClock};
pub use convention::{
    status_after_signature, Actor, Convention, ConventionReadModel, PersonName, Signatories,
};
pub use credential::{Credential, TriggeredBy};
pub use derived::{apply_status_change, StatusChange};
pub use error::DomainError;
pub use events::{ConventionEvent, EventTopicTable};
pub use party::{Agency, AgencyRights, User};
pub use resolver::resolve_roles;
pub use roles::{AgencyRole, Role, SIGNATORY_ROLES};
pub use signing::{sign_convention, SignatureOutcome};
pub use status::ConventionStatus;
pub use transition::{TransitionContext, TransitionPolicy, TransitionRule};

/// Identifier of a convention. Opaque to this crate; assigned at creation.
pub type ConventionId = String;
/// Identifier of an agency.
pub type AgencyId = String;
/// Identifier of an authenticated user account.
pub type UserId = String;
