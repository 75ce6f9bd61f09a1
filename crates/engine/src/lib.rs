//! convene-engine: the operations callers invoke.
//!
//! Each operation takes a structured input plus a [`Credential`], runs
//! the core guards, persists through the storage traits, and queues the
//! matching domain event in the same logical step as the write. Guards
//! fail fast before any mutation; the only locally recovered errors are
//! per-recipient failures in notification fan-out, which are aggregated
//! instead of aborting siblings.
//!
//! [`Credential`]: convene_core::Credential

mod auth;
mod edit;
mod engine;
mod error;
mod reminders;
mod sign;
mod transfer;
mod update_status;

pub use edit::{ConventionEdit, EditInput};
pub use engine::Engine;
pub use error::EngineError;
pub use reminders::{
    FanOutReport, ReminderThrottle, SentLink, ASSESSMENT_LINK_REMINDER_KIND,
    SIGNATURE_LINK_KIND, SIGNATURE_REMINDER_KIND,
};
pub use sign::{SignInput, SignOutcome};
pub use transfer::TransferInput;
pub use update_status::UpdateStatusInput;
