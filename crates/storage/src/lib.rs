//! convene-storage: collaborator contracts for the convention core.
//!
//! The engine consumes storage exclusively through the traits in
//! [`traits`]; the core never assumes a backend. This crate ships the
//! trait definitions, the boundary record types, a reference in-memory
//! backend, and a backend-agnostic conformance suite real backends can
//! run against themselves.

mod error;
mod memory;
mod record;
mod traits;

pub mod conformance;

pub use error::StorageError;
pub use memory::InMemoryStore;
pub use record::{
    AssessmentRecord, NotificationRecord, OutboxRecord, Recipient, ShortLinkRecord,
};
pub use traits::{
    AgencyRepository, AssessmentRepository, ConventionQueries, ConventionRepository,
    NotificationRepository, OutboxRepository, ShortLinkRepository, Store, UserRepository,
};
