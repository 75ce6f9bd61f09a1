//! The repository traits the engine consumes.
//!
//! ## Absence is typed
//!
//! Lookups return `Option`; `ConventionRepository::update` returns
//! `Ok(None)` when no row matched the id. Callers translate absence into
//! their own not-found error; backends never guess.
//!
//! ## OCC contract
//!
//! `update` takes the `updated_at` the caller last read and must fail
//! with [`StorageError::ConcurrentConflict`] when the stored value
//! differs. Backends implement this as a conditional write
//! (`UPDATE ... WHERE updated_at = $expected`), never read-then-write.
//!
//! ## Thread safety
//!
//! Implementations must be `Send + Sync + 'static` to be shared across
//! async task boundaries and axum application state.

use async_trait::async_trait;
use time::OffsetDateTime;

use convene_core::{Agency, Convention, ConventionReadModel, User};

use crate::error::StorageError;
use crate::record::{
    AssessmentRecord, NotificationRecord, OutboxRecord, Recipient, ShortLinkRecord,
};

/// Write-side convention persistence.
#[async_trait]
pub trait ConventionRepository: Send + Sync + 'static {
    async fn get_by_id(&self, convention_id: &str) -> Result<Option<Convention>, StorageError>;

    /// Persist `convention` if a row with its id exists and still
    /// carries `expected_updated_at`.
    ///
    /// Returns the id on success, `Ok(None)` when no row matched the id,
    /// and `Err(ConcurrentConflict)` when the row exists with a
    /// different `updated_at`.
    async fn update(
        &self,
        convention: &Convention,
        expected_updated_at: OffsetDateTime,
    ) -> Result<Option<String>, StorageError>;

    /// Insert a new convention. Creation flows live outside the core;
    /// the serve mode and tests use this to seed.
    async fn insert(&self, convention: &Convention) -> Result<(), StorageError>;
}

/// Read-model queries: denormalized views including the agency fields
/// the transition guards need.
#[async_trait]
pub trait ConventionQueries: Send + Sync + 'static {
    async fn get_convention_read_model(
        &self,
        convention_id: &str,
    ) -> Result<Option<ConventionReadModel>, StorageError>;
}

#[async_trait]
pub trait AgencyRepository: Send + Sync + 'static {
    async fn get_agency(&self, agency_id: &str) -> Result<Option<Agency>, StorageError>;
    async fn get_agencies(&self, agency_ids: &[String]) -> Result<Vec<Agency>, StorageError>;
    async fn insert_agency(&self, agency: &Agency) -> Result<(), StorageError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StorageError>;
    async fn get_users(&self, user_ids: &[String]) -> Result<Vec<User>, StorageError>;
    async fn insert_user(&self, user: &User) -> Result<(), StorageError>;
}

/// Presence of assessments, for the cancellation guard.
#[async_trait]
pub trait AssessmentRepository: Send + Sync + 'static {
    async fn get_by_convention_id(
        &self,
        convention_id: &str,
    ) -> Result<Option<AssessmentRecord>, StorageError>;
    async fn insert_assessment(&self, assessment: &AssessmentRecord) -> Result<(), StorageError>;
}

/// Sent-notification history, queried by the reminder throttle.
#[async_trait]
pub trait NotificationRepository: Send + Sync + 'static {
    async fn save_notification(&self, notification: &NotificationRecord)
        -> Result<(), StorageError>;

    /// The most recent notification of `kind` for `convention_id` sent
    /// to `recipient`, by `created_at`.
    async fn last_of_kind(
        &self,
        kind: &str,
        convention_id: &str,
        recipient: &Recipient,
    ) -> Result<Option<NotificationRecord>, StorageError>;
}

/// Write-once short-link mappings.
#[async_trait]
pub trait ShortLinkRepository: Send + Sync + 'static {
    /// Persist the mapping. Fails with [`StorageError::ShortLinkExists`]
    /// if the id is taken.
    async fn save_short_link(&self, record: &ShortLinkRecord) -> Result<(), StorageError>;

    /// Resolve a short id to its record. For single-use links the
    /// backend must refuse the second resolution with
    /// [`StorageError::ShortLinkConsumed`].
    async fn resolve(&self, short_id: &str) -> Result<Option<ShortLinkRecord>, StorageError>;
}

/// The transactional outbox. Events are queued here in the same
/// transaction as the state change; delivery is downstream's job.
#[async_trait]
pub trait OutboxRepository: Send + Sync + 'static {
    async fn queue_event(&self, record: &OutboxRecord) -> Result<(), StorageError>;

    /// All queued records, oldest first. Used by the delivery loop and
    /// by tests asserting exactly which events a scenario produced.
    async fn pending_events(&self) -> Result<Vec<OutboxRecord>, StorageError>;
}

/// Umbrella over every repository the engine needs. Blanket-implemented,
/// so any type implementing the individual traits is a `Store`.
pub trait Store:
    ConventionRepository
    + ConventionQueries
    + AgencyRepository
    + UserRepository
    + AssessmentRepository
    + NotificationRepository
    + ShortLinkRepository
    + OutboxRepository
{
}

impl<T> Store for T where
    T: ConventionRepository
        + ConventionQueries
        + AgencyRepository
        + UserRepository
        + AssessmentRepository
        + NotificationRepository
        + ShortLinkRepository
        + OutboxRepository
{
}
