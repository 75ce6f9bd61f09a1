use time::OffsetDateTime;

/// All errors a storage backend can return.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// Optimistic concurrency conflict: the convention's stored
    /// `updated_at` no longer matches what the caller last read.
    #[error("concurrent update on convention {convention_id}: stale updated_at {presented}")]
    ConcurrentConflict {
        convention_id: String,
        presented: OffsetDateTime,
    },

    /// A short link id was saved twice. The mapping is write-once.
    #[error("short link '{short_id}' already exists")]
    ShortLinkExists { short_id: String },

    /// A single-use short link was resolved a second time.
    #[error("short link '{short_id}' already consumed")]
    ShortLinkConsumed { short_id: String },

    /// A backend-specific error (connection, serialization, ...).
    #[error("storage backend error: {0}")]
    Backend(String),
}
