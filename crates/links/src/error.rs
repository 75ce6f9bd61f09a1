use convene_storage::StorageError;
use time::OffsetDateTime;

/// Errors produced while issuing, verifying or resolving links.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The token is malformed, carries a bad signature, or was signed by
    /// another key. Deliberately a single variant: callers get no oracle
    /// about which part failed.
    #[error("invalid token")]
    InvalidToken,

    /// The token is authentic but past its expiry. Distinct from
    /// [`LinkError::InvalidToken`] so callers can offer a renewal flow.
    #[error("token expired at {expired_at}")]
    Expired { expired_at: OffsetDateTime },

    /// Short-link id space exhausted after several collision retries.
    #[error("could not allocate a short link id")]
    ShortIdExhausted,

    /// Underlying storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
