//! Short-link indirection.
//!
//! SMS payload limits make a full signed token unusable in the message
//! body, so notifications carry `<base_url>/to/<short_id>` instead. The
//! mapping is write-once; single-use redemption is the storage
//! backend's contract, requested per link by the caller.

use rand::distributions::Alphanumeric;
use rand::Rng;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use convene_storage::{ShortLinkRecord, ShortLinkRepository};

use crate::error::LinkError;

/// Length of generated short ids. 62^10 ids make collisions a retry
/// case, not a design problem.
const SHORT_ID_LEN: usize = 10;

/// How many id collisions to tolerate before giving up.
const MAX_COLLISION_RETRIES: usize = 3;

/// Issues and resolves short links over a [`ShortLinkRepository`].
pub struct ShortLinkIssuer<S> {
    store: std::sync::Arc<S>,
    base_url: String,
}

impl<S: ShortLinkRepository> ShortLinkIssuer<S> {
    pub fn new(store: std::sync::Arc<S>, base_url: impl Into<String>) -> Self {
        ShortLinkIssuer {
            store,
            base_url: base_url.into(),
        }
    }

    /// Persist a mapping for `long_url` and return the short URL.
    ///
    /// `single_use` is the caller's intent: pass `true` only when the
    /// link must be redeemable exactly once, and the backend will refuse
    /// the second resolution.
    pub async fn shorten(
        &self,
        long_url: &str,
        single_use: bool,
        now: OffsetDateTime,
    ) -> Result<String, LinkError> {
        let created_at = now.format(&Rfc3339).unwrap_or_default();
        for _ in 0..=MAX_COLLISION_RETRIES {
            let short_id = generate_short_id();
            let record = ShortLinkRecord {
                id: short_id.clone(),
                long_url: long_url.to_string(),
                single_use,
                created_at: created_at.clone(),
            };
            match self.store.save_short_link(&record).await {
                Ok(()) => return Ok(format!("{}/to/{}", self.base_url, short_id)),
                Err(convene_storage::StorageError::ShortLinkExists { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(LinkError::ShortIdExhausted)
    }

    /// Resolve a short id back to its long URL.
    pub async fn resolve(&self, short_id: &str) -> Result<Option<String>, LinkError> {
        Ok(self
            .store
            .resolve(short_id)
            .await?
            .map(|record| record.long_url))
    }
}

fn generate_short_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHORT_ID_LEN)
        .map(char::from)
        .collect()
}
