use time::Duration;

use convene_core::DomainError;
use convene_links::LinkError;
use convene_storage::StorageError;

/// Format a remaining wait as `"<h>h<mm>"`, e.g. `"3h05"`.
pub(crate) fn format_remaining(remaining: &Duration) -> String {
    let total_minutes = remaining.whole_minutes().max(0);
    format!("{}h{:02}", total_minutes / 60, total_minutes % 60)
}

/// All errors an engine operation can return.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Link(#[from] LinkError),

    /// A reminder of this kind was sent to this recipient too recently.
    /// Carries the remaining wait as data; the message formats it as
    /// `"<h>h<mm>"`.
    #[error("'{kind}' already sent to {recipient}; retry in {}", format_remaining(.remaining))]
    Throttled {
        kind: String,
        recipient: String,
        remaining: Duration,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_wait_formats_hours_and_minutes() {
        assert_eq!(format_remaining(&Duration::minutes(185)), "3h05");
        assert_eq!(format_remaining(&Duration::minutes(59)), "0h59");
        assert_eq!(format_remaining(&Duration::hours(24)), "24h00");
        // Clamped at zero rather than going negative.
        assert_eq!(format_remaining(&Duration::minutes(-10)), "0h00");
    }

    #[test]
    fn throttled_message_embeds_the_wait() {
        let err = EngineError::Throttled {
            kind: "signature-reminder".to_string(),
            recipient: "bob@beneficiary.example".to_string(),
            remaining: Duration::minutes(125),
        };
        let message = err.to_string();
        assert!(message.contains("2h05"), "{message}");
        assert!(message.contains("signature-reminder"));
    }
}
