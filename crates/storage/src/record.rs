//! Record types crossing the storage boundary.
//!
//! Timestamps are RFC 3339 strings at this boundary; parsing back to
//! `OffsetDateTime` is the caller's concern where it matters (the
//! reminder throttle).

use serde::{Deserialize, Serialize};

/// Where a notification was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "address", rename_all = "kebab-case")]
pub enum Recipient {
    Email(String),
    Sms(String),
}

impl Recipient {
    pub fn address(&self) -> &str {
        match self {
            Recipient::Email(address) | Recipient::Sms(address) => address,
        }
    }
}

/// One sent (or queued) notification. The reminder throttle reconstructs
/// its state from these rather than from a dedicated table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    /// Notification class, e.g. `"signature-reminder"`.
    pub kind: String,
    pub convention_id: String,
    pub recipient: Recipient,
    /// RFC 3339.
    pub created_at: String,
}

/// Write-once mapping from an opaque short id to a long capability URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLinkRecord {
    pub id: String,
    pub long_url: String,
    /// When set, the backend must refuse a second resolution.
    pub single_use: bool,
    /// RFC 3339.
    pub created_at: String,
}

/// Marker that an assessment exists for a convention. Assessments
/// themselves live elsewhere; the transition guards only need presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub convention_id: String,
    /// RFC 3339.
    pub created_at: String,
}

/// A queued domain event, persisted in the same transaction as the state
/// change it announces. Delivery downstream is at-least-once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxRecord {
    pub id: String,
    pub topic: String,
    /// RFC 3339; equals the entity's `updated_at` for the same change.
    pub occurred_at: String,
    pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipient_serializes_with_channel_tag() {
        let json = serde_json::to_value(Recipient::Sms("0612345678".to_string())).unwrap();
        assert_eq!(json["channel"], "sms");
        assert_eq!(json["address"], "0612345678");
        assert_eq!(
            Recipient::Email("a@b.example".to_string()).address(),
            "a@b.example"
        );
    }

    #[test]
    fn notification_record_round_trips() {
        let record = NotificationRecord {
            id: "notif-1".to_string(),
            kind: "signature-reminder".to_string(),
            convention_id: "conv-1".to_string(),
            recipient: Recipient::Email("bob@beneficiary.example".to_string()),
            created_at: "2024-03-02T10:00:00Z".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: NotificationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
