//! Status-to-event-topic mapping and the event payload.
//!
//! Every applied transition publishes at most one domain event, stamped
//! with the same timestamp as the status change so event time and entity
//! time never diverge. `READY_TO_SIGN` publishes nothing: re-entry via an
//! edit is not an announcement-worthy lifecycle step.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::convention::Convention;
use crate::credential::TriggeredBy;
use crate::status::ConventionStatus;

/// Immutable status-to-topic table, injected where events are built so
/// tests can substitute alternate mappings.
#[derive(Debug, Clone)]
pub struct EventTopicTable {
    topics: BTreeMap<ConventionStatus, &'static str>,
}

impl Default for EventTopicTable {
    fn default() -> Self {
        let topics = BTreeMap::from([
            (
                ConventionStatus::PartiallySigned,
                "ConventionPartiallySigned",
            ),
            (ConventionStatus::InReview, "ConventionFullySigned"),
            (
                ConventionStatus::AcceptedByCounsellor,
                "ConventionAcceptedByCounsellor",
            ),
            (
                ConventionStatus::AcceptedByValidator,
                "ConventionAcceptedByValidator",
            ),
            (ConventionStatus::Rejected, "ConventionRejected"),
            (ConventionStatus::Cancelled, "ConventionCancelled"),
            (ConventionStatus::Deprecated, "ConventionDeprecated"),
        ]);
        EventTopicTable { topics }
    }
}

impl EventTopicTable {
    pub fn new(topics: BTreeMap<ConventionStatus, &'static str>) -> Self {
        EventTopicTable { topics }
    }

    /// The topic for a status, or `None` for statuses that publish
    /// nothing.
    pub fn topic_for(&self, status: ConventionStatus) -> Option<&'static str> {
        self.topics.get(&status).copied()
    }
}

/// A queued domain event carrying the updated convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConventionEvent {
    pub topic: String,
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
    pub convention: Convention,
    pub triggered_by: TriggeredBy,
}

impl ConventionEvent {
    /// Build the event for a convention that just entered its current
    /// status, or `None` when that status publishes nothing.
    pub fn for_status(
        table: &EventTopicTable,
        convention: &Convention,
        triggered_by: TriggeredBy,
        occurred_at: OffsetDateTime,
    ) -> Option<ConventionEvent> {
        table
            .topic_for(convention.status)
            .map(|topic| ConventionEvent {
                topic: topic.to_string(),
                occurred_at,
                convention: convention.clone(),
                triggered_by,
            })
    }
}
