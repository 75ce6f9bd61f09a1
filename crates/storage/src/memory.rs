//! Reference in-memory backend.
//!
//! Backs the serve mode and the test suites. Maps guarded by
//! `tokio::sync::RwLock`; the OCC check on `update` is performed under
//! the write lock, making it a conditional write like a real backend's
//! `UPDATE ... WHERE updated_at = $expected`.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use convene_core::{Agency, Convention, ConventionReadModel, User};

use crate::error::StorageError;
use crate::record::{
    AssessmentRecord, NotificationRecord, OutboxRecord, Recipient, ShortLinkRecord,
};
use crate::traits::{
    AgencyRepository, AssessmentRepository, ConventionQueries, ConventionRepository,
    NotificationRepository, OutboxRepository, ShortLinkRepository, UserRepository,
};

/// All repositories in one struct.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    conventions: RwLock<BTreeMap<String, Convention>>,
    agencies: RwLock<BTreeMap<String, Agency>>,
    users: RwLock<BTreeMap<String, User>>,
    assessments: RwLock<BTreeMap<String, AssessmentRecord>>,
    notifications: RwLock<Vec<NotificationRecord>>,
    short_links: RwLock<BTreeMap<String, ShortLinkRecord>>,
    consumed_links: RwLock<HashSet<String>>,
    outbox: RwLock<Vec<OutboxRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConventionRepository for InMemoryStore {
    async fn get_by_id(&self, convention_id: &str) -> Result<Option<Convention>, StorageError> {
        Ok(self.conventions.read().await.get(convention_id).cloned())
    }

    async fn update(
        &self,
        convention: &Convention,
        expected_updated_at: OffsetDateTime,
    ) -> Result<Option<String>, StorageError> {
        let mut conventions = self.conventions.write().await;
        match conventions.get(&convention.id) {
            None => Ok(None),
            Some(stored) if stored.updated_at != expected_updated_at => {
                Err(StorageError::ConcurrentConflict {
                    convention_id: convention.id.clone(),
                    presented: expected_updated_at,
                })
            }
            Some(_) => {
                conventions.insert(convention.id.clone(), convention.clone());
                Ok(Some(convention.id.clone()))
            }
        }
    }

    async fn insert(&self, convention: &Convention) -> Result<(), StorageError> {
        self.conventions
            .write()
            .await
            .insert(convention.id.clone(), convention.clone());
        Ok(())
    }
}

#[async_trait]
impl ConventionQueries for InMemoryStore {
    async fn get_convention_read_model(
        &self,
        convention_id: &str,
    ) -> Result<Option<ConventionReadModel>, StorageError> {
        let convention = match self.conventions.read().await.get(convention_id) {
            Some(convention) => convention.clone(),
            None => return Ok(None),
        };
        let agencies = self.agencies.read().await;
        let agency = agencies.get(&convention.agency_id);
        Ok(Some(ConventionReadModel {
            agency_name: agency.map(|a| a.name.clone()).unwrap_or_default(),
            agency_refers_to: agency.and_then(|a| a.refers_to_agency_id.clone()),
            convention,
        }))
    }
}

#[async_trait]
impl AgencyRepository for InMemoryStore {
    async fn get_agency(&self, agency_id: &str) -> Result<Option<Agency>, StorageError> {
        Ok(self.agencies.read().await.get(agency_id).cloned())
    }

    async fn get_agencies(&self, agency_ids: &[String]) -> Result<Vec<Agency>, StorageError> {
        let agencies = self.agencies.read().await;
        Ok(agency_ids
            .iter()
            .filter_map(|id| agencies.get(id).cloned())
            .collect())
    }

    async fn insert_agency(&self, agency: &Agency) -> Result<(), StorageError> {
        self.agencies
            .write()
            .await
            .insert(agency.id.clone(), agency.clone());
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StorageError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn get_users(&self, user_ids: &[String]) -> Result<Vec<User>, StorageError> {
        let users = self.users.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| users.get(id).cloned())
            .collect())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        self.users
            .write()
            .await
            .insert(user.id.clone(), user.clone());
        Ok(())
    }
}

#[async_trait]
impl AssessmentRepository for InMemoryStore {
    async fn get_by_convention_id(
        &self,
        convention_id: &str,
    ) -> Result<Option<AssessmentRecord>, StorageError> {
        Ok(self.assessments.read().await.get(convention_id).cloned())
    }

    async fn insert_assessment(&self, assessment: &AssessmentRecord) -> Result<(), StorageError> {
        self.assessments
            .write()
            .await
            .insert(assessment.convention_id.clone(), assessment.clone());
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn save_notification(
        &self,
        notification: &NotificationRecord,
    ) -> Result<(), StorageError> {
        self.notifications.write().await.push(notification.clone());
        Ok(())
    }

    async fn last_of_kind(
        &self,
        kind: &str,
        convention_id: &str,
        recipient: &Recipient,
    ) -> Result<Option<NotificationRecord>, StorageError> {
        let notifications = self.notifications.read().await;
        // RFC 3339 UTC timestamps order lexicographically.
        Ok(notifications
            .iter()
            .filter(|n| {
                n.kind == kind && n.convention_id == convention_id && &n.recipient == recipient
            })
            .max_by(|a, b| a.created_at.cmp(&b.created_at))
            .cloned())
    }
}

#[async_trait]
impl ShortLinkRepository for InMemoryStore {
    async fn save_short_link(&self, record: &ShortLinkRecord) -> Result<(), StorageError> {
        let mut short_links = self.short_links.write().await;
        if short_links.contains_key(&record.id) {
            return Err(StorageError::ShortLinkExists {
                short_id: record.id.clone(),
            });
        }
        short_links.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn resolve(&self, short_id: &str) -> Result<Option<ShortLinkRecord>, StorageError> {
        let short_links = self.short_links.read().await;
        let record = match short_links.get(short_id) {
            Some(record) => record.clone(),
            None => return Ok(None),
        };
        drop(short_links);

        if record.single_use {
            let mut consumed = self.consumed_links.write().await;
            if !consumed.insert(short_id.to_string()) {
                return Err(StorageError::ShortLinkConsumed {
                    short_id: short_id.to_string(),
                });
            }
        }
        Ok(Some(record))
    }
}

#[async_trait]
impl OutboxRepository for InMemoryStore {
    async fn queue_event(&self, record: &OutboxRecord) -> Result<(), StorageError> {
        self.outbox.write().await.push(record.clone());
        Ok(())
    }

    async fn pending_events(&self) -> Result<Vec<OutboxRecord>, StorageError> {
        Ok(self.outbox.read().await.clone())
    }
}
