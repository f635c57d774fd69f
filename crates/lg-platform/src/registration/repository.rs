//! Pending Registration Store
//!
//! `delete` doubles as the approval serialization point: the approver whose
//! delete actually removes the record wins the race.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{Collection, Database, bson::doc};
use crate::registration::entity::PendingRegistration;
use crate::shared::error::Result;

#[async_trait]
pub trait PendingRegistrationStore: Send + Sync {
    async fn insert(&self, registration: &PendingRegistration) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<PendingRegistration>>;

    /// Returns false when the record was already gone.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Delete every record whose `expires_at` is strictly before `now`.
    /// Returns the number deleted.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

pub struct MongoPendingRegistrationStore {
    collection: Collection<PendingRegistration>,
}

impl MongoPendingRegistrationStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("pending_registrations"),
        }
    }
}

#[async_trait]
impl PendingRegistrationStore for MongoPendingRegistrationStore {
    async fn insert(&self, registration: &PendingRegistration) -> Result<()> {
        self.collection.insert_one(registration).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PendingRegistration>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = self.collection
            .delete_many(doc! {
                "expiresAt": { "$lt": bson::DateTime::from_chrono(now) }
            })
            .await?;
        Ok(result.deleted_count)
    }
}
