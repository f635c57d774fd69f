//! Profile Store
//!
//! Read path for the login decision engine, write path for approval and the
//! reset workflows. The force-reset clear is an atomic compare-and-clear so
//! two racing completions serialize on the store.

use async_trait::async_trait;
use chrono::Utc;
use mongodb::{Collection, Database, bson::doc};
use crate::profile::entity::Profile;
use crate::shared::error::Result;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn insert(&self, profile: &Profile) -> Result<()>;

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Profile>>;

    /// Flag or unflag a user for forced reset. Returns false when no profile
    /// matched.
    async fn set_force_reset(&self, user_id: &str, value: bool) -> Result<bool>;

    /// Atomically clear the force-reset flag and activate the profile.
    /// Returns false when the flag was not set (already cleared, or no such
    /// profile) - the idempotence point for forced-reset completion.
    async fn clear_force_reset(&self, user_id: &str) -> Result<bool>;

    async fn delete(&self, user_id: &str) -> Result<bool>;
}

pub struct MongoProfileStore {
    collection: Collection<Profile>,
}

impl MongoProfileStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("profiles"),
        }
    }
}

#[async_trait]
impl ProfileStore for MongoProfileStore {
    async fn insert(&self, profile: &Profile) -> Result<()> {
        self.collection.insert_one(profile).await?;
        Ok(())
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Profile>> {
        Ok(self.collection.find_one(doc! { "_id": user_id }).await?)
    }

    async fn set_force_reset(&self, user_id: &str, value: bool) -> Result<bool> {
        let result = self.collection
            .update_one(
                doc! { "_id": user_id },
                doc! { "$set": {
                    "forceReset": value,
                    "updatedAt": bson::DateTime::from_chrono(Utc::now()),
                } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn clear_force_reset(&self, user_id: &str) -> Result<bool> {
        // Filter on the flag itself: a concurrent completion that already
        // cleared it makes this a no-op.
        let result = self.collection
            .update_one(
                doc! { "_id": user_id, "forceReset": true },
                doc! { "$set": {
                    "forceReset": false,
                    "status": "active",
                    "updatedAt": bson::DateTime::from_chrono(Utc::now()),
                } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, user_id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": user_id }).await?;
        Ok(result.deleted_count > 0)
    }
}
