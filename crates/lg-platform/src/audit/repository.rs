//! Auth Log Store

use async_trait::async_trait;
use mongodb::{Collection, Database};
use crate::audit::entity::AuthLog;
use crate::shared::error::Result;

#[async_trait]
pub trait AuthLogStore: Send + Sync {
    async fn append(&self, entry: &AuthLog) -> Result<()>;
}

pub struct MongoAuthLogStore {
    collection: Collection<AuthLog>,
}

impl MongoAuthLogStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("auth_logs"),
        }
    }
}

#[async_trait]
impl AuthLogStore for MongoAuthLogStore {
    async fn append(&self, entry: &AuthLog) -> Result<()> {
        self.collection.insert_one(entry).await?;
        Ok(())
    }
}
