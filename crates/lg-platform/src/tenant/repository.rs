//! Tenant Directory
//!
//! Authoritative source of which tenant a login attempt targets. The trait is
//! the seam the services depend on; the Mongo implementation is what the
//! server wires in.

use async_trait::async_trait;
use mongodb::{Collection, Database, bson::doc};
use crate::tenant::entity::Tenant;
use crate::shared::error::Result;

#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>>;
    async fn insert(&self, tenant: &Tenant) -> Result<()>;
}

pub struct MongoTenantDirectory {
    collection: Collection<Tenant>,
}

impl MongoTenantDirectory {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("tenants"),
        }
    }
}

#[async_trait]
impl TenantDirectory for MongoTenantDirectory {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>> {
        Ok(self.collection.find_one(doc! { "slug": slug }).await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn insert(&self, tenant: &Tenant) -> Result<()> {
        self.collection.insert_one(tenant).await?;
        Ok(())
    }
}
