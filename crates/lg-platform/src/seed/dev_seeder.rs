//! Development Data Seeder
//!
//! Seeds development data on application startup when dev mode is enabled.
//!
//! Default credentials:
//!   Master:       master@learngate.local / DevPassword123!
//!   Acme Admin:   alice@acme.test / DevPassword123!
//!   Acme User:    bob@acme.test / DevPassword123!

use std::sync::Arc;
use tracing::info;

use crate::auth::credential_store::{CredentialStore, NewIdentity};
use crate::profile::entity::{Profile, Role};
use crate::profile::repository::ProfileStore;
use crate::shared::error::PortalError;
use crate::tenant::entity::Tenant;
use crate::tenant::repository::TenantDirectory;

const DEV_PASSWORD: &str = "DevPassword123!";

/// Development data seeder
pub struct DevDataSeeder {
    tenants: Arc<dyn TenantDirectory>,
    profiles: Arc<dyn ProfileStore>,
    credentials: Arc<dyn CredentialStore>,
}

impl DevDataSeeder {
    pub fn new(
        tenants: Arc<dyn TenantDirectory>,
        profiles: Arc<dyn ProfileStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self { tenants, profiles, credentials }
    }

    /// Seed all development data. Idempotent: existing tenants and
    /// identities are left alone.
    pub async fn seed(&self) -> Result<(), PortalError> {
        info!("=== DEV DATA SEEDER ===");
        info!("Seeding development data...");

        let acme = self.seed_tenant("acme", "Acme Training").await?;
        let globex = self.seed_tenant("globex", "Globex Learning").await?;

        self.seed_user("master@learngate.local", Role::Master, None).await?;
        self.seed_user("alice@acme.test", Role::Admin, Some(acme.id.as_str())).await?;
        self.seed_user("bob@acme.test", Role::User, Some(acme.id.as_str())).await?;
        self.seed_user("carol@globex.test", Role::Admin, Some(globex.id.as_str())).await?;

        info!("Development data seeded successfully!");
        info!("");
        info!("Default logins:");
        info!("  Master:     master@learngate.local / {}", DEV_PASSWORD);
        info!("  Acme Admin: alice@acme.test / {}", DEV_PASSWORD);
        info!("  Acme User:  bob@acme.test / {}", DEV_PASSWORD);
        info!("=======================");

        Ok(())
    }

    async fn seed_tenant(&self, slug: &str, name: &str) -> Result<Tenant, PortalError> {
        if let Some(existing) = self.tenants.find_by_slug(slug).await? {
            return Ok(existing);
        }

        let tenant = Tenant::new(slug, name);
        self.tenants.insert(&tenant).await?;
        info!("Created tenant: {} ({})", name, slug);
        Ok(tenant)
    }

    async fn seed_user(
        &self,
        email: &str,
        role: Role,
        tenant_id: Option<&str>,
    ) -> Result<(), PortalError> {
        let user_id = match self
            .credentials
            .create_identity(NewIdentity {
                email: email.to_string(),
                password: DEV_PASSWORD.to_string(),
            })
            .await
        {
            Ok(user_id) => user_id,
            // Already seeded on a previous startup
            Err(PortalError::Conflict { .. }) => return Ok(()),
            Err(err) => return Err(err),
        };

        let profile = match tenant_id {
            Some(tenant_id) => Profile::new(&user_id, role, tenant_id),
            None => Profile::new_master(&user_id),
        };
        self.profiles.insert(&profile).await?;

        info!("Created {} user: {}", role.as_str(), email);
        Ok(())
    }
}
