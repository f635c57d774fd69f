//! In-memory store implementations shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use lg_platform::auth::credential_store::{
    CredentialStore, NewIdentity, Verification, VerifiedIdentity,
};
use lg_platform::auth::token_service::{TokenConfig, TokenService};
use lg_platform::profile::entity::{Profile, Role};
use lg_platform::profile::repository::ProfileStore;
use lg_platform::registration::entity::PendingRegistration;
use lg_platform::registration::repository::PendingRegistrationStore;
use lg_platform::shared::error::{PortalError, Result};
use lg_platform::tenant::entity::Tenant;
use lg_platform::tenant::repository::TenantDirectory;
use lg_platform::audit::entity::AuthLog;
use lg_platform::audit::repository::AuthLogStore;

pub fn test_token_service() -> Arc<TokenService> {
    Arc::new(TokenService::new_with_secret(TokenConfig {
        secret_key: "test-secret-key-for-sessions".to_string(),
        ..TokenConfig::default()
    }))
}

#[derive(Default)]
pub struct InMemoryTenantDirectory {
    tenants: Mutex<Vec<Tenant>>,
}

impl InMemoryTenantDirectory {
    pub fn with_tenants(tenants: Vec<Tenant>) -> Self {
        Self {
            tenants: Mutex::new(tenants),
        }
    }
}

#[async_trait]
impl TenantDirectory for InMemoryTenantDirectory {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>> {
        Ok(self
            .tenants
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.slug == slug)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>> {
        Ok(self
            .tenants
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn insert(&self, tenant: &Tenant) -> Result<()> {
        self.tenants.lock().unwrap().push(tenant.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<String, Profile>>,
    /// When set, `insert` fails with a transient error. Exercises the
    /// approval rollback path.
    pub fail_inserts: AtomicBool,
}

impl InMemoryProfileStore {
    pub fn get(&self, user_id: &str) -> Option<Profile> {
        self.profiles.lock().unwrap().get(user_id).cloned()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn insert(&self, profile: &Profile) -> Result<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(PortalError::transient("profile store unavailable"));
        }
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Profile>> {
        Ok(self.profiles.lock().unwrap().get(user_id).cloned())
    }

    async fn set_force_reset(&self, user_id: &str, value: bool) -> Result<bool> {
        let mut profiles = self.profiles.lock().unwrap();
        match profiles.get_mut(user_id) {
            Some(profile) => {
                profile.force_reset = value;
                profile.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear_force_reset(&self, user_id: &str) -> Result<bool> {
        let mut profiles = self.profiles.lock().unwrap();
        match profiles.get_mut(user_id) {
            Some(profile) if profile.force_reset => {
                profile.force_reset = false;
                profile.status = lg_platform::profile::entity::ProfileStatus::Active;
                profile.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, user_id: &str) -> Result<bool> {
        Ok(self.profiles.lock().unwrap().remove(user_id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryPendingStore {
    pending: Mutex<HashMap<String, PendingRegistration>>,
}

impl InMemoryPendingStore {
    pub fn count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

#[async_trait]
impl PendingRegistrationStore for InMemoryPendingStore {
    async fn insert(&self, registration: &PendingRegistration) -> Result<()> {
        self.pending
            .lock()
            .unwrap()
            .insert(registration.id.clone(), registration.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PendingRegistration>> {
        Ok(self.pending.lock().unwrap().get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.pending.lock().unwrap().remove(id).is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut pending = self.pending.lock().unwrap();
        let before = pending.len();
        pending.retain(|_, r| r.expires_at >= now);
        Ok((before - pending.len()) as u64)
    }
}

struct StoredIdentity {
    user_id: String,
    email: String,
    password: String,
}

/// Credential store backed by a plaintext map. Counts `verify` calls so
/// tests can assert credentials are never checked before the tenant gate.
pub struct InMemoryCredentialStore {
    identities: Mutex<Vec<StoredIdentity>>,
    tokens: Arc<TokenService>,
    pub verify_calls: AtomicUsize,
    /// When set, `update_password` fails with a transient error. Exercises
    /// the reset-flag restore path.
    pub fail_password_updates: AtomicBool,
    next_id: AtomicUsize,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            identities: Mutex::new(Vec::new()),
            tokens: test_token_service(),
            verify_calls: AtomicUsize::new(0),
            fail_password_updates: AtomicBool::new(false),
            next_id: AtomicUsize::new(1),
        }
    }

    pub fn seed_identity(&self, email: &str, password: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let user_id = format!("user-{}", n);
        self.identities.lock().unwrap().push(StoredIdentity {
            user_id: user_id.clone(),
            email: email.to_string(),
            password: password.to_string(),
        });
        user_id
    }

    pub fn has_identity(&self, user_id: &str) -> bool {
        self.identities
            .lock()
            .unwrap()
            .iter()
            .any(|i| i.user_id == user_id)
    }

    pub fn password_of(&self, user_id: &str) -> Option<String> {
        self.identities
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.user_id == user_id)
            .map(|i| i.password.clone())
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn verify(&self, email: &str, password: &str) -> Result<Verification> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let identities = self.identities.lock().unwrap();
        match identities.iter().find(|i| i.email == email) {
            Some(identity) if identity.password == password => {
                Ok(Verification::Verified(VerifiedIdentity {
                    user_id: identity.user_id.clone(),
                    email: identity.email.clone(),
                }))
            }
            _ => Ok(Verification::Rejected {
                code: "invalid_credentials".to_string(),
                message: "Invalid email or password".to_string(),
            }),
        }
    }

    async fn create_identity(&self, identity: NewIdentity) -> Result<String> {
        {
            let identities = self.identities.lock().unwrap();
            if identities.iter().any(|i| i.email == identity.email) {
                return Err(PortalError::conflict(format!(
                    "Identity already exists for {}",
                    identity.email
                )));
            }
        }
        Ok(self.seed_identity(&identity.email, &identity.password))
    }

    async fn find_identity(&self, user_id: &str) -> Result<Option<VerifiedIdentity>> {
        Ok(self
            .identities
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.user_id == user_id)
            .map(|i| VerifiedIdentity {
                user_id: i.user_id.clone(),
                email: i.email.clone(),
            }))
    }

    async fn update_password(&self, user_id: &str, new_password: &str) -> Result<()> {
        if self.fail_password_updates.load(Ordering::SeqCst) {
            return Err(PortalError::transient("credential store unavailable"));
        }
        let mut identities = self.identities.lock().unwrap();
        match identities.iter_mut().find(|i| i.user_id == user_id) {
            Some(identity) => {
                identity.password = new_password.to_string();
                Ok(())
            }
            None => Err(PortalError::not_found("identity", user_id)),
        }
    }

    async fn delete_identity(&self, user_id: &str) -> Result<bool> {
        let mut identities = self.identities.lock().unwrap();
        let before = identities.len();
        identities.retain(|i| i.user_id != user_id);
        Ok(identities.len() < before)
    }

    async fn issue_session(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
        tenant_id: Option<String>,
    ) -> Result<String> {
        self.tokens.generate_session(user_id, email, role, tenant_id)
    }
}

#[derive(Default)]
pub struct InMemoryAuthLogStore {
    entries: Mutex<Vec<AuthLog>>,
}

impl InMemoryAuthLogStore {
    pub fn entries(&self) -> Vec<AuthLog> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthLogStore for InMemoryAuthLogStore {
    async fn append(&self, entry: &AuthLog) -> Result<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}
