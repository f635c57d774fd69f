//! Registration Service
//!
//! The two-phase registration workflow: self-service intake creates a
//! pending record; an authorized admin later promotes it into a real
//! identity + profile; the reaper deletes whatever was never approved.

use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{error, info, warn};

use crate::audit::entity::AuthEventType;
use crate::audit::service::AuditService;
use crate::auth::credential_store::{normalize_email, CredentialStore, NewIdentity};
use crate::profile::entity::{Profile, Role};
use crate::profile::repository::ProfileStore;
use crate::registration::cipher::RegistrationCipher;
use crate::registration::entity::PendingRegistration;
use crate::registration::rate_limit::IntakeRateLimiter;
use crate::registration::repository::PendingRegistrationStore;
use crate::shared::error::Result;
use crate::tenant::repository::TenantDirectory;

/// A signup submission.
#[derive(Debug, Clone)]
pub struct SubmitRegistration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub tenant_slug: String,
    pub user_type: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Intake outcome. The tenant slug is deliberately not validated here;
/// that check is deferred to approval.
#[derive(Debug, Clone)]
pub enum IntakeOutcome {
    Accepted { pending_id: String },
    RateLimited,
    Invalid { message: String },
}

/// Approval outcome.
#[derive(Debug, Clone)]
pub enum ApprovalOutcome {
    Approved {
        user_id: String,
        email: String,
        role: Role,
        tenant_id: String,
    },
    Denied(ApprovalDenial),
    /// Pending record gone - never existed, expired, or another approver won
    /// the race.
    NotFound,
    /// Deferred-validation failure unique to two-phase registration: the
    /// slug no longer (or never did) resolve.
    TenantMissing { slug: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDenial {
    /// Actor is not an admin or master
    Unauthorized,
    /// Tenant-scoped admin approving into a foreign tenant
    CrossTenant,
}

pub struct RegistrationService {
    pending: Arc<dyn PendingRegistrationStore>,
    tenants: Arc<dyn TenantDirectory>,
    profiles: Arc<dyn ProfileStore>,
    credentials: Arc<dyn CredentialStore>,
    audit: AuditService,
    cipher: Arc<RegistrationCipher>,
    limiter: Arc<IntakeRateLimiter>,
    retention_days: i64,
}

impl RegistrationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pending: Arc<dyn PendingRegistrationStore>,
        tenants: Arc<dyn TenantDirectory>,
        profiles: Arc<dyn ProfileStore>,
        credentials: Arc<dyn CredentialStore>,
        audit: AuditService,
        cipher: Arc<RegistrationCipher>,
        limiter: Arc<IntakeRateLimiter>,
        retention_days: i64,
    ) -> Self {
        Self {
            pending,
            tenants,
            profiles,
            credentials,
            audit,
            cipher,
            limiter,
            retention_days,
        }
    }

    /// Accept a signup as a pending record. The password is encrypted at
    /// rest; the record expires after the retention window if never
    /// approved.
    pub async fn submit(&self, submission: SubmitRegistration) -> Result<IntakeOutcome> {
        if let Some(message) = validate_submission(&submission) {
            return Ok(IntakeOutcome::Invalid { message });
        }

        let key = normalize_email(&submission.email);
        if !self.limiter.check(&key) {
            warn!(email = %key, "registration rate limited");
            return Ok(IntakeOutcome::RateLimited);
        }

        let encrypted_password = self.cipher.encrypt(&submission.password)?;

        let mut registration = PendingRegistration::new(
            key.clone(),
            submission.full_name.trim(),
            submission.tenant_slug.trim(),
            encrypted_password,
            self.retention_days,
        );
        if let Some(user_type) = submission.user_type {
            registration = registration.with_user_type(user_type);
        }
        if let Some(metadata) = submission.metadata {
            registration = registration.with_metadata(metadata);
        }

        self.pending.insert(&registration).await?;

        info!(pending_id = %registration.id, email = %key, "registration accepted");
        Ok(IntakeOutcome::Accepted { pending_id: registration.id })
    }

    /// Promote a pending record into an identity + active profile.
    ///
    /// Identity creation, profile creation, and pending deletion form one
    /// logical transaction: a profile-creation failure rolls the identity
    /// back rather than leaving an orphaned credential.
    pub async fn approve(
        &self,
        actor_user_id: &str,
        pending_id: &str,
        assign_role: Role,
    ) -> Result<ApprovalOutcome> {
        // 1. Actor must hold an approving role.
        let Some(actor) = self.profiles.find_by_user_id(actor_user_id).await? else {
            return Ok(ApprovalOutcome::Denied(ApprovalDenial::Unauthorized));
        };
        if !actor.role.can_approve_registrations() {
            return Ok(ApprovalOutcome::Denied(ApprovalDenial::Unauthorized));
        }

        // 2. Target must exist.
        let Some(registration) = self.pending.find_by_id(pending_id).await? else {
            return Ok(ApprovalOutcome::NotFound);
        };

        // 3. Tenant-scoped admins may only approve into their own tenant.
        if actor.role.is_tenant_scoped() {
            let admin_slug = match &actor.tenant_id {
                Some(tenant_id) => self
                    .tenants
                    .find_by_id(tenant_id)
                    .await?
                    .map(|t| t.slug),
                None => None,
            };
            if admin_slug.as_deref() != Some(registration.tenant_slug.as_str()) {
                return Ok(ApprovalOutcome::Denied(ApprovalDenial::CrossTenant));
            }
        }

        // 4. Deferred tenant validation: the slug was taken on faith at
        //    intake time and may no longer resolve.
        let Some(tenant) = self.tenants.find_by_slug(&registration.tenant_slug).await? else {
            warn!(
                pending_id,
                slug = %registration.tenant_slug,
                "approval failed: tenant missing"
            );
            return Ok(ApprovalOutcome::TenantMissing {
                slug: registration.tenant_slug,
            });
        };

        // Re-check existence immediately before mutating the credential
        // store; concurrent approvals serialize on the pending deletion
        // below (first deleter wins, narrow TOCTOU accepted).
        if self.pending.find_by_id(pending_id).await?.is_none() {
            return Ok(ApprovalOutcome::NotFound);
        }

        let password = self.cipher.decrypt(&registration.encrypted_password)?;
        let user_id = self
            .credentials
            .create_identity(NewIdentity {
                email: registration.email.clone(),
                password,
            })
            .await?;

        let mut profile = Profile::new(user_id.clone(), assign_role, tenant.id.clone());
        if let Some(user_type) = &registration.user_type {
            profile = profile.with_user_type(user_type.clone());
        }

        if let Err(profile_err) = self.profiles.insert(&profile).await {
            // Mandatory compensating rollback: never leave a credential
            // with no profile behind it.
            error!(
                user_id = %user_id,
                "profile creation failed after identity creation, rolling back: {}",
                profile_err
            );
            if let Err(rollback_err) = self.credentials.delete_identity(&user_id).await {
                error!(
                    user_id = %user_id,
                    "identity rollback failed, orphaned credential: {}",
                    rollback_err
                );
            }
            return Err(profile_err);
        }

        if !self.pending.delete(pending_id).await? {
            // Another approver deleted it between our re-check and now.
            // Their promotion stands; undo ours.
            warn!(pending_id, "lost approval race after identity creation, rolling back");
            self.profiles.delete(&user_id).await?;
            self.credentials.delete_identity(&user_id).await?;
            return Ok(ApprovalOutcome::NotFound);
        }

        info!(
            pending_id,
            user_id = %user_id,
            tenant = %tenant.slug,
            role = assign_role.as_str(),
            "registration approved"
        );
        self.audit
            .record(
                &registration.email,
                AuthEventType::RegistrationApproved,
                Some(actor_user_id),
                json!({
                    "pendingId": pending_id,
                    "tenantSlug": tenant.slug,
                    "assignedRole": assign_role.as_str(),
                }),
            )
            .await;

        Ok(ApprovalOutcome::Approved {
            user_id,
            email: registration.email,
            role: assign_role,
            tenant_id: tenant.id,
        })
    }

    /// Delete every pending record that expired before `now`. Safe to run
    /// concurrently with intake and approval; it only touches rows already
    /// past their window.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<u64> {
        let deleted = self.pending.delete_expired(now).await?;
        if deleted > 0 {
            info!(deleted, "reaped expired pending registrations");
        }
        Ok(deleted)
    }
}

fn validate_submission(submission: &SubmitRegistration) -> Option<String> {
    let missing: Vec<&str> = [
        ("email", submission.email.trim()),
        ("password", submission.password.as_str()),
        ("fullName", submission.full_name.trim()),
        ("tenantSlug", submission.tenant_slug.trim()),
    ]
    .iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(name, _)| *name)
    .collect();

    if missing.is_empty() {
        None
    } else {
        Some(format!("Missing required fields: {}", missing.join(", ")))
    }
}
