//! Forced-Reset Workflows
//!
//! Self-service completion of a forced password reset, and the
//! admin-triggered reset that flags a user in the first place.

use std::sync::Arc;
use serde_json::json;
use tracing::{info, warn};

use crate::audit::entity::AuthEventType;
use crate::audit::service::AuditService;
use crate::auth::credential_store::CredentialStore;
use crate::auth::password_service::generate_temp_password;
use crate::profile::repository::ProfileStore;
use crate::shared::error::Result;

/// Outcome of a self-service reset completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    Completed,
    /// The profile is not flagged (or does not exist). Keeps the endpoint
    /// from acting as a generic unauthenticated password-change primitive.
    NotRequired,
}

/// Outcome of an admin-triggered reset.
#[derive(Debug, Clone)]
pub enum AdminResetOutcome {
    Reset { temp_password: String },
    Denied(ResetDenial),
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetDenial {
    /// Actor is not an admin or master
    Unauthorized,
    /// Tenant-scoped admin targeting a user outside their tenant
    CrossTenant,
}

pub struct ForceResetService {
    profiles: Arc<dyn ProfileStore>,
    credentials: Arc<dyn CredentialStore>,
    audit: AuditService,
}

impl ForceResetService {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        credentials: Arc<dyn CredentialStore>,
        audit: AuditService,
    ) -> Self {
        Self { profiles, credentials, audit }
    }

    /// Complete a forced reset: atomically clear the flag and activate the
    /// profile, then write the new password. The compare-and-clear
    /// serializes concurrent completions, so only the winner's password is
    /// ever written; the loser observes `NotRequired` without touching the
    /// credential store. A failed password write restores the flag so the
    /// reset can be retried.
    pub async fn complete(&self, user_id: &str, new_password: &str) -> Result<ResetOutcome> {
        let Some(profile) = self.profiles.find_by_user_id(user_id).await? else {
            warn!(user_id, "reset completion for unknown profile");
            return Ok(ResetOutcome::NotRequired);
        };

        if !profile.force_reset {
            return Ok(ResetOutcome::NotRequired);
        }

        if !self.profiles.clear_force_reset(user_id).await? {
            return Ok(ResetOutcome::NotRequired);
        }

        if let Err(e) = self.credentials.update_password(user_id, new_password).await {
            warn!(user_id, "password write failed after clearing reset flag, restoring");
            self.profiles.set_force_reset(user_id, true).await?;
            return Err(e);
        }

        info!(user_id, "forced reset completed");
        let email = self.email_for(user_id).await;
        self.audit
            .record(&email, AuthEventType::ForceResetCompleted, None, json!({ "userId": user_id }))
            .await;

        Ok(ResetOutcome::Completed)
    }

    /// Admin/master forces a reset on a user: generates a temporary
    /// password, writes it to the credential store, and flags the profile.
    pub async fn admin_reset(
        &self,
        actor_user_id: &str,
        target_user_id: &str,
    ) -> Result<AdminResetOutcome> {
        let Some(actor) = self.profiles.find_by_user_id(actor_user_id).await? else {
            return Ok(AdminResetOutcome::Denied(ResetDenial::Unauthorized));
        };

        if !actor.role.can_trigger_resets() {
            return Ok(AdminResetOutcome::Denied(ResetDenial::Unauthorized));
        }

        let Some(target) = self.profiles.find_by_user_id(target_user_id).await? else {
            return Ok(AdminResetOutcome::NotFound);
        };

        // Tenant-scoped admins may only reset users in their own tenant.
        if actor.role.is_tenant_scoped() && actor.tenant_id != target.tenant_id {
            return Ok(AdminResetOutcome::Denied(ResetDenial::CrossTenant));
        }

        let temp_password = generate_temp_password();
        self.credentials.update_password(target_user_id, &temp_password).await?;
        self.profiles.set_force_reset(target_user_id, true).await?;

        info!(actor = actor_user_id, target = target_user_id, "admin-triggered reset");
        let email = self.email_for(target_user_id).await;
        self.audit
            .record(
                &email,
                AuthEventType::AdminResetTriggered,
                Some(actor_user_id),
                json!({ "userId": target_user_id, "targetRole": target.role.as_str() }),
            )
            .await;

        Ok(AdminResetOutcome::Reset { temp_password })
    }

    /// Best-effort email lookup for the audit trail; falls back to the user
    /// id when the identity cannot be resolved.
    async fn email_for(&self, user_id: &str) -> String {
        match self.credentials.find_identity(user_id).await {
            Ok(Some(identity)) => identity.email,
            _ => user_id.to_string(),
        }
    }
}
