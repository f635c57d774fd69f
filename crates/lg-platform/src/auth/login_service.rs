//! Login Decision Engine
//!
//! Orchestrates tenant resolution, credential verification, tenant-match
//! enforcement, and the force-reset gate. Each step short-circuits; the
//! outcome set is closed and callers handle all six variants explicitly.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::credential_store::{normalize_email, CredentialStore, Verification};
use crate::profile::entity::Role;
use crate::profile::repository::ProfileStore;
use crate::shared::error::Result;
use crate::tenant::repository::TenantDirectory;

/// Closed set of login outcomes. Transient store failures surface as
/// `Err(PortalError)` from `attempt_login`, never as an outcome.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// The tenant slug did not resolve. Checked before any credential call,
    /// so slug validity never leaks credential information.
    InvalidTenant,
    /// The credential store rejected the pair. Coarse by design: no
    /// user-not-found vs bad-password distinction.
    AuthError { code: String, message: String },
    /// A verified identity with no profile - a hard inconsistency.
    ProfileNotFound { user_id: String },
    /// Non-master authenticating against a tenant that is not theirs.
    WrongTenant,
    /// Credentials are valid but a reset must be completed first. No
    /// session is issued.
    ForceResetRequired { user_id: String },
    Success {
        user_id: String,
        email: String,
        role: Role,
        tenant_id: Option<String>,
        token: String,
    },
}

pub struct LoginService {
    tenants: Arc<dyn TenantDirectory>,
    credentials: Arc<dyn CredentialStore>,
    profiles: Arc<dyn ProfileStore>,
}

impl LoginService {
    pub fn new(
        tenants: Arc<dyn TenantDirectory>,
        credentials: Arc<dyn CredentialStore>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self { tenants, credentials, profiles }
    }

    /// The login decision procedure, in strict order:
    /// tenant -> credentials -> profile -> tenant match -> force-reset gate.
    pub async fn attempt_login(
        &self,
        email: &str,
        password: &str,
        tenant_slug: &str,
    ) -> Result<LoginOutcome> {
        // Identities are stored with normalized emails; the typed address
        // must match regardless of casing or stray whitespace.
        let email = normalize_email(email);
        let email = email.as_str();

        // 1. Tenant resolution comes first: an unknown slug must fail
        //    without touching the credential store.
        let Some(tenant) = self.tenants.find_by_slug(tenant_slug).await? else {
            info!(tenant_slug, "login rejected: unknown tenant");
            return Ok(LoginOutcome::InvalidTenant);
        };

        // 2. Credential verification.
        let identity = match self.credentials.verify(email, password).await? {
            Verification::Verified(identity) => identity,
            Verification::Rejected { code, message } => {
                info!(email, tenant_slug, "login rejected: credentials");
                return Ok(LoginOutcome::AuthError { code, message });
            }
        };

        // 3. Profile load. An identity without a profile is a hard
        //    inconsistency, not a transient condition.
        let Some(profile) = self.profiles.find_by_user_id(&identity.user_id).await? else {
            error!(
                user_id = %identity.user_id,
                "verified identity has no profile"
            );
            return Ok(LoginOutcome::ProfileNotFound { user_id: identity.user_id });
        };

        // 4. Tenant-match enforcement. Masters cross tenant boundaries by
        //    design - a deliberate operator escape hatch.
        if profile.role.is_tenant_scoped() && profile.tenant_id.as_deref() != Some(tenant.id.as_str()) {
            warn!(
                user_id = %identity.user_id,
                tenant_slug,
                "login rejected: tenant mismatch"
            );
            return Ok(LoginOutcome::WrongTenant);
        }

        // 5. Force-reset gate: no session before the reset completes.
        if profile.force_reset {
            return Ok(LoginOutcome::ForceResetRequired { user_id: identity.user_id });
        }

        // 6. Success.
        let token = self.credentials
            .issue_session(
                &identity.user_id,
                &identity.email,
                profile.role,
                profile.tenant_id.clone(),
            )
            .await?;

        info!(user_id = %identity.user_id, tenant_slug, role = profile.role.as_str(), "login succeeded");

        Ok(LoginOutcome::Success {
            user_id: identity.user_id,
            email: identity.email,
            role: profile.role,
            tenant_id: profile.tenant_id,
            token,
        })
    }
}
