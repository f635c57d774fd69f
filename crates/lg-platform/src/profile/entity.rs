//! Profile Entity
//!
//! Per-user record tying a credential-store identity to a role and a tenant.
//! Non-master profiles always belong to exactly one tenant; a master is the
//! deliberate cross-tenant escape hatch for operators.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

/// Closed role set. Every capability decision goes through the methods below
/// rather than ad hoc string comparisons, so the set stays auditable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular learner
    User,
    /// Tenant administrator
    Admin,
    /// Platform operator, exempt from tenant scoping
    Master,
    /// Course supervisor
    Supervisor,
    /// Read-only compliance role
    Auditor,
}

impl Role {
    /// Post-login landing path for this role.
    pub fn redirect_target(&self) -> &'static str {
        match self {
            Role::User => "/portal",
            Role::Admin => "/admin",
            Role::Master => "/operator",
            Role::Supervisor => "/supervisor",
            Role::Auditor => "/audit",
        }
    }

    /// Whether login and admin actions are confined to the profile's tenant.
    /// Only masters cross tenant boundaries.
    pub fn is_tenant_scoped(&self) -> bool {
        !matches!(self, Role::Master)
    }

    /// Whether this role may promote pending registrations.
    pub fn can_approve_registrations(&self) -> bool {
        matches!(self, Role::Admin | Role::Master)
    }

    /// Whether this role may force a password reset on another user.
    pub fn can_trigger_resets(&self) -> bool {
        matches!(self, Role::Admin | Role::Master)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Master => "master",
            Role::Supervisor => "supervisor",
            Role::Auditor => "auditor",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::User
    }
}

/// Profile status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    /// Created but not yet authorized for access
    Pending,
    /// Fully active
    Active,
}

impl Default for ProfileStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// Profile entity - 1:1 with a credential-store identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Credential-store user id
    #[serde(rename = "_id")]
    pub user_id: String,

    #[serde(default)]
    pub role: Role,

    /// Home tenant. `None` only for masters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    #[serde(default)]
    pub status: ProfileStatus,

    /// When set, the user must complete a password reset before any access.
    #[serde(default)]
    pub force_reset: bool,

    /// Free-form signup type carried over from the registration request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Tenant-scoped profile. Callers must pass a real tenant id; the
    /// tenant-less form is reserved for masters.
    pub fn new(user_id: impl Into<String>, role: Role, tenant_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            role,
            tenant_id: Some(tenant_id.into()),
            status: ProfileStatus::Active,
            force_reset: false,
            user_type: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Master profile, not bound to any tenant.
    pub fn new_master(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            role: Role::Master,
            tenant_id: None,
            status: ProfileStatus::Active,
            force_reset: false,
            user_type: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_user_type(mut self, user_type: impl Into<String>) -> Self {
        self.user_type = Some(user_type.into());
        self
    }

    pub fn with_force_reset(mut self) -> Self {
        self.force_reset = true;
        self
    }

    /// Tenant invariant: non-master profiles must carry a tenant id.
    pub fn tenant_invariant_holds(&self) -> bool {
        !self.role.is_tenant_scoped() || self.tenant_id.is_some()
    }
}
