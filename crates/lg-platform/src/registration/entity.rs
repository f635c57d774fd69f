//! Pending Registration Entity
//!
//! A self-service signup intent. Existence in the pending set IS the
//! "awaiting approval" state; the record is terminated exactly once, either
//! by approval (promoted, then deleted) or by the reaper after it expires.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

/// Default retention before an unapproved signup is reaped.
pub const DEFAULT_RETENTION_DAYS: i64 = 45;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRegistration {
    #[serde(rename = "_id")]
    pub id: String,

    pub email: String,

    pub full_name: String,

    /// Target tenant slug. Deliberately NOT resolved at intake time; a
    /// missing tenant surfaces at approval as `TenantMissing`.
    pub tenant_slug: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,

    /// AES-256-GCM ciphertext of the submitted password, base64, nonce
    /// prefixed. Never stored in the clear.
    pub encrypted_password: String,

    #[serde(default)]
    pub metadata: serde_json::Value,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
}

impl PendingRegistration {
    pub fn new(
        email: impl Into<String>,
        full_name: impl Into<String>,
        tenant_slug: impl Into<String>,
        encrypted_password: impl Into<String>,
        retention_days: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.into(),
            full_name: full_name.into(),
            tenant_slug: tenant_slug.into(),
            user_type: None,
            encrypted_password: encrypted_password.into(),
            metadata: serde_json::Value::Null,
            created_at: now,
            expires_at: now + Duration::days(retention_days),
        }
    }

    pub fn with_user_type(mut self, user_type: impl Into<String>) -> Self {
        self.user_type = Some(user_type.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
