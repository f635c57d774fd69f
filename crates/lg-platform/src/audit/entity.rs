//! Auth Log Entity
//!
//! Append-only trail of security-sensitive events. Written by the approval
//! and reset workflows, never read by the core logic.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

/// Auth event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventType {
    /// Pending registration promoted to a real account
    RegistrationApproved,
    /// Admin forced a password reset on a user
    AdminResetTriggered,
    /// User completed a forced password reset
    ForceResetCompleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthLog {
    #[serde(rename = "_id")]
    pub id: String,

    /// Email of the affected user
    pub user_email: String,

    pub event_type: AuthEventType,

    /// Who performed the action (None for self-service events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,

    #[serde(default)]
    pub details: serde_json::Value,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
}

impl AuthLog {
    pub fn new(
        user_email: impl Into<String>,
        event_type: AuthEventType,
        actor_id: Option<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_email: user_email.into(),
            event_type,
            actor_id,
            details,
            timestamp: Utc::now(),
        }
    }
}
