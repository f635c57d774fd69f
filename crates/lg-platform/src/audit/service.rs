//! Audit Service
//!
//! Thin wrapper over the auth-log store. An audit write failure is logged but
//! never fails the operation that produced it; the trail is best effort,
//! the store writes are not.

use std::sync::Arc;
use tracing::error;

use crate::audit::entity::{AuthEventType, AuthLog};
use crate::audit::repository::AuthLogStore;

#[derive(Clone)]
pub struct AuditService {
    store: Arc<dyn AuthLogStore>,
}

impl AuditService {
    pub fn new(store: Arc<dyn AuthLogStore>) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        user_email: &str,
        event_type: AuthEventType,
        actor_id: Option<&str>,
        details: serde_json::Value,
    ) {
        let entry = AuthLog::new(
            user_email,
            event_type,
            actor_id.map(String::from),
            details,
        );
        if let Err(e) = self.store.append(&entry).await {
            error!(user_email, ?event_type, "failed to append auth log entry: {}", e);
        }
    }
}
