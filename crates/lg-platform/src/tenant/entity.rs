//! Tenant Entity
//!
//! An isolated customer/organization namespace. Created by provisioning and
//! immutable afterwards; the slug is the human-facing lookup key used on
//! every login attempt.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    #[serde(rename = "_id")]
    pub id: String,

    /// Unique URL-safe slug
    pub slug: String,

    /// Display name
    pub name: String,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            slug: slug.into(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}
