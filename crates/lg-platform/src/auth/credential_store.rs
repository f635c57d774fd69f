//! Credential Store
//!
//! System of record for (email, password) verification and session issuance.
//! The core only depends on the trait; `EmbeddedCredentialStore` is the
//! built-in implementation backed by the Mongo `credentials` collection,
//! Argon2id hashing, and the token service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{Collection, Database, bson::doc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

use crate::auth::password_service::PasswordService;
use crate::auth::token_service::TokenService;
use crate::profile::entity::Role;
use crate::shared::error::{PortalError, Result};

/// Canonical form for email addresses. Intake, identity creation, and
/// login all pass through this so a user who typed `Dana@Acme.Test` at
/// signup can still log in with any casing of the same address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Mongo duplicate-key write error (code 11000).
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(ref we))
            if we.code == 11000
    )
}

/// Verification result. Rejections are deliberately coarse: callers never
/// learn whether the email or the password was wrong.
#[derive(Debug, Clone)]
pub enum Verification {
    Verified(VerifiedIdentity),
    Rejected { code: String, message: String },
}

#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub user_id: String,
    pub email: String,
}

/// Input for identity creation at approval time.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: String,
    pub password: String,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Verify an (email, password) pair. Store failures are `Err`; a
    /// mismatch is a `Rejected` verification, never an error.
    async fn verify(&self, email: &str, password: &str) -> Result<Verification>;

    /// Create a new identity. Fails with `Conflict` on a duplicate email.
    async fn create_identity(&self, identity: NewIdentity) -> Result<String>;

    async fn find_identity(&self, user_id: &str) -> Result<Option<VerifiedIdentity>>;

    async fn update_password(&self, user_id: &str, new_password: &str) -> Result<()>;

    /// Remove an identity (the approval rollback path). Returns false when
    /// no identity matched.
    async fn delete_identity(&self, user_id: &str) -> Result<bool>;

    /// Issue a session token for a fully-gated login.
    async fn issue_session(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
        tenant_id: Option<String>,
    ) -> Result<String>;
}

/// Stored credential record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

pub struct EmbeddedCredentialStore {
    collection: Collection<CredentialRecord>,
    password_service: Arc<PasswordService>,
    token_service: Arc<TokenService>,
}

impl EmbeddedCredentialStore {
    pub fn new(
        db: &Database,
        password_service: Arc<PasswordService>,
        token_service: Arc<TokenService>,
    ) -> Self {
        Self {
            collection: db.collection("credentials"),
            password_service,
            token_service,
        }
    }

    /// Create the unique email index. Run once at startup; the index is
    /// what turns a concurrent duplicate insert into a `Conflict` instead
    /// of a second identity for the same address.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = mongodb::IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                mongodb::options::IndexOptions::builder()
                    .unique(true)
                    .build(),
            )
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    fn rejection() -> Verification {
        Verification::Rejected {
            code: "invalid_credentials".to_string(),
            message: "Invalid email or password".to_string(),
        }
    }
}

#[async_trait]
impl CredentialStore for EmbeddedCredentialStore {
    async fn verify(&self, email: &str, password: &str) -> Result<Verification> {
        let email = normalize_email(email);
        let record = self.collection.find_one(doc! { "email": &email }).await?;

        let Some(record) = record else {
            return Ok(Self::rejection());
        };

        if !self.password_service.verify_password(password, &record.password_hash)? {
            return Ok(Self::rejection());
        }

        Ok(Verification::Verified(VerifiedIdentity {
            user_id: record.user_id,
            email: record.email,
        }))
    }

    async fn create_identity(&self, identity: NewIdentity) -> Result<String> {
        let email = normalize_email(&identity.email);
        if self.collection.find_one(doc! { "email": &email }).await?.is_some() {
            return Err(PortalError::conflict(format!(
                "An account already exists for {email}"
            )));
        }

        let now = Utc::now();
        let record = CredentialRecord {
            user_id: uuid::Uuid::new_v4().to_string(),
            email,
            password_hash: self.password_service.hash_password(&identity.password)?,
            created_at: now,
            updated_at: now,
        };
        // The unique index serializes concurrent inserts for the same
        // address; the loser sees a duplicate-key error, not Transient.
        if let Err(e) = self.collection.insert_one(&record).await {
            if is_duplicate_key(&e) {
                return Err(PortalError::conflict(format!(
                    "An account already exists for {}",
                    record.email
                )));
            }
            return Err(e.into());
        }
        Ok(record.user_id)
    }

    async fn find_identity(&self, user_id: &str) -> Result<Option<VerifiedIdentity>> {
        let record = self.collection.find_one(doc! { "_id": user_id }).await?;
        Ok(record.map(|r| VerifiedIdentity {
            user_id: r.user_id,
            email: r.email,
        }))
    }

    async fn update_password(&self, user_id: &str, new_password: &str) -> Result<()> {
        let hash = self.password_service.hash_password(new_password)?;
        let result = self.collection
            .update_one(
                doc! { "_id": user_id },
                doc! { "$set": {
                    "passwordHash": hash,
                    "updatedAt": bson::DateTime::from_chrono(Utc::now()),
                } },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(PortalError::not_found("Credential", user_id));
        }
        Ok(())
    }

    async fn delete_identity(&self, user_id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": user_id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn issue_session(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
        tenant_id: Option<String>,
    ) -> Result<String> {
        self.token_service.generate_session(user_id, email, role, tenant_id)
    }
}
