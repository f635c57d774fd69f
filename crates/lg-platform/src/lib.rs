//! LearnGate Platform
//!
//! Multi-tenant training portal backend providing:
//! - Tenant-aware password login with a strict decision order
//! - Two-phase registration (public intake, admin approval)
//! - Forced-password-reset lifecycle
//! - Reaping of expired pending registrations
//! - Append-only audit log of security events
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Data access traits and Mongo implementations
//! - `api` - REST endpoints (where applicable)
//! - services beside the aggregate they govern

// Core aggregates
pub mod profile;
pub mod registration;
pub mod tenant;

// Authentication & authorization
pub mod audit;
pub mod auth;

// Shared infrastructure
pub mod shared;

// Development tooling
pub mod seed;

// Re-export common types from shared
pub use shared::error::{ErrorResponse, PortalError, Result};
pub use shared::middleware::{AppState, AuthLayer, Authenticated};

// Re-export main entity types for convenience
pub use audit::entity::{AuthEventType, AuthLog};
pub use profile::entity::{Profile, ProfileStatus, Role};
pub use registration::entity::PendingRegistration;
pub use tenant::entity::Tenant;

// Re-export store traits and Mongo implementations
pub use audit::repository::{AuthLogStore, MongoAuthLogStore};
pub use auth::credential_store::{CredentialStore, EmbeddedCredentialStore};
pub use profile::repository::{MongoProfileStore, ProfileStore};
pub use registration::repository::{MongoPendingRegistrationStore, PendingRegistrationStore};
pub use tenant::repository::{MongoTenantDirectory, TenantDirectory};

// Re-export services
pub use audit::service::AuditService;
pub use auth::force_reset_service::ForceResetService;
pub use auth::login_service::LoginService;
pub use auth::password_service::{Argon2Config, PasswordPolicy, PasswordService};
pub use auth::token_service::{TokenConfig, TokenService};
pub use registration::cipher::RegistrationCipher;
pub use registration::rate_limit::{IntakePolicy, IntakeRateLimiter};
pub use registration::service::RegistrationService;
pub use seed::DevDataSeeder;
