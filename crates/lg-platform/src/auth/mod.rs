//! Authentication Aggregate
//!
//! Login decision procedure, session tokens, credential storage, and the
//! forced-reset flows.

pub mod api;
pub mod credential_store;
pub mod force_reset_service;
pub mod login_service;
pub mod password_service;
pub mod token_service;

pub use api::{auth_router, AuthApiState};
pub use credential_store::{
    normalize_email, CredentialStore, EmbeddedCredentialStore, NewIdentity, Verification,
    VerifiedIdentity,
};
pub use force_reset_service::{
    AdminResetOutcome, ForceResetService, ResetDenial, ResetOutcome,
};
pub use login_service::{LoginOutcome, LoginService};
pub use password_service::{Argon2Config, PasswordPolicy, PasswordService};
pub use token_service::{SessionClaims, TokenConfig, TokenService};
