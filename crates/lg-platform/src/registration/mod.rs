//! Registration Aggregate
//!
//! Two-phase registration: public intake queues an encrypted request,
//! admin approval creates the account. Expired requests are reaped.

pub mod api;
pub mod cipher;
pub mod entity;
pub mod rate_limit;
pub mod repository;
pub mod service;

pub use api::{maintenance_router, registration_router, RegistrationApiState};
pub use cipher::RegistrationCipher;
pub use entity::PendingRegistration;
pub use rate_limit::{IntakePolicy, IntakeRateLimiter};
pub use repository::{MongoPendingRegistrationStore, PendingRegistrationStore};
pub use service::{
    ApprovalDenial, ApprovalOutcome, IntakeOutcome, RegistrationService, SubmitRegistration,
};
