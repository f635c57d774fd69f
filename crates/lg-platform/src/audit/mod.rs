//! Audit Aggregate
//!
//! Append-only log of security-relevant auth events.

pub mod entity;
pub mod repository;
pub mod service;

pub use entity::{AuthEventType, AuthLog};
pub use repository::{AuthLogStore, MongoAuthLogStore};
pub use service::AuditService;
